//! Well-formedness XML parser.
//!
//! Turns raw text into an [`Element`] tree, rejecting anything that is not
//! well-formed with a [`ParseError`] carrying the line/column where parsing
//! gave up. The parser is a pure function over its input: failure never
//! leaves partial state behind.
//!
//! Prolog constructs (XML declaration, processing instructions, comments,
//! DOCTYPE) are consumed and discarded; CDATA sections contribute to text
//! content; the five predefined entities and numeric character references
//! are decoded in text and attribute values.

use crate::element::Element;
use compact_str::CompactString;
use thiserror::Error;

/// Malformed input, with a human-readable reason and 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at line {line}, column {column}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub reason: String,
}

/// Parse `text` into an element tree.
pub fn parse(text: &str) -> Result<Element, ParseError> {
    Parser::new(text).parse_document()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn parse_document(mut self) -> Result<Element, ParseError> {
        // A BOM before the declaration is tolerated.
        self.eat("\u{feff}");

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            if self.at_end() {
                if let Some(open) = stack.last() {
                    return Err(self.error(format!("unclosed element <{}>", open.tag)));
                }
                return root.ok_or_else(|| self.error("no root element"));
            }

            if self.peek() == Some('<') {
                if self.eat("<?") {
                    self.skip_past("?>", "unterminated processing instruction")?;
                } else if self.eat("<!--") {
                    self.skip_past("-->", "unterminated comment")?;
                } else if self.looking_at("<![CDATA[") {
                    let cdata = self.read_cdata()?;
                    match stack.last_mut() {
                        Some(open) if open.children.is_empty() => open.text.push_str(&cdata),
                        Some(_) => {} // trailing text is not modeled, dropped
                        None => {
                            return Err(self.error("character data outside the root element"))
                        }
                    }
                } else if self.eat("<!DOCTYPE") {
                    self.skip_doctype()?;
                } else if self.eat("</") {
                    let closed = self.read_close_tag()?;
                    let Some(mut open) = stack.pop() else {
                        return Err(
                            self.error(format!("closing tag </{closed}> without an open element"))
                        );
                    };
                    if open.tag != closed {
                        return Err(self.error(format!(
                            "mismatched closing tag </{closed}>, expected </{}>",
                            open.tag
                        )));
                    }
                    trim_text(&mut open);
                    self.attach(open, &mut stack, &mut root)?;
                } else {
                    let (element, self_closing) = self.read_open_tag(&stack, &root)?;
                    if self_closing {
                        let mut element = element;
                        trim_text(&mut element);
                        self.attach(element, &mut stack, &mut root)?;
                    } else {
                        stack.push(element);
                    }
                }
            } else {
                let text = self.read_text_run()?;
                match stack.last_mut() {
                    Some(open) if open.children.is_empty() => open.text.push_str(&text),
                    Some(_) => {} // text between or after children is dropped
                    None => {
                        if !text.trim().is_empty() {
                            return Err(self.error("text outside the root element"));
                        }
                    }
                }
            }
        }
    }

    /// Hands a finished element to its parent, or installs it as the root.
    fn attach(
        &self,
        element: Element,
        stack: &mut [Element],
        root: &mut Option<Element>,
    ) -> Result<(), ParseError> {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(element);
        } else if root.is_some() {
            return Err(self.error("multiple root elements"));
        } else {
            *root = Some(element);
        }
        Ok(())
    }

    /// Reads `name attrs...` after `<` was consumed; returns the element and
    /// whether the tag was self-closing.
    fn read_open_tag(
        &mut self,
        stack: &[Element],
        root: &Option<Element>,
    ) -> Result<(Element, bool), ParseError> {
        self.expect('<')?;
        if stack.is_empty() && root.is_some() {
            return Err(self.error("multiple root elements"));
        }
        let tag = self.read_name("expected tag name after '<'")?;
        let mut element = Element::new(tag);

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.bump();
                    return Ok((element, false));
                }
                Some('/') => {
                    self.bump();
                    self.expect('>')?;
                    return Ok((element, true));
                }
                Some(_) => {
                    let name = self.read_name("expected attribute name")?;
                    self.skip_whitespace();
                    self.expect('=')?;
                    self.skip_whitespace();
                    let value = self.read_attribute_value()?;
                    if element.attributes.insert(name.clone(), value).is_some() {
                        return Err(self.error(format!("duplicate attribute '{name}'")));
                    }
                }
                None => {
                    return Err(self.error(format!("unterminated start tag <{}>", element.tag)))
                }
            }
        }
    }

    /// Reads `name >` after `</` was consumed.
    fn read_close_tag(&mut self) -> Result<CompactString, ParseError> {
        let name = self.read_name("expected tag name after '</'")?;
        self.skip_whitespace();
        self.expect('>')?;
        Ok(name)
    }

    fn read_name(&mut self, expectation: &str) -> Result<CompactString, ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_name_start(c) => self.bump(),
            _ => return Err(self.error(expectation)),
        }
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                self.bump();
            } else {
                break;
            }
        }
        Ok(CompactString::from(&self.input[start..self.pos]))
    }

    fn read_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected quoted attribute value")),
        };
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    self.bump();
                    return Ok(value);
                }
                Some('<') => return Err(self.error("'<' is not allowed in attribute values")),
                Some('&') => value.push(self.read_entity()?),
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
                None => return Err(self.error("unterminated attribute value")),
            }
        }
    }

    /// Reads text up to the next `<`, decoding entity references.
    fn read_text_run(&mut self) -> Result<String, ParseError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            match c {
                '<' => break,
                '&' => text.push(self.read_entity()?),
                _ => {
                    text.push(c);
                    self.bump();
                }
            }
        }
        Ok(text)
    }

    /// Decodes `&name;`, `&#NN;` or `&#xNN;` with the cursor on `&`.
    fn read_entity(&mut self) -> Result<char, ParseError> {
        let entity_line = self.line;
        let entity_column = self.column;
        self.expect('&')?;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ';' {
                let name = &self.input[start..self.pos];
                self.bump();
                return decode_entity(name).ok_or(ParseError {
                    line: entity_line,
                    column: entity_column,
                    reason: format!("undefined entity &{name};"),
                });
            }
            if c == '<' || c == '&' || self.pos - start > 10 {
                break;
            }
            self.bump();
        }
        Err(ParseError {
            line: entity_line,
            column: entity_column,
            reason: "'&' must start an entity reference".to_owned(),
        })
    }

    fn read_cdata(&mut self) -> Result<String, ParseError> {
        debug_assert!(self.looking_at("<![CDATA["));
        self.eat("<![CDATA[");
        let start = self.pos;
        while !self.at_end() {
            if self.looking_at("]]>") {
                let content = self.input[start..self.pos].to_owned();
                self.eat("]]>");
                return Ok(content);
            }
            self.bump();
        }
        Err(self.error("unterminated CDATA section"))
    }

    /// Consumes a DOCTYPE declaration, tolerating an internal `[...]` subset.
    fn skip_doctype(&mut self) -> Result<(), ParseError> {
        let mut bracket_depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '[' => bracket_depth += 1,
                ']' => bracket_depth = bracket_depth.saturating_sub(1),
                '>' if bracket_depth == 0 => {
                    self.bump();
                    return Ok(());
                }
                _ => {}
            }
            self.bump();
        }
        Err(self.error("unterminated DOCTYPE declaration"))
    }

    fn skip_past(&mut self, terminator: &str, unterminated: &str) -> Result<(), ParseError> {
        while !self.at_end() {
            if self.eat(terminator) {
                return Ok(());
            }
            self.bump();
        }
        Err(self.error(unterminated))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn looking_at(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }

    /// Consumes `prefix` if the cursor is on it.
    fn eat(&mut self, prefix: &str) -> bool {
        if !self.looking_at(prefix) {
            return false;
        }
        for _ in prefix.chars() {
            self.bump();
        }
        true
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn error(&self, reason: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            reason: reason.into(),
        }
    }
}

fn trim_text(element: &mut Element) {
    let trimmed = element.text.trim();
    if trimmed.len() != element.text.len() {
        element.text = trimmed.to_owned();
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
