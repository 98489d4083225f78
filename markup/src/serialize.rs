//! Canonical pretty-printed serialization.
//!
//! The canonical form is the engine's only wire format: two-space indents,
//! one element per line, no XML declaration, no blank lines. Elements whose
//! only content is text are written inline (`<a>1</a>`); elements with
//! children open and close on their own lines, with any direct text on a
//! line of its own before the first child. Serialization is deterministic:
//! the same tree always yields the same text, independent of how the tree
//! was produced, which makes the canonical form a fixed point of
//! parse-then-serialize.

use crate::element::Element;
use std::fmt::Write;

const INDENT: &str = "  ";

/// Serialize an element tree to canonical text.
pub fn serialize(root: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, element: &Element, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attributes {
        // Infallible for String targets.
        let _ = write!(out, " {name}=\"{}\"", escape_attribute(value));
    }

    if element.children.is_empty() {
        if element.text.is_empty() {
            out.push_str("/>\n");
        } else {
            let _ = writeln!(out, ">{}</{}>", escape_text(&element.text), element.tag);
        }
        return;
    }

    out.push_str(">\n");
    if !element.text.is_empty() {
        for _ in 0..=depth {
            out.push_str(INDENT);
        }
        out.push_str(&escape_text(&element.text));
        out.push('\n');
    }
    for child in &element.children {
        write_element(out, child, depth + 1);
    }
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    let _ = writeln!(out, "</{}>", element.tag);
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn children_go_on_their_own_indented_lines() {
        let root = parse("<root><a>1</a><b>2</b></root>").unwrap();
        assert_eq!(serialize(&root), "<root>\n  <a>1</a>\n  <b>2</b>\n</root>\n");
    }

    #[test]
    fn empty_element_collapses_to_self_closing() {
        let root = parse("<a></a>").unwrap();
        assert_eq!(serialize(&root), "<a/>\n");
    }

    #[test]
    fn attributes_are_written_in_document_order() {
        let root = parse(r#"<a z="1" b="2"/>"#).unwrap();
        assert_eq!(serialize(&root), "<a z=\"1\" b=\"2\"/>\n");
    }

    #[test]
    fn text_before_children_gets_its_own_line() {
        let root = parse("<a>hello<b/></a>").unwrap();
        assert_eq!(serialize(&root), "<a>\n  hello\n  <b/>\n</a>\n");
    }

    #[test]
    fn special_characters_are_escaped() {
        let root = parse(r#"<a b="&quot;&lt;">&amp;&lt;ok&gt;</a>"#).unwrap();
        assert_eq!(serialize(&root), "<a b=\"&quot;&lt;\">&amp;&lt;ok&gt;</a>\n");
    }

    #[test]
    fn canonical_form_is_a_fixed_point() {
        let inputs = [
            "<root><a>1</a><b attr='x'>2</b><c><d/></c></root>",
            "<?xml version=\"1.0\"?><r>  spaced  <x y=\"1\"/></r>",
            "<a>&lt;tag&gt; &amp; text</a>",
        ];
        for input in inputs {
            let once = serialize(&parse(input).unwrap());
            let twice = serialize(&parse(&once).unwrap());
            assert_eq!(once, twice, "not a fixed point for {input:?}");
        }
    }
}
