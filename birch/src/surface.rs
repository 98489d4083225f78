//! Seam to the text-editing widget.
//!
//! The engine needs exactly three capabilities from whatever widget hosts
//! the raw text: read the full text, replace it without firing a change
//! notification, and move the selection. Change notifications travel the
//! other way, as calls into
//! [`Workbench::on_text_changed`](crate::document::Workbench::on_text_changed)
//! made by the host glue.

use std::ops::Range;

/// The text-editing widget, as seen by the engine.
pub trait TextSurface {
    /// Full current text.
    fn text(&self) -> String;

    /// Replaces the full text without firing a change notification, like a
    /// widget whose signals are blocked during a programmatic update.
    fn replace_text(&mut self, text: &str);

    /// Selects the given character range and scrolls it into view.
    fn select_chars(&mut self, range: Range<usize>);
}

/// Plain in-memory surface used by the CLI and by tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StringSurface {
    pub text: String,
    pub selection: Option<Range<usize>>,
    /// Number of programmatic replacements, handy for assertions.
    pub replace_count: usize,
}

impl StringSurface {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            selection: None,
            replace_count: 0,
        }
    }
}

impl TextSurface for StringSurface {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn replace_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.replace_count += 1;
    }

    fn select_chars(&mut self, range: Range<usize>) {
        self.selection = Some(range);
    }
}
