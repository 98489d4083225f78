//! In-memory representation of one markup element.

use compact_str::CompactString;
use indexmap::IndexMap;

/// One element of a structural document: tag, direct text content, ordered
/// attributes, and ordered children.
///
/// Child order is semantically meaningful -- it is the only key used for
/// addressing (see [`crate::path::NodePath`]). Elements are created by the
/// parser, mutated in place only by the edit synchronizer (text content
/// only), and rebuilt wholesale on every reparse; no element identity
/// survives a reparse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name, never empty.
    pub tag: CompactString,
    /// Trimmed text content directly inside the element, before any child.
    pub text: String,
    /// Attributes in document order; names are unique within an element.
    pub attributes: IndexMap<CompactString, String>,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<CompactString>) -> Self {
        Self {
            tag: tag.into(),
            text: String::new(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Total number of elements in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Element::subtree_len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_element_is_an_empty_leaf() {
        let elem = Element::new("note");
        assert_eq!(elem.tag, "note");
        assert!(!elem.has_children());
        assert!(!elem.has_text());
        assert!(!elem.has_attributes());
        assert_eq!(elem.subtree_len(), 1);
    }

    #[test]
    fn subtree_len_counts_all_descendants() {
        let mut root = Element::new("root");
        let mut a = Element::new("a");
        a.children.push(Element::new("b"));
        root.children.push(a);
        root.children.push(Element::new("c"));
        assert_eq!(root.subtree_len(), 4);
    }
}
