//! Mapping a structural node back to a position in the raw text.
//!
//! The locator is a textual heuristic, not a source map: it counts how many
//! elements with the target's tag name precede it in document order, then
//! scans the raw text for that ordinal occurrence of the literal opening-tag
//! prefix `<tag`. Two known limitations, documented rather than fixed:
//!
//! - the literal scan also matches longer tag names sharing the prefix
//!   (`<item` matches `<items`), so the structural ordinal and the textual
//!   ordinal can diverge when such names coexist;
//! - the mapping is only correct while the raw text and the structural
//!   document are in sync. After a hand edit to the text, the result is
//!   best-effort and may point at the wrong occurrence.
//!
//! A parser that records byte ranges per node would remove both issues; the
//! occurrence-counting behavior is kept for compatibility with how selection
//! jumps behaved historically.

use crate::{element::Element, parser::parse, path::NodePath};

/// Character offset of the opening tag of the node addressed by `path`.
///
/// Reparses `text`, resolves `path`, and scans for the matching ordinal
/// occurrence of `<tag`. Returns `None` if the text does not parse, the
/// path does not resolve, the resolved node's tag differs from `tag`, or
/// the text holds fewer occurrences than the structural ordinal. Never
/// panics.
pub fn locate(text: &str, tag: &str, path: &NodePath) -> Option<usize> {
    let root = parse(text).ok()?;
    let target = path.resolve(&root)?;
    let ordinal = preorder_ordinal(&root, target, tag)?;
    let byte = nth_occurrence(text, &format!("<{tag}"), ordinal)?;
    Some(char_offset(text, byte))
}

/// Fallback when no path is available: the first literal occurrence of the
/// opening tag anywhere in the text. A strictly weaker guarantee than
/// [`locate`].
pub fn locate_first(text: &str, tag: &str) -> Option<usize> {
    text.find(&format!("<{tag}")).map(|byte| char_offset(text, byte))
}

/// Pre-order rank of `target` among elements tagged `tag` (1-based).
///
/// Identity is positional: the target is the exact node reached by path
/// resolution, not merely the first structurally-equal one.
fn preorder_ordinal(root: &Element, target: &Element, tag: &str) -> Option<usize> {
    fn walk(elem: &Element, target: &Element, tag: &str, count: &mut usize) -> Option<usize> {
        if elem.tag == tag {
            *count += 1;
            if std::ptr::eq(elem, target) {
                return Some(*count);
            }
        }
        for child in &elem.children {
            if let Some(ordinal) = walk(child, target, tag, count) {
                return Some(ordinal);
            }
        }
        None
    }
    walk(root, target, tag, &mut 0)
}

/// Byte offset of the `n`-th occurrence of `needle` (1-based).
fn nth_occurrence(text: &str, needle: &str, n: usize) -> Option<usize> {
    let mut from = 0;
    let mut found = None;
    for _ in 0..n {
        let at = text[from..].find(needle)? + from;
        found = Some(at);
        from = at + 1;
    }
    found
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ITEMS: &str = "<root><item>a</item><item>b</item></root>";

    #[test]
    fn first_path_maps_to_first_occurrence() {
        let offset = locate(TWO_ITEMS, "item", &NodePath::from_indices([0])).unwrap();
        assert_eq!(offset, TWO_ITEMS.find("<item>a").unwrap());
    }

    #[test]
    fn second_path_maps_to_second_occurrence() {
        let offset = locate(TWO_ITEMS, "item", &NodePath::from_indices([1])).unwrap();
        assert_eq!(offset, TWO_ITEMS.find("<item>b").unwrap());
    }

    #[test]
    fn nested_same_tag_elements_count_in_document_order() {
        let text = "<root><box><box>inner</box></box><box>last</box></root>";
        let inner = locate(text, "box", &NodePath::from_indices([0, 0])).unwrap();
        let last = locate(text, "box", &NodePath::from_indices([1])).unwrap();
        assert_eq!(&text[inner..inner + 9], "<box>inne");
        assert_eq!(&text[last..last + 9], "<box>last");
    }

    #[test]
    fn unresolvable_path_yields_none() {
        assert_eq!(locate(TWO_ITEMS, "item", &NodePath::from_indices([7])), None);
    }

    #[test]
    fn tag_mismatch_with_resolved_node_yields_none() {
        // Path [0] resolves to an <item>, so asking for "root" finds no
        // ordinal for the target.
        assert_eq!(locate(TWO_ITEMS, "root", &NodePath::from_indices([0])), None);
    }

    #[test]
    fn malformed_text_yields_none() {
        assert_eq!(locate("<root><item>", "item", &NodePath::root()), None);
    }

    #[test]
    fn offsets_are_character_based() {
        // Multi-byte characters before the target shift byte offsets but
        // not character offsets.
        let text = "<root><note>日本語</note><note>x</note></root>";
        let offset = locate(text, "note", &NodePath::from_indices([1])).unwrap();
        let chars: Vec<char> = text.chars().collect();
        let probe: String = chars[offset..offset + 6].iter().collect();
        assert_eq!(probe, "<note>");
    }

    #[test]
    fn locate_first_finds_the_leftmost_occurrence() {
        assert_eq!(locate_first(TWO_ITEMS, "item"), Some(6));
        assert_eq!(locate_first(TWO_ITEMS, "missing"), None);
    }

    #[test]
    fn prefix_collision_is_a_known_limitation() {
        // "<item" also matches "<items": the scan lands on the longer tag
        // first. Kept for compatibility; see the module docs.
        let text = "<root><items/><item/></root>";
        let offset = locate(text, "item", &NodePath::from_indices([1])).unwrap();
        assert_eq!(offset, text.find("<items").unwrap());
    }
}
