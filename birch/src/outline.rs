//! Lazily-expanded tree-view projection of a structural document.
//!
//! An [`OutlineNode`] is what the tree widget renders: a display label,
//! value and attribute summary, plus the [`NodePath`] that ties it back to
//! the structural document. Interior nodes start [`Children::Unexpanded`]
//! and gain exactly one generation of real children per [`expand`] call, so
//! the initial build cost is bounded by the size of the first generation
//! rather than the whole document. The unexplored state is a tagged enum
//! rather than a sentinel child, so traversal never has to special-case a
//! fake node.
//!
//! Outline trees are never patched incrementally: every document rebuild
//! discards the old tree and materializes a fresh root.

use birch_markup::{Element, NodePath};
use compact_str::CompactString;
use thiserror::Error;

/// Display classification of an element, derived purely from three facts:
/// has children, has text, has attributes. Five mutually exclusive classes;
/// no behavioral effect beyond choosing an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// Has child elements.
    Container,
    /// Text content and attributes, no children.
    Record,
    /// Text content only.
    Text,
    /// Attributes only.
    Tagged,
    /// No children, no text, no attributes.
    Empty,
}

impl NodeClass {
    pub fn classify(has_children: bool, has_text: bool, has_attrs: bool) -> Self {
        if has_children {
            NodeClass::Container
        } else if has_text && has_attrs {
            NodeClass::Record
        } else if has_text {
            NodeClass::Text
        } else if has_attrs {
            NodeClass::Tagged
        } else {
            NodeClass::Empty
        }
    }

    /// Icon shown next to the label in the tree view.
    pub fn glyph(&self) -> &'static str {
        match self {
            NodeClass::Container => "📦",
            NodeClass::Record => "🧾",
            NodeClass::Text => "📝",
            NodeClass::Tagged => "🏷",
            NodeClass::Empty => "📄",
        }
    }
}

/// Child state of an [`OutlineNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    /// The element has children that have not been materialized yet.
    Unexpanded,
    /// One materialized generation (empty for leaf elements).
    Expanded(Vec<OutlineNode>),
}

/// One visible row of the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    /// Tag name, shown as the row label.
    pub label: CompactString,
    pub class: NodeClass,
    /// Trimmed text content, shown in the value column.
    pub value: String,
    /// `k=v` pairs joined by spaces, shown in the attributes column.
    pub attr_summary: String,
    /// Address of the corresponding element in the structural document.
    pub path: NodePath,
    pub children: Children,
}

/// Failure to expand or address an outline node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// The node's path no longer resolves against the structural document.
    #[error("path {path} no longer resolves against the current document")]
    StaleAddress { path: NodePath },
    /// The current text is not well-formed, so there is no structural
    /// document to expand against.
    #[error("document is not well-formed: {0}")]
    InvalidText(birch_markup::ParseError),
    /// No outline has been built yet.
    #[error("no outline tree has been built")]
    TreeNotBuilt,
}

impl OutlineNode {
    pub fn is_expanded(&self) -> bool {
        matches!(self.children, Children::Expanded(_))
    }

    /// Materialized children, if any generation has been built.
    pub fn children(&self) -> Option<&[OutlineNode]> {
        match &self.children {
            Children::Expanded(children) => Some(children),
            Children::Unexpanded => None,
        }
    }

    /// Walks `path` through materialized generations only.
    ///
    /// Returns `None` when the path leaves the materialized region or runs
    /// out of bounds; an ancestor must be expanded before its descendants
    /// can be addressed.
    pub fn find_mut(&mut self, path: &NodePath) -> Option<&mut OutlineNode> {
        let mut node = self;
        for &index in path.indices() {
            match &mut node.children {
                Children::Expanded(children) => node = children.get_mut(index as usize)?,
                Children::Unexpanded => return None,
            }
        }
        Some(node)
    }
}

/// Builds the root row of the visible tree.
///
/// The root's children stay [`Children::Unexpanded`]; nothing below the
/// first row is walked, so the cost is O(1) in the document size.
pub fn materialize_root(root: &Element) -> OutlineNode {
    row(root, NodePath::root())
}

/// Replaces `node`'s unexplored marker with one generation of children,
/// re-resolved against `root`.
///
/// Idempotent: expanding an already-expanded node changes nothing and
/// returns the existing children.
pub fn expand<'a>(
    node: &'a mut OutlineNode,
    root: &Element,
) -> Result<&'a [OutlineNode], ExpandError> {
    if !node.is_expanded() {
        let element = node
            .path
            .resolve(root)
            .ok_or_else(|| ExpandError::StaleAddress {
                path: node.path.clone(),
            })?;
        let generation = element
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| row(child, node.path.child(index as u32)))
            .collect();
        tracing::debug!(path = %node.path, "expanded outline node");
        node.children = Children::Expanded(generation);
    }
    match &node.children {
        Children::Expanded(children) => Ok(children),
        Children::Unexpanded => unreachable!("node was just expanded"),
    }
}

/// Eagerly materializes a full subtree, up to `depth` generations when a
/// limit is given. Used by the CLI outline command and by tests; the
/// interactive path always goes through [`materialize_root`] + [`expand`].
pub fn materialize_deep(root: &Element, depth: Option<usize>) -> OutlineNode {
    fn build(element: &Element, path: NodePath, remaining: Option<usize>) -> OutlineNode {
        let mut node = row(element, path);
        if element.has_children() {
            match remaining {
                Some(0) => {} // leave unexpanded beyond the limit
                _ => {
                    let next = remaining.map(|r| r - 1);
                    let children = element
                        .children
                        .iter()
                        .enumerate()
                        .map(|(index, child)| {
                            build(child, node.path.child(index as u32), next)
                        })
                        .collect();
                    node.children = Children::Expanded(children);
                }
            }
        }
        node
    }
    build(root, NodePath::root(), depth)
}

fn row(element: &Element, path: NodePath) -> OutlineNode {
    let class = NodeClass::classify(
        element.has_children(),
        element.has_text(),
        element.has_attributes(),
    );
    let attr_summary = element
        .attributes
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ");
    let children = if element.has_children() {
        Children::Unexpanded
    } else {
        Children::Expanded(Vec::new())
    };
    OutlineNode {
        label: element.tag.clone(),
        class,
        value: element.text.clone(),
        attr_summary,
        path,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use birch_markup::parse;

    const SAMPLE: &str =
        r#"<root><a p="1">1</a><b>2</b><c><d/><e q="2" r="3"/></c></root>"#;

    #[test]
    fn classification_covers_all_five_classes() {
        use NodeClass::*;
        assert_eq!(NodeClass::classify(true, true, true), Container);
        assert_eq!(NodeClass::classify(false, true, true), Record);
        assert_eq!(NodeClass::classify(false, true, false), Text);
        assert_eq!(NodeClass::classify(false, false, true), Tagged);
        assert_eq!(NodeClass::classify(false, false, false), Empty);
    }

    #[test]
    fn root_materializes_without_walking_the_document() {
        let root = parse(SAMPLE).unwrap();
        let outline = materialize_root(&root);
        assert_eq!(outline.label, "root");
        assert_eq!(outline.class, NodeClass::Container);
        assert_eq!(outline.children, Children::Unexpanded);
        assert!(outline.path.is_root());
    }

    #[test]
    fn expand_builds_exactly_one_generation() {
        let root = parse(SAMPLE).unwrap();
        let mut outline = materialize_root(&root);
        let children = expand(&mut outline, &root).unwrap();
        assert_eq!(children.len(), 3);
        let labels: Vec<_> = children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["a", "b", "c"]);
        // The grandchildren under <c> are not materialized yet.
        assert_eq!(children[2].children, Children::Unexpanded);
        // Leaves come out trivially expanded.
        assert_eq!(children[0].children, Children::Expanded(Vec::new()));
    }

    #[test]
    fn expansion_is_idempotent() {
        let root = parse(SAMPLE).unwrap();
        let mut outline = materialize_root(&root);
        expand(&mut outline, &root).unwrap();
        let snapshot = outline.clone();
        expand(&mut outline, &root).unwrap();
        assert_eq!(outline, snapshot);
    }

    #[test]
    fn expanded_order_matches_element_order() {
        let root = parse(SAMPLE).unwrap();
        let mut outline = materialize_root(&root);
        expand(&mut outline, &root).unwrap();
        let c = outline.find_mut(&NodePath::from_indices([2])).unwrap();
        let grandchildren = expand(c, &root).unwrap();
        let labels: Vec<_> = grandchildren.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, ["d", "e"]);
        assert_eq!(grandchildren[1].path, NodePath::from_indices([2, 1]));
    }

    #[test]
    fn expand_against_mismatched_snapshot_is_stale() {
        let root = parse(SAMPLE).unwrap();
        let mut outline = materialize_root(&root);
        expand(&mut outline, &root).unwrap();
        let c = outline.find_mut(&NodePath::from_indices([2])).unwrap();
        let shrunk = parse("<root/>").unwrap();
        let err = expand(c, &shrunk).unwrap_err();
        assert!(matches!(err, ExpandError::StaleAddress { .. }));
    }

    #[test]
    fn find_mut_stops_at_unmaterialized_generations() {
        let root = parse(SAMPLE).unwrap();
        let mut outline = materialize_root(&root);
        // Root not expanded yet: nothing below is addressable.
        assert!(outline.find_mut(&NodePath::from_indices([0])).is_none());
        expand(&mut outline, &root).unwrap();
        assert!(outline.find_mut(&NodePath::from_indices([0])).is_some());
        assert!(outline.find_mut(&NodePath::from_indices([2, 0])).is_none());
    }

    #[test]
    fn attribute_summary_joins_pairs_in_order() {
        let root = parse(SAMPLE).unwrap();
        let outline = materialize_deep(&root, None);
        let children = outline.children().unwrap();
        assert_eq!(children[0].attr_summary, "p=1");
        let e = &children[2].children().unwrap()[1];
        assert_eq!(e.attr_summary, "q=2 r=3");
        assert_eq!(e.class, NodeClass::Tagged);
    }

    #[test]
    fn deep_materialization_respects_the_depth_limit() {
        let root = parse(SAMPLE).unwrap();
        let outline = materialize_deep(&root, Some(1));
        let children = outline.children().unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[2].children, Children::Unexpanded);
        let full = materialize_deep(&root, None);
        assert!(full.children().unwrap()[2].children().is_some());
    }

    #[test]
    fn dfs_order_of_outline_matches_element_order() {
        fn collect_labels(node: &OutlineNode, out: &mut Vec<String>) {
            out.push(node.label.to_string());
            if let Some(children) = node.children() {
                for child in children {
                    collect_labels(child, out);
                }
            }
        }
        fn collect_tags(elem: &Element, out: &mut Vec<String>) {
            out.push(elem.tag.to_string());
            for child in &elem.children {
                collect_tags(child, out);
            }
        }
        let root = parse(SAMPLE).unwrap();
        let outline = materialize_deep(&root, None);
        let mut labels = Vec::new();
        let mut tags = Vec::new();
        collect_labels(&outline, &mut labels);
        collect_tags(&root, &mut tags);
        assert_eq!(labels, tags);
    }
}
