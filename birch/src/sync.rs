//! Tree-to-text edit propagation.
//!
//! A value edit made in the tree view is applied to the structural document
//! and serialized back to canonical text. The function itself is pure; the
//! [`Workbench`](crate::document::Workbench) owns the stateful half of the
//! protocol (replacing the buffer under the reentrancy guard and kicking
//! off the rebuild).
//!
//! Only text-content edits are supported; attribute and child edits do not
//! originate from the tree view.

use birch_markup::{parse, serialize, Element, NodePath, ParseError};
use thiserror::Error;

/// A tree-originated edit that could not be applied. The raw text is left
/// untouched in every failure case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The current text does not parse, so there is no structural document
    /// to edit. Distinct from [`SyncError::StaleAddress`]: here the text
    /// itself is broken, there the text is valid but the address is not.
    #[error("document is not well-formed, edit rejected: {0}")]
    InvalidText(ParseError),
    /// The path no longer resolves, e.g. the text was independently edited
    /// to remove the node since the tree was built.
    #[error("path {path} no longer resolves, edit rejected")]
    StaleAddress { path: NodePath },
}

/// Result of a successful tree edit: the mutated document and its new
/// canonical serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub root: Element,
    pub text: String,
}

/// Applies a text-content edit to the node addressed by `path`.
///
/// Parses `text`, mutates only the `text` field of the resolved node, and
/// reserializes canonically. Deterministic: the same input text, path and
/// value always produce the same output text.
pub fn apply_text_edit(
    text: &str,
    path: &NodePath,
    new_value: &str,
) -> Result<EditOutcome, SyncError> {
    let mut root = parse(text).map_err(SyncError::InvalidText)?;
    let node = path
        .resolve_mut(&mut root)
        .ok_or_else(|| SyncError::StaleAddress { path: path.clone() })?;
    node.text = new_value.trim().to_owned();
    let text = serialize(&root);
    Ok(EditOutcome { root, text })
}
