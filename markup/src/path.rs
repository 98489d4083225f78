//! Ownership-independent node addressing.
//!
//! A [`NodePath`] is a sequence of child indices from the document root. It
//! is the only handle the visible tree keeps into the structural document:
//! a weak reference by coordinates rather than by pointer, so it stays
//! usable after the element tree it was minted against has been dropped and
//! rebuilt. The flip side is that a path is only meaningful against one
//! specific tree snapshot -- resolving it against a different snapshot may
//! land on a different node, or run out of bounds.

use crate::element::Element;
use smallvec::SmallVec;
use std::fmt;

/// Sequence of child indices addressing a node relative to the root.
///
/// The root itself is the empty path. Addressing is purely positional:
/// inserting or removing a sibling shifts the paths of everything after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(SmallVec<[u32; 8]>);

impl NodePath {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        Self(indices.into_iter().collect())
    }

    /// The path of this node's `index`-th child.
    pub fn child(&self, index: u32) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    /// Walks the path from `root`, indexing into each node's children.
    ///
    /// Returns `None` the moment an index is out of range. Callers must
    /// treat `None` as "this address is no longer valid against this
    /// snapshot" and fall back to a full rebuild rather than guessing.
    pub fn resolve<'a>(&self, root: &'a Element) -> Option<&'a Element> {
        let mut elem = root;
        for &index in &self.0 {
            elem = elem.children.get(index as usize)?;
        }
        Some(elem)
    }

    /// Mutable counterpart of [`resolve`](Self::resolve).
    pub fn resolve_mut<'a>(&self, root: &'a mut Element) -> Option<&'a mut Element> {
        let mut elem = root;
        for &index in &self.0 {
            elem = elem.children.get_mut(index as usize)?;
        }
        Some(elem)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

impl FromIterator<u32> for NodePath {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Error from parsing a textual path such as `/0/2`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path segment {segment:?}")]
pub struct PathParseError {
    pub segment: String,
}

impl std::str::FromStr for NodePath {
    type Err = PathParseError;

    /// Parses the [`Display`](fmt::Display) form: `/` for the root,
    /// `/0/2/1` for nested indices.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('/').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        trimmed
            .split('/')
            .map(|segment| {
                segment.parse::<u32>().map_err(|_| PathParseError {
                    segment: segment.to_owned(),
                })
            })
            .collect()
    }
}
