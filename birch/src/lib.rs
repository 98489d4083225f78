//! Text and tree synchronization engine for a structured markup editor.
//!
//! The raw text buffer is the single source of truth. The visible tree is
//! a lazily materialized projection of it, rebuilt on background workers
//! and addressed by child-index paths ([`NodePath`]). [`Workbench`] ties
//! the pieces together for one open document: edits made through the tree
//! are synchronized back into the text, edits made in the text invalidate
//! the tree until the next rebuild, and a reentrancy guard keeps the two
//! directions from feeding back into each other.
//!
//! Parsing, addressing, locating and canonical serialization live in
//! [`birch_markup`]; this crate owns the stateful side.

pub mod builder;
pub mod document;
pub mod loader;
pub mod outline;
pub mod surface;
pub mod sync;

pub use builder::{BuildCoordinator, BuildState};
pub use document::Workbench;
pub use loader::{FileLoader, LoadError, LoadEvent, LoadedFile};
pub use outline::{Children, ExpandError, NodeClass, OutlineNode};
pub use surface::{StringSurface, TextSurface};
pub use sync::{EditOutcome, SyncError};

pub use birch_markup::{Element, NodePath, ParseError};
