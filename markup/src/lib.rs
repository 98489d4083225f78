//! Structural markup layer for Birch.
//!
//! Everything in this crate is a pure function over its input: parsing raw
//! XML text into an [`Element`] tree, addressing nodes within that tree by
//! child-index paths, serializing a tree back to canonical text, and mapping
//! a node back to a character offset in the raw text. No module here touches
//! shared state, which is what lets the editor core run all of it on worker
//! threads against owned snapshots.

pub mod element;
pub mod locate;
pub mod parser;
pub mod path;
pub mod serialize;

pub use element::Element;
pub use locate::{locate, locate_first};
pub use parser::{parse, ParseError};
pub use path::{NodePath, PathParseError};
pub use serialize::serialize;
