//! Per-document engine facade.
//!
//! [`Workbench`] owns the interactive side's state for one open document:
//! the raw text buffer, the dirty flag, the lazily-expanded outline tree,
//! and the background build/load coordinators. It implements the
//! edit-propagation protocol that keeps the text and tree views coherent
//! without feedback loops.
//!
//! Everything here runs on the interactive thread. Workers only ever see
//! owned snapshots handed out by the coordinators.

use crate::{
    builder::{BuildCoordinator, BuildState},
    loader::{FileLoader, LoadError, LoadedFile},
    outline::{self, ExpandError, OutlineNode},
    surface::TextSurface,
    sync::{self, SyncError},
};
use birch_markup::{locate, locate_first, parse, NodePath, ParseError};
use std::{cell::Cell, path::PathBuf};

/// Mutual-exclusion guard against the text/tree feedback cycle.
///
/// When the edit synchronizer replaces the buffer programmatically, the
/// replacement must not be misinterpreted as a user edit that would
/// re-trigger synchronization. The flag is read and written only on the
/// interactive thread; the RAII guard guarantees it is cleared on every
/// exit path, including early returns and panics.
#[derive(Debug, Default)]
pub(crate) struct Reentrancy {
    active: Cell<bool>,
}

impl Reentrancy {
    pub(crate) fn is_active(&self) -> bool {
        self.active.get()
    }

    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        self.active.set(true);
        ReentrancyGuard { flag: &self.active }
    }
}

pub(crate) struct ReentrancyGuard<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// The synchronization engine for one open document.
pub struct Workbench {
    text: String,
    dirty: bool,
    outline: Option<OutlineNode>,
    suppress: Reentrancy,
    builder: BuildCoordinator,
    loader: FileLoader,
}

impl Workbench {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            dirty: false,
            outline: None,
            suppress: Reentrancy::default(),
            builder: BuildCoordinator::new(),
            loader: FileLoader::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The current visible tree, if a build has succeeded.
    pub fn outline(&self) -> Option<&OutlineNode> {
        self.outline.as_ref()
    }

    pub fn build_state(&self) -> BuildState {
        self.builder.state()
    }

    /// Clears the buffer and the visible tree, as for a new file.
    pub fn new_document(&mut self) {
        self.text.clear();
        self.dirty = false;
        self.outline = None;
    }

    /// Installs freshly loaded or externally supplied text (not a user
    /// edit: the document starts clean) and requests a tree build.
    pub fn open_text(&mut self, text: String) -> u64 {
        self.text = text;
        self.dirty = false;
        self.outline = None;
        self.request_tree_build()
    }

    /// Change notification from the text widget.
    ///
    /// Returns `false` when the change was a suppressed programmatic
    /// replacement and was ignored. An edit that actually changes the
    /// content marks the document dirty; the visible tree is not rebuilt
    /// per keystroke -- rebuilds stay explicit.
    pub fn on_text_changed(&mut self, text: &str) -> bool {
        if self.suppress.is_active() {
            tracing::trace!("text change during programmatic replacement, ignored");
            return false;
        }
        if self.text != text {
            self.text = text.to_owned();
            self.dirty = true;
        }
        true
    }

    /// Starts reading a file on a background worker; the result is applied
    /// by [`wait_for_load`](Self::wait_for_load) or by draining
    /// [`FileLoader::poll`] through the host's event loop.
    pub fn load_document(&mut self, path: PathBuf) -> u64 {
        self.loader.request_load(path)
    }

    /// Blocks until the current load finishes; on success installs the
    /// text and requests a tree build. `None` when no load is in flight.
    pub fn wait_for_load(&mut self) -> Option<Result<PathBuf, LoadError>> {
        match self.loader.wait()? {
            Ok(LoadedFile { path, text }) => {
                self.open_text(text);
                Some(Ok(path))
            }
            Err(err) => {
                tracing::warn!(%err, "file load failed");
                Some(Err(err))
            }
        }
    }

    /// Requests an asynchronous rebuild of the visible tree from the
    /// current text. Supersedes any build in flight.
    pub fn request_tree_build(&mut self) -> u64 {
        self.builder.request_build(self.text.clone())
    }

    /// Applies a finished build, if one has arrived.
    ///
    /// A failed build leaves the previously displayed tree untouched; only
    /// the error is surfaced.
    pub fn poll_build(&mut self) -> Option<Result<(), ParseError>> {
        let result = self.builder.poll()?;
        self.apply_build(result)
    }

    /// Blocking counterpart of [`poll_build`](Self::poll_build).
    pub fn wait_for_build(&mut self) -> Option<Result<(), ParseError>> {
        let result = self.builder.wait()?;
        self.apply_build(result)
    }

    fn apply_build(
        &mut self,
        result: Result<OutlineNode, ParseError>,
    ) -> Option<Result<(), ParseError>> {
        match result {
            Ok(root) => {
                self.outline = Some(root);
                Some(Ok(()))
            }
            Err(err) => {
                tracing::warn!(%err, "tree build failed, keeping previous tree");
                Some(Err(err))
            }
        }
    }

    /// Expands the outline node at `path` by one generation.
    ///
    /// Always re-resolves against a fresh parse of the current text, so an
    /// expansion after hand edits either reflects the new structure or
    /// fails loudly with a stale address.
    pub fn expand_node(&mut self, path: &NodePath) -> Result<&[OutlineNode], ExpandError> {
        let root = parse(&self.text).map_err(ExpandError::InvalidText)?;
        let outline = self.outline.as_mut().ok_or(ExpandError::TreeNotBuilt)?;
        let node = outline
            .find_mut(path)
            .ok_or_else(|| ExpandError::StaleAddress { path: path.clone() })?;
        outline::expand(node, &root)
    }

    /// Character offset of the node addressed by `path`, or `None` when
    /// the address no longer maps into the text.
    pub fn locate_node(&self, tag: &str, path: &NodePath) -> Option<usize> {
        locate(&self.text, tag, path)
    }

    /// Moves the surface selection to the opening tag of the addressed
    /// node, falling back to the first literal occurrence of the tag when
    /// the path no longer resolves. Returns `false` when the tag does not
    /// occur at all.
    pub fn select_node(
        &self,
        surface: &mut dyn TextSurface,
        tag: &str,
        path: &NodePath,
    ) -> bool {
        let Some(start) = self
            .locate_node(tag, path)
            .or_else(|| locate_first(&self.text, tag))
        else {
            return false;
        };
        // Select through the end of the opening tag when it can be found.
        let end = self
            .text
            .chars()
            .enumerate()
            .skip(start)
            .find(|&(_, c)| c == '>')
            .map(|(at, _)| at + 1)
            .unwrap_or(start);
        surface.select_chars(start..end);
        true
    }

    /// Entry point for value edits coming from the tree widget.
    ///
    /// Returns `None` when the notification arrived while a programmatic
    /// update was in progress (loop prevention).
    pub fn on_outline_value_edited(
        &mut self,
        surface: &mut dyn TextSurface,
        path: &NodePath,
        new_value: &str,
    ) -> Option<Result<String, SyncError>> {
        if self.suppress.is_active() {
            tracing::trace!(%path, "outline edit during programmatic update, ignored");
            return None;
        }
        Some(self.apply_tree_edit(surface, path, new_value))
    }

    /// Applies a tree-originated text edit and propagates it to the text
    /// view.
    ///
    /// On success the buffer holds the new canonical serialization, the
    /// surface was updated under the reentrancy guard, and an asynchronous
    /// rebuild was requested so the visible tree reflects the canonical
    /// text. On failure the buffer is untouched; if the failure was
    /// unparsable text, a rebuild from that unchanged text is still
    /// requested so the tree and text views stay consistent.
    pub fn apply_tree_edit(
        &mut self,
        surface: &mut dyn TextSurface,
        path: &NodePath,
        new_value: &str,
    ) -> Result<String, SyncError> {
        match sync::apply_text_edit(&self.text, path, new_value) {
            Ok(outcome) => {
                {
                    let _guard = self.suppress.enter();
                    self.text = outcome.text;
                    surface.replace_text(&self.text);
                }
                self.dirty = true;
                self.request_tree_build();
                tracing::debug!(%path, "applied tree edit");
                Ok(self.text.clone())
            }
            Err(err) => {
                if matches!(err, SyncError::InvalidText(_)) {
                    // The text view holds broken markup; rebuild so the
                    // tree reports the same reality instead of a stale
                    // structure.
                    self.request_tree_build();
                }
                tracing::warn!(%err, %path, "tree edit rejected");
                Err(err)
            }
        }
    }

    /// Cancels and joins all background workers. Also runs on drop; no
    /// worker outlives the document state it reads from.
    pub fn close(&mut self) {
        self.builder.shutdown();
        self.loader.shutdown();
    }
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new()
    }
}
