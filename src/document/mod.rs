//! The mutable, observable handle on a document tree: [`Document`]
//!
//! A `Document` wraps a single root [`Texel`], along with an index of line lengths for quick
//! position lookups. Every edit builds a complete new tree with the algebra in [`tree`], heals the
//! boundaries of the edit, and then swaps the new root in. Anyone holding onto an old root (a
//! [`snapshot`], an undo log, a renderer that hasn't caught up) keeps a consistent view of the
//! document as it was.
//!
//! ## Observers
//!
//! Interested parties can register an [`Observer`], which is notified synchronously after each
//! edit has completed. Notifications are given in the order that observers were added.
//!
//! ## Threads
//!
//! Edits require a `&mut Document`, so there's only ever a single writer. Readers on other threads
//! can [`watch`] the document instead, which gives a handle that always produces the latest
//! complete root without any locking.
//!
//! [`snapshot`]: Document::snapshot
//! [`watch`]: Document::watch

use std::fmt::{self, Debug, Formatter};
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::style::{Style, StyleMap};
use crate::texel::{self, Channel, Node, Texel};
use crate::{config, tree, Error, Result};

mod lines;

use lines::LineIndex;

/// A handler for changes to a [`Document`]
///
/// All of the methods have empty default implementations, so implementors only need to provide
/// the ones they're interested in. Every method is called after the edit is complete, with the
/// document in its new state.
pub trait Observer: Send + Sync {
    /// Called after `n` positions were inserted at index `i`
    fn inserted(&self, doc: &Document, i: usize, n: usize) {
        let _ = (doc, i, n);
    }

    /// Called after the content of `removed` was taken out of the document at index `i`
    fn removed(&self, doc: &Document, i: usize, removed: &Document) {
        let _ = (doc, i, removed);
    }

    /// Called after the styles in `i1..i2` were changed
    fn properties_changed(&self, doc: &Document, i1: usize, i2: usize) {
        let _ = (doc, i1, i2);
    }
}

/// A unique identifier for an [`Observer`] attached to a particular [`Document`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// A styled, editable document
///
/// For more information, refer to the [module-level documentation](self).
pub struct Document {
    root: Arc<ArcSwap<Node>>,
    lines: LineIndex,
    observers: Vec<(ObserverId, Arc<dyn Observer>)>,
    next_observer: u64,
}

/// A read-only handle on the latest root of a [`Document`], produced by [`Document::watch`]
///
/// This can be sent to other threads. It remains usable after the document itself is dropped,
/// producing the last root the document had.
#[derive(Clone)]
pub struct Snapshots {
    root: Arc<ArcSwap<Node>>,
}

impl Snapshots {
    /// Returns the most recent root of the document
    pub fn latest(&self) -> Texel {
        Texel::from_arc(self.root.load_full())
    }
}

/// Returns the style given by the configuration for text without any surrounding style
pub fn default_style() -> Style {
    Style::intern(config::get().default_style.clone())
}

impl Document {
    /// Creates a new, empty document
    pub fn new() -> Document {
        Document::from_texel(tree::grouped(Vec::new()))
    }

    /// Creates a document containing the text, in the default style
    pub fn from_text(text: &str) -> Document {
        Document::from_texel(tree::grouped(texel::from_text(text, &default_style())))
    }

    /// Creates a document from an existing tree
    ///
    /// The tree is shared, not copied.
    pub fn from_texel(root: Texel) -> Document {
        let lines = LineIndex::new(tree::linelengths(&root));
        Document {
            root: Arc::new(ArcSwap::new(root.into_arc())),
            lines,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    ///////////////////////////////////////
    // Queries                           //
    ///////////////////////////////////////

    /// Returns the current root of the document
    ///
    /// The returned tree is immutable; later edits to the document don't affect it.
    pub fn snapshot(&self) -> Texel {
        Texel::from_arc(self.root.load_full())
    }

    /// Returns a handle for observing the latest root from other threads
    pub fn watch(&self) -> Snapshots {
        Snapshots {
            root: self.root.clone(),
        }
    }

    /// Returns the number of index positions in the document
    pub fn length(&self) -> usize {
        self.snapshot().length()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Returns the complete text of the document
    pub fn text(&self) -> String {
        self.snapshot().get_text()
    }

    /// Returns the text in `i1..i2`
    pub fn get_text(&self, i1: usize, i2: usize) -> Result<String> {
        tree::get_text(&self.snapshot(), i1, i2)
    }

    /// Returns the style at index `i`
    ///
    /// An empty document gives the default style from the configuration.
    pub fn get_style(&self, i: usize) -> Result<Style> {
        match self.is_empty() {
            true => Error::check_index(i, 0).map(|()| default_style()),
            false => tree::get_style(&self.snapshot(), i),
        }
    }

    /// Returns the style runs in `i1..i2`; see [`tree::get_styles`]
    pub fn get_styles(&self, i1: usize, i2: usize) -> Result<Vec<(usize, Style)>> {
        tree::get_styles(&self.snapshot(), i1, i2)
    }

    /// Returns the length of every line, including its terminating newline
    pub fn get_linelengths(&self) -> &[usize] {
        self.lines.lengths()
    }

    /// Returns the number of lines in the document; this is always at least one
    pub fn line_count(&self) -> usize {
        self.lines.lengths().len()
    }

    /// Converts an index into a `(row, column)` position
    pub fn index2position(&self, i: usize) -> Result<(usize, usize)> {
        let root = self.snapshot();
        let row = tree::get_weight(&root, Channel::Lines, i)?;
        let start = tree::find_weight(&root, row, Channel::Lines)?;
        Ok((row, i - start))
    }

    /// Converts a `(row, column)` position into an index
    ///
    /// ## Errors
    ///
    /// The row must exist, and the column can be at most the length of the line, excluding its
    /// newline. Anything else gives [`Error::OutOfRange`].
    pub fn position2index(&self, row: usize, col: usize) -> Result<usize> {
        let start = self.linestart(row)?;
        let mut len = self.lines.lengths()[row];
        if row + 1 != self.line_count() {
            len -= 1;
        }
        Error::check_index(col, len)?;
        Ok(start + col)
    }

    /// Returns the index at which the row starts
    pub fn linestart(&self, row: usize) -> Result<usize> {
        let count = self.line_count();
        if row >= count {
            return Err(Error::OutOfRange {
                idx: row,
                len: count,
            });
        }
        tree::find_weight(&self.snapshot(), row, Channel::Lines)
    }

    /// Returns the index at which the row ends: the index of its newline, or the end of the
    /// document for the last row
    pub fn lineend(&self, row: usize) -> Result<usize> {
        let start = self.linestart(row)?;
        let len = self.lines.lengths()[row];
        match row + 1 == self.line_count() {
            true => Ok(start + len),
            false => Ok(start + len - 1),
        }
    }

    /// Returns an independent document containing everything in `i1..i2`
    pub fn copy(&self, i1: usize, i2: usize) -> Result<Document> {
        let part = tree::copy(&self.snapshot(), i1, i2)?;
        Ok(Document::from_texel(tree::grouped(part)))
    }

    /// Like [`copy`](Self::copy), but with a range
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Result<Document> {
        let len = self.length();
        let past = |idx: usize| idx.checked_add(1).ok_or(Error::OutOfRange { idx, len });

        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => past(s)?,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => past(e)?,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };

        self.copy(start, end)
    }

    /// Returns a description of the tree, for debugging
    pub fn dump(&self) -> String {
        tree::dump(&self.snapshot())
    }

    ///////////////////////////////////////
    // Edits                             //
    ///////////////////////////////////////

    /// Inserts the contents of another document at index `i`
    pub fn insert(&mut self, i: usize, other: &Document) -> Result<()> {
        self.insert_texels(i, tree::as_list(&other.snapshot()))
    }

    /// Appends the contents of another document to the end
    pub fn append(&mut self, other: &Document) -> Result<()> {
        self.insert(self.length(), other)
    }

    /// Inserts the text at index `i`, continuing the style of the preceding character
    ///
    /// The properties in `patch` are applied on top of that style. At the start of the document,
    /// the style of the first character is used instead, and an empty document uses the default
    /// style.
    pub fn insert_text(&mut self, i: usize, text: &str, patch: &StyleMap) -> Result<()> {
        Error::check_index(i, self.length())?;
        let base = self.get_style(i.saturating_sub(1))?;

        let style = base.update(patch);
        self.insert_texels(i, texel::from_text(text, &style))
    }

    /// Inserts the texels at index `i`
    ///
    /// The texels don't need to have the same depth.
    pub fn insert_texels(&mut self, i: usize, stuff: Vec<Texel>) -> Result<()> {
        let stuff = tree::join(stuff.into_iter().map(|t| vec![t]).collect());
        let n: usize = stuff.iter().map(Texel::length).sum();

        let root = self.snapshot();
        Error::check_index(i, root.length())?;
        if n == 0 {
            return Ok(());
        }

        let (row, col) = self.index2position(i)?;
        let inserted = tree::linelengths(&tree::grouped(stuff.clone()));

        let new_root = tree::grouped(tree::insert(&root, i, stuff)?);
        let new_root = tree::heal(&new_root, &[i, i + n])?;

        log::debug!("document: inserted {} positions at {}", n, i);
        self.lines.insert(row, col, &inserted);
        self.replace_root(new_root);

        for (_, o) in self.observers.iter() {
            o.inserted(self, i, n);
        }
        Ok(())
    }

    /// Removes everything in `i1..i2`, returning it as a new document
    pub fn remove(&mut self, i1: usize, i2: usize) -> Result<Document> {
        let root = self.snapshot();
        let (rest, part) = tree::takeout(&root, i1, i2)?;
        let removed = Document::from_texel(tree::grouped(part));
        if i1 == i2 {
            return Ok(removed);
        }

        let start = self.index2position(i1)?;
        let end = self.index2position(i2)?;

        let new_root = tree::heal(&tree::grouped(rest), &[i1])?;

        log::debug!("document: removed {}..{}", i1, i2);
        self.lines.remove(start, end);
        self.replace_root(new_root);

        for (_, o) in self.observers.iter() {
            o.removed(self, i1, &removed);
        }
        Ok(removed)
    }

    /// Applies the style runs starting at `i`; see [`tree::set_styles`]
    ///
    /// Neighboring leaves that end up with the same style are fused afterwards.
    pub fn set_styles(&mut self, i: usize, runs: &[(usize, Style)]) -> Result<()> {
        let root = self.snapshot();
        let end = tree::runs_end(i, runs, root.length())?;
        let old_runs = tree::get_styles(&root, i, end)?;
        let restyled = tree::set_styles(&root, i, runs)?;

        // Leaves may now match their neighbors wherever a run used to end, or now ends
        let mut positions = vec![i];
        for r in [&old_runs[..], runs].iter() {
            let mut pos = i;
            for (n, _) in r.iter() {
                pos += n;
                positions.push(pos);
            }
        }
        positions.sort_unstable();
        positions.dedup();

        let new_root = tree::heal(&restyled, &positions)?;

        log::debug!("document: restyled {}..{}", i, end);
        self.replace_root(new_root);

        for (_, o) in self.observers.iter() {
            o.properties_changed(self, i, end);
        }
        Ok(())
    }

    /// Overrides the properties in `patch` for every style in `i1..i2`
    pub fn set_properties(&mut self, i1: usize, i2: usize, patch: &StyleMap) -> Result<()> {
        let new_root = tree::set_properties(&self.snapshot(), i1, i2, patch)?;

        log::debug!("document: set properties in {}..{}", i1, i2);
        self.replace_root(new_root);

        for (_, o) in self.observers.iter() {
            o.properties_changed(self, i1, i2);
        }
        Ok(())
    }

    fn replace_root(&mut self, root: Texel) {
        if config::debug_checks() {
            if let Err(e) = tree::validate(&root) {
                panic!("invalid document tree after edit: {}\n{}", e, tree::dump(&root));
            }
            assert_eq!(
                self.lines.lengths(),
                &tree::linelengths(&root)[..],
                "line index out of sync"
            );
        }

        self.root.store(root.into_arc());
    }

    ///////////////////////////////////////
    // Observers                         //
    ///////////////////////////////////////

    /// Attaches the observer, returning an id to later remove it with
    pub fn add_observer(&mut self, observer: Arc<dyn Observer>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Detaches the observer, returning whether it was present
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(i, _)| *i != id);
        self.observers.len() != before
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Clone for Document {
    /// Produces a document sharing the same tree, without any observers
    fn clone(&self) -> Self {
        Document::from_texel(self.snapshot())
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Document")
            .field("length", &self.length())
            .field("lines", &self.line_count())
            .field("observers", &self.observers.len())
            .finish()
    }
}
