//! The node type of document trees: [`Texel`]
//!
//! A `Texel` is an immutable, reference-counted node. Cloning one is cheap, and there's no way to
//! modify one in place -- every operation in the [`tree`](crate::tree) module builds new nodes and
//! shares everything it didn't touch. The variants are given by [`Kind`]:
//!
//! * [`Text`] -- a run of plain characters with a single style;
//! * [`Glyph`] -- a single-index control leaf: newlines, tabs, end marks, and container
//!   separators;
//! * [`Group`] -- purely structural grouping, used to keep the tree balanced; and
//! * [`Container`] -- a composite with a fixed number of slots, like a fraction or a notebook cell.
//!
//! Every node carries its [`Weights`], aggregated bottom-up when it's constructed.
//!
//! ## Indexing
//!
//! All indexes refer to *positions*: a `Text` occupies one position per character, every `Glyph`
//! occupies exactly one, and composites occupy the sum of their children. A texel of length `n`
//! has valid indexes `0..=n`, where index `i` sits just before the `i`th position.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::style::{Style, StyleMap};
use crate::{tree, Result};

mod container;
mod glyph;
mod text;

pub use container::{lookup, register, Cell, Childs, Container, ContainerKind, Fraction};
pub use glyph::{Glyph, GlyphKind};
pub use text::Text;

/// An immutable, shareable node in a document tree
///
/// For a general overview, refer to the [module-level documentation](self).
///
/// Two `Texel`s are never compared structurally; [`Texel::ptr_eq`] tells whether two handles are
/// the same node, and comparing the output of [`get_text`](Self::get_text) or
/// [`get_styles`](Self::get_styles) covers everything else.
#[derive(Clone)]
pub struct Texel(Arc<Node>);

/// (*Internal*) The allocation behind a [`Texel`]
///
/// This is exposed within the crate so that documents can swap it atomically.
pub(crate) struct Node {
    weights: Weights,
    kind: Kind,
}

/// The variants of a [`Texel`]
pub enum Kind {
    Text(Text),
    Glyph(Glyph),
    Group(Group),
    Container(Container),
}

/// A purely structural node, with no effect on the content of a document
///
/// Groups are produced by the balancing functions in [`tree`](crate::tree); outside of the root,
/// every group has between `ceil(nmax/2)` and `nmax` children, all with the same depth.
#[derive(Clone)]
pub struct Group {
    childs: SmallVec<[Texel; 16]>,
}

/// The aggregated metrics of a [`Texel`]
///
/// These are computed bottom-up: `depth` takes the maximum over children plus one (for groups),
/// while `length` and `lines` are summed. Leaves and containers both have depth zero; containers
/// sit among the leaves of the balancing structure, and each of their slots is balanced
/// separately.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Weights {
    pub depth: usize,
    pub length: usize,
    pub lines: usize,
}

/// One of the summed weight channels, used by [`find_weight`](crate::tree::find_weight) and
/// [`get_weight`](crate::tree::get_weight)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The number of index positions
    Length,
    /// The number of newlines
    Lines,
}

impl Weights {
    /// Returns the value of the given channel
    pub fn get(&self, channel: Channel) -> usize {
        match channel {
            Channel::Length => self.length,
            Channel::Lines => self.lines,
        }
    }

    /// (*Internal*) Sums the weights of a sequence of children
    ///
    /// The depth given here is the maximum of the children's; callers add one where it applies.
    fn sum<'a>(iter: impl Iterator<Item = &'a Texel>) -> Weights {
        iter.fold(Weights::default(), |acc, t| {
            let w = t.weights();
            Weights {
                depth: acc.depth.max(w.depth),
                length: acc.length + w.length,
                lines: acc.lines + w.lines,
            }
        })
    }
}

impl Group {
    /// Returns the children of the group
    pub fn childs(&self) -> &[Texel] {
        &self.childs
    }

    /// Returns the number of children
    pub fn len(&self) -> usize {
        self.childs.len()
    }

    /// Returns whether the group has no children -- only ever true for the root of an empty tree
    pub fn is_empty(&self) -> bool {
        self.childs.is_empty()
    }
}

impl Texel {
    ///////////////////////////////////////
    // Construction                      //
    ///////////////////////////////////////

    fn new(kind: Kind) -> Texel {
        let weights = match &kind {
            Kind::Text(t) => Weights {
                depth: 0,
                length: t.len(),
                lines: 0,
            },
            Kind::Glyph(g) => Weights {
                depth: 0,
                length: 1,
                lines: g.is_newline() as usize,
            },
            Kind::Group(g) => {
                let w = Weights::sum(g.childs.iter());
                Weights {
                    depth: w.depth + 1,
                    ..w
                }
            }
            Kind::Container(c) => Weights {
                depth: 0,
                ..Weights::sum(c.childs())
            },
        };

        Texel(Arc::new(Node { weights, kind }))
    }

    /// Creates a run of characters with a single style
    pub fn text(content: &str, style: Style) -> Texel {
        Texel::new(Kind::Text(Text::new(content, style)))
    }

    /// Creates a newline glyph
    pub fn newline(style: Style, paragraph_style: Style) -> Texel {
        Texel::glyph(Glyph::newline(style, paragraph_style))
    }

    /// Creates a tabulator glyph
    pub fn tab(style: Style) -> Texel {
        Texel::glyph(Glyph::tab(style))
    }

    /// Creates an end mark glyph
    pub fn endmark(style: Style) -> Texel {
        Texel::glyph(Glyph::endmark(style))
    }

    /// Wraps a glyph as a leaf
    pub fn glyph(glyph: Glyph) -> Texel {
        Texel::new(Kind::Glyph(glyph))
    }

    /// Wraps the children in a single group, without any balancing
    ///
    /// The children should all have the same depth. To build a balanced tree out of an arbitrary
    /// number of them, use [`tree::grouped`] instead.
    pub fn group(childs: Vec<Texel>) -> Texel {
        debug_assert!(tree::is_homogeneous(&childs));
        Texel::new(Kind::Group(Group {
            childs: SmallVec::from_vec(childs),
        }))
    }

    /// Wraps a container as a texel
    pub fn container(container: Container) -> Texel {
        Texel::new(Kind::Container(container))
    }

    /// (*Internal*) Extracts the shared allocation
    pub(crate) fn into_arc(self) -> Arc<Node> {
        self.0
    }

    /// (*Internal*) Rebuilds the handle from its allocation
    pub(crate) fn from_arc(arc: Arc<Node>) -> Texel {
        Texel(arc)
    }

    ///////////////////////////////////////
    // Accessors                         //
    ///////////////////////////////////////

    /// Returns the variant of the texel
    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    /// Returns the aggregated weights
    pub fn weights(&self) -> Weights {
        self.0.weights
    }

    /// Returns the number of index positions occupied by the texel
    pub fn length(&self) -> usize {
        self.0.weights.length
    }

    /// Returns the depth of the texel in the balancing structure
    pub fn depth(&self) -> usize {
        self.0.weights.depth
    }

    /// Returns the number of newlines in the texel
    pub fn lines(&self) -> usize {
        self.0.weights.lines
    }

    /// Returns whether the two handles refer to the same node
    pub fn ptr_eq(a: &Texel, b: &Texel) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind(), Kind::Group(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind(), Kind::Container(_))
    }

    /// Returns whether the texel is a leaf: text or a glyph
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind(), Kind::Text(_) | Kind::Glyph(_))
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self.kind() {
            Kind::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self.kind() {
            Kind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_glyph(&self) -> Option<&Glyph> {
        match self.kind() {
            Kind::Glyph(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self.kind() {
            Kind::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Produces an iterator over the direct children, in index order
    ///
    /// For containers, this interleaves the separator glyphs with the slots. Leaves have no
    /// children.
    pub fn children(&self) -> Children {
        match self.kind() {
            Kind::Group(g) => Children::Group(g.childs.iter()),
            Kind::Container(c) => Children::Container(c.childs()),
            Kind::Text(_) | Kind::Glyph(_) => Children::Leaf,
        }
    }

    /// Returns the style of a leaf, or `None` for composites
    pub fn leaf_style(&self) -> Option<&Style> {
        match self.kind() {
            Kind::Text(t) => Some(t.style()),
            Kind::Glyph(g) => Some(g.style()),
            Kind::Group(_) | Kind::Container(_) => None,
        }
    }

    /// Returns a copy of a leaf with its style replaced, or `None` for composites
    pub fn with_style(&self, style: Style) -> Option<Texel> {
        match self.kind() {
            Kind::Text(t) => Some(Texel::new(Kind::Text(t.with_style(style)))),
            Kind::Glyph(g) => Some(Texel::glyph(g.with_style(style))),
            Kind::Group(_) | Kind::Container(_) => None,
        }
    }

    ///////////////////////////////////////
    // The texel protocol                //
    ///////////////////////////////////////

    /// Returns the full text of the texel
    ///
    /// Glyphs contribute their single character (e.g. `'\n'` for newlines).
    pub fn get_text(&self) -> String {
        let mut out = String::with_capacity(self.length());
        tree::write_text(self, 0, self.length(), &mut out);
        out
    }

    /// Returns the style at index `i`; see [`tree::get_style`]
    pub fn get_style(&self, i: usize) -> Result<Style> {
        tree::get_style(self, i)
    }

    /// Returns the style runs in `i1..i2`; see [`tree::get_styles`]
    pub fn get_styles(&self, i1: usize, i2: usize) -> Result<Vec<(usize, Style)>> {
        tree::get_styles(self, i1, i2)
    }

    /// Applies the style runs starting at `i`; see [`tree::set_styles`]
    pub fn set_styles(&self, i: usize, runs: &[(usize, Style)]) -> Result<Texel> {
        tree::set_styles(self, i, runs)
    }

    /// Updates the properties of every style in `i1..i2`; see [`tree::set_properties`]
    pub fn set_properties(&self, i1: usize, i2: usize, patch: &StyleMap) -> Result<Texel> {
        tree::set_properties(self, i1, i2, patch)
    }

    /// Splits the texel at `i`; see [`tree::split`]
    pub fn split(&self, i: usize) -> Result<(Texel, Texel)> {
        tree::split(self, i)
    }

    /// Partitions the texel around `i1..i2`; see [`tree::takeout`]
    pub fn takeout(&self, i1: usize, i2: usize) -> Result<(Vec<Texel>, Vec<Texel>)> {
        tree::takeout(self, i1, i2)
    }

    /// Inserts the list at `i`; see [`tree::insert`]
    pub fn insert(&self, i: usize, stuff: Vec<Texel>) -> Result<Vec<Texel>> {
        tree::insert(self, i, stuff)
    }

    /// Returns whether this leaf can be fused with `other`, immediately to its right
    ///
    /// Only text runs with the identical style handle can be merged, and only while the result
    /// stays within the configured `max_run`.
    pub fn can_merge(&self, other: &Texel) -> bool {
        match (self.kind(), other.kind()) {
            (Kind::Text(a), Kind::Text(b)) => a.can_merge(b, crate::config::max_run()),
            _ => false,
        }
    }

    /// Fuses this leaf with `other`, immediately to its right, if [`can_merge`] allows it
    ///
    /// [`can_merge`]: Self::can_merge
    pub fn merge(&self, other: &Texel) -> Option<Texel> {
        match (self.kind(), other.kind()) {
            (Kind::Text(a), Kind::Text(b)) if self.can_merge(other) => {
                Some(Texel::new(Kind::Text(a.merge(b))))
            }
            _ => None,
        }
    }

    /// (*Internal*) For a leaf, returns the weight of `channel` in `0..i`
    pub(crate) fn leaf_partial_weight(&self, channel: Channel, i: usize) -> usize {
        if i == 0 {
            0
        } else if i >= self.length() {
            self.weights().get(channel)
        } else {
            // Only text runs have interior positions, and they carry no newlines
            match channel {
                Channel::Length => i,
                Channel::Lines => 0,
            }
        }
    }

    /// (*Internal*) For a leaf, returns the smallest index with `0..index` weighing at least `w`
    ///
    /// `w` is always in `1..=weight`.
    pub(crate) fn leaf_index_of_weight(&self, channel: Channel, w: usize) -> usize {
        match channel {
            Channel::Length => w,
            Channel::Lines => self.length(),
        }
    }
}

impl From<Text> for Texel {
    fn from(text: Text) -> Texel {
        Texel::new(Kind::Text(text))
    }
}

impl From<Glyph> for Texel {
    fn from(glyph: Glyph) -> Texel {
        Texel::glyph(glyph)
    }
}

impl From<Container> for Texel {
    fn from(container: Container) -> Texel {
        Texel::container(container)
    }
}

/// Converts plain text into a list of leaves with the given style
///
/// Newlines become [`GlyphKind::NewLine`] (with an empty paragraph style) and tabs become
/// [`GlyphKind::Tabulator`]. Everything else is split into text runs of at most `max_run`
/// characters.
pub fn from_text(content: &str, style: &Style) -> Vec<Texel> {
    let max_run = crate::config::max_run();
    let mut out = Vec::new();
    let mut paragraph_style = None;

    let mut run_start = 0;
    let mut run_len = 0;

    for (idx, c) in content.char_indices() {
        if c == '\n' || c == '\t' {
            if run_len != 0 {
                push_chunked(&content[run_start..idx], run_len, style, max_run, &mut out);
            }

            let glyph = match c {
                '\n' => {
                    let par = paragraph_style.get_or_insert_with(Style::default);
                    Texel::newline(style.clone(), par.clone())
                }
                _ => Texel::tab(style.clone()),
            };
            out.push(glyph);

            run_start = idx + c.len_utf8();
            run_len = 0;
        } else {
            run_len += 1;
        }
    }

    if run_len != 0 {
        push_chunked(&content[run_start..], run_len, style, max_run, &mut out);
    }

    out
}

// Pushes the run as texts of at most `max_run` characters
fn push_chunked(run: &str, run_len: usize, style: &Style, max_run: usize, out: &mut Vec<Texel>) {
    if run_len <= max_run {
        out.push(Texel::text(run, style.clone()));
        return;
    }

    let mut start = 0;
    let mut count = 0;
    for (idx, _) in run.char_indices() {
        if count == max_run {
            out.push(Texel::text(&run[start..idx], style.clone()));
            start = idx;
            count = 0;
        }
        count += 1;
    }
    out.push(Texel::text(&run[start..], style.clone()));
}

/// An iterator over the direct children of a [`Texel`], produced by [`Texel::children`]
pub enum Children<'a> {
    Group(std::slice::Iter<'a, Texel>),
    Container(container::Childs<'a>),
    Leaf,
}

impl<'a> Iterator for Children<'a> {
    type Item = &'a Texel;

    fn next(&mut self) -> Option<&'a Texel> {
        match self {
            Children::Group(iter) => iter.next(),
            Children::Container(iter) => iter.next(),
            Children::Leaf => None,
        }
    }
}

impl Debug for Texel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.kind() {
            Kind::Text(t) => t.fmt(f),
            Kind::Glyph(g) => g.fmt(f),
            Kind::Group(g) => {
                f.write_str("Group")?;
                f.debug_list().entries(g.childs.iter()).finish()
            }
            Kind::Container(c) => c.fmt(f),
        }
    }
}
