//! Composite texels with a fixed set of slots: [`Container`] and the [`ContainerKind`] protocol
//!
//! A container embeds a nested structure -- a fraction, a notebook cell, a table cell -- into the
//! same linear index space as the text around it. Its children alternate between placeholder
//! glyphs (the "empties") and content slots:
//!
//! ```text
//!   empty[0]  slot[0]  empty[1]  slot[1]  ...  slot[n-1]  empty[n]
//! ```
//!
//! Each empty occupies a single index and serves as an anchor for insertions into its neighboring
//! slots. Edits may happen freely *within* a slot, or remove the container as a whole, but may
//! never cross from one slot into another (or into an empty). Violations are reported as
//! [`Error::Boundary`].
//!
//! New sorts of containers are added by implementing [`ContainerKind`]. Kinds should be checked
//! with [`register`] before they're used in any documents; a malformed kind would break the
//! guarantees of every tree it's inserted into.

use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;

use super::{Glyph, Texel};
use crate::style::Style;
use crate::{tree, Error, Result};

/// The description of a sort of [`Container`]
///
/// Implementors give the number of slots and the placeholder glyphs between them; everything else
/// about the texel protocol is provided by [`Container`] itself.
///
/// ## Requirements
///
/// [`empties`] must return exactly `slot_count() + 1` texels, each a single glyph of length one.
/// These are verified by [`Container::new`] (and more thoroughly by [`register`]), and anything
/// failing them is rejected with [`Error::Conformance`].
///
/// [`empties`]: Self::empties
pub trait ContainerKind: Debug + Send + Sync {
    /// A unique name for the kind, used by [`lookup`]
    fn name(&self) -> &str;

    /// The number of content slots
    fn slot_count(&self) -> usize;

    /// The characters shown for each of the placeholders
    ///
    /// By default, these are all U+FFFC, "OBJECT REPLACEMENT CHARACTER".
    fn separators(&self) -> Vec<char> {
        vec!['\u{fffc}'; self.slot_count() + 1]
    }

    /// Produces the placeholder glyphs, with the given style
    fn empties(&self, style: &Style) -> Vec<Texel> {
        self.separators()
            .into_iter()
            .map(|c| Texel::glyph(Glyph::separator(c, style.clone())))
            .collect()
    }
}

/// A composite texel with semantically fixed slots
///
/// Containers are immutable like every other texel; the `with_*` methods produce modified copies.
/// For an overview, refer to the [module-level documentation](self).
#[derive(Clone)]
pub struct Container {
    kind: Arc<dyn ContainerKind>,
    style: Style,
    empties: Vec<Texel>,
    slots: Vec<Texel>,
}

/// An iterator over the children of a [`Container`], alternating between empties and slots
pub struct Childs<'a> {
    container: &'a Container,
    next: usize,
}

impl Container {
    /// Creates a new container from the contents of its slots
    ///
    /// Each slot is a tree of its own, typically produced by [`tree::grouped`].
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Conformance`] if the number of slots doesn't match the kind, or if the
    /// kind produces invalid placeholders.
    pub fn new(kind: Arc<dyn ContainerKind>, slots: Vec<Texel>, style: &Style) -> Result<Self> {
        let empties = kind.empties(style);
        Self::assemble(kind, empties, slots)
    }

    fn assemble(
        kind: Arc<dyn ContainerKind>,
        empties: Vec<Texel>,
        slots: Vec<Texel>,
    ) -> Result<Self> {
        let fail = |reason: String| Error::Conformance {
            kind: kind.name().to_owned(),
            reason,
        };

        if slots.len() != kind.slot_count() {
            return Err(fail(format!(
                "expected {} slots, found {}",
                kind.slot_count(),
                slots.len()
            )));
        } else if empties.len() != slots.len() + 1 {
            return Err(fail(format!(
                "expected {} empties, found {}",
                slots.len() + 1,
                empties.len()
            )));
        }

        for (i, e) in empties.iter().enumerate() {
            if e.as_glyph().is_none() || e.length() != 1 {
                return Err(fail(format!(
                    "empty #{} is not a single glyph: {:?}",
                    i, e
                )));
            }
        }

        let style = match empties[0].leaf_style() {
            Some(s) => s.clone(),
            None => return Err(fail("container has no placeholders".to_owned())),
        };

        Ok(Container {
            kind,
            style,
            empties,
            slots,
        })
    }

    /// Returns the kind of the container
    pub fn kind(&self) -> &Arc<dyn ContainerKind> {
        &self.kind
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Returns the style of the container, as given by its first placeholder
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Returns the content of each slot
    pub fn get_content(&self) -> &[Texel] {
        &self.slots
    }

    /// Returns the placeholder glyphs around the slots
    pub fn get_empties(&self) -> &[Texel] {
        &self.empties
    }

    /// Returns all of the children, alternating between empties and slots
    pub fn get_childs(&self) -> Vec<Texel> {
        self.childs().cloned().collect()
    }

    /// Produces an iterator over all of the children, alternating between empties and slots
    pub fn childs(&self) -> Childs {
        Childs {
            container: self,
            next: 0,
        }
    }

    /// Rebuilds the container from a full set of children, as given by [`get_childs`]
    ///
    /// ## Errors
    ///
    /// The children must alternate between single glyphs and slots, starting and ending with a
    /// glyph. Anything else gives [`Error::Conformance`].
    ///
    /// [`get_childs`]: Self::get_childs
    pub fn from_childs(&self, childs: Vec<Texel>) -> Result<Container> {
        let mut empties = Vec::with_capacity(self.empties.len());
        let mut slots = Vec::with_capacity(self.slots.len());

        for (i, c) in childs.into_iter().enumerate() {
            match i % 2 {
                0 => empties.push(c),
                _ => slots.push(c),
            }
        }

        Self::assemble(self.kind.clone(), empties, slots)
    }

    /// Returns a copy with every slot replaced
    pub fn with_slots(&self, slots: Vec<Texel>) -> Result<Container> {
        Self::assemble(self.kind.clone(), self.empties.clone(), slots)
    }

    /// Returns a copy with a single slot replaced
    ///
    /// ## Panics
    ///
    /// Panics if `k` is not a valid slot index.
    pub fn with_slot(&self, k: usize, content: Texel) -> Container {
        let mut slots = self.slots.clone();
        slots[k] = content;

        Container {
            kind: self.kind.clone(),
            style: self.style.clone(),
            empties: self.empties.clone(),
            slots,
        }
    }

    /// Returns a copy with the placeholders (and so, the container's own style) restyled
    pub fn with_style(&self, style: &Style) -> Result<Container> {
        Self::new(self.kind.clone(), self.slots.clone(), style)
    }

    /// Returns the start index of slot `k`, relative to the container
    pub fn slot_start(&self, k: usize) -> usize {
        self.slots[..k].iter().map(Texel::length).sum::<usize>() + k + 1
    }

    /// (*Internal*) Finds the slot fully containing `i1..=i2`, returning its index and start
    fn slot_containing(&self, i1: usize, i2: usize) -> Option<(usize, usize)> {
        let mut start = 1;
        for (k, s) in self.slots.iter().enumerate() {
            let end = start + s.length();
            if start <= i1 && i2 <= end {
                return Some((k, start));
            }
            start = end + 1;
        }
        None
    }

    /// (*Internal*) Removes `i1..i2` from within a single slot
    ///
    /// The trivial cases (empty or complete intervals) are handled by [`tree::takeout`]; anything
    /// reaching here must be confined to a slot.
    pub(crate) fn takeout(&self, i1: usize, i2: usize) -> Result<(Vec<Texel>, Vec<Texel>)> {
        let (k, start) = self
            .slot_containing(i1, i2)
            .ok_or(Error::Boundary { start: i1, end: i2 })?;

        let (rest, part) =
            tree::takeout(&self.slots[k], i1 - start, i2 - start).map_err(|e| e.shifted(start))?;
        let rest = Texel::container(self.with_slot(k, tree::grouped(rest)));
        Ok((vec![rest], part))
    }

    /// (*Internal*) Inserts into the slot containing `i`
    pub(crate) fn insert(&self, i: usize, stuff: Vec<Texel>) -> Result<Vec<Texel>> {
        let (k, start) = self
            .slot_containing(i, i)
            .ok_or(Error::Boundary { start: i, end: i })?;

        let inserted =
            tree::insert(&self.slots[k], i - start, stuff).map_err(|e| e.shifted(start))?;
        let new = Texel::container(self.with_slot(k, tree::grouped(inserted)));
        Ok(vec![new])
    }
}

impl<'a> Iterator for Childs<'a> {
    type Item = &'a Texel;

    fn next(&mut self) -> Option<&'a Texel> {
        let i = self.next;
        let item = match i % 2 {
            0 => self.container.empties.get(i / 2),
            _ => self.container.slots.get(i / 2),
        };

        if item.is_some() {
            self.next += 1;
        }
        item
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Container<{}>", self.name())?;
        f.debug_list().entries(self.slots.iter()).finish()
    }
}

//////////////////////////////////////////
// Built-in kinds                       //
//////////////////////////////////////////

/// A fraction, with slots for the denominator and the nominator
///
/// The text of a fraction reads as `(denominator/nominator)`.
#[derive(Debug, Default, Copy, Clone)]
pub struct Fraction;

impl ContainerKind for Fraction {
    fn name(&self) -> &str {
        "fraction"
    }

    fn slot_count(&self) -> usize {
        2
    }

    fn separators(&self) -> Vec<char> {
        vec!['(', '/', ')']
    }
}

impl Fraction {
    /// Builds a fraction texel from the contents of its two slots
    pub fn build(denominator: Texel, nominator: Texel, style: &Style) -> Result<Texel> {
        let c = Container::new(Arc::new(Fraction), vec![denominator, nominator], style)?;
        Ok(Texel::container(c))
    }
}

/// A notebook cell, with an input slot and an output slot
#[derive(Debug, Default, Copy, Clone)]
pub struct Cell;

impl ContainerKind for Cell {
    fn name(&self) -> &str {
        "cell"
    }

    fn slot_count(&self) -> usize {
        2
    }
}

impl Cell {
    /// Builds a cell texel from its input and output
    pub fn build(input: Texel, output: Texel, style: &Style) -> Result<Texel> {
        let c = Container::new(Arc::new(Cell), vec![input, output], style)?;
        Ok(Texel::container(c))
    }
}

//////////////////////////////////////////
// Registry                             //
//////////////////////////////////////////

lazy_static! {
    /// The registered kinds, by name
    static ref REGISTRY: RwLock<HashMap<String, Arc<dyn ContainerKind>>> = {
        let mut map: HashMap<String, Arc<dyn ContainerKind>> = HashMap::new();
        map.insert(Fraction.name().to_owned(), Arc::new(Fraction));
        map.insert(Cell.name().to_owned(), Arc::new(Cell));
        RwLock::new(map)
    };
}

/// Checks that the kind conforms to the texel protocol, and makes it available through [`lookup`]
///
/// The built-in [`Fraction`] and [`Cell`] kinds are always registered. Registering a kind under a
/// name that's already taken replaces the previous one.
///
/// ## Errors
///
/// Returns the [`Error::Conformance`] produced by [`tree::check_kind`] if the kind is malformed;
/// in that case, nothing is registered.
pub fn register(kind: Arc<dyn ContainerKind>) -> Result<()> {
    if let Err(e) = tree::check_kind(kind.clone()) {
        log::warn!("rejected container kind '{}': {}", kind.name(), e);
        return Err(e);
    }

    let mut registry = REGISTRY.write().unwrap_or_else(|p| p.into_inner());
    registry.insert(kind.name().to_owned(), kind);
    Ok(())
}

/// Returns the registered kind with the given name
pub fn lookup(name: &str) -> Option<Arc<dyn ContainerKind>> {
    let registry = REGISTRY.read().unwrap_or_else(|p| p.into_inner());
    registry.get(name).cloned()
}
