//! Persistent, weight-balanced trees for richly styled text
//!
//! The central type here is the [`Texel`]: an immutable node in a document tree. Leaves hold runs
//! of characters or single control glyphs, [`Group`]s provide the balancing structure, and
//! [`Container`]s embed nested structures (fractions, notebook cells, ...) into the same linear
//! index space as the surrounding text.
//!
//! Every edit produces a new tree that shares all untouched subtrees with the old one, so old
//! roots stay valid for as long as anyone holds onto them. The [`tree`] module provides the
//! algebra of structural operations, and [`Document`] wraps all of it into a mutable handle with
//! change notifications.

#![warn(clippy::style, clippy::perf)]
#![deny(
    clippy::perf,
    clippy::len_zero,
    clippy::redundant_closure,
    unused_must_use
)]

pub mod config;
pub mod document;
mod error;
pub mod logger;
pub mod style;
pub mod texel;
pub mod tree;

pub use config::Config;
pub use document::{Document, Observer, ObserverId, Snapshots};
pub use error::{Error, Result};
pub use style::{Style, StyleMap, StyleValue};
pub use texel::{Channel, Container, ContainerKind, Glyph, Group, Kind, Text, Texel, Weights};
