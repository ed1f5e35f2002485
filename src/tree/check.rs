//! Invariant and conformance checks
//!
//! None of these are needed for correct operation; the tree algebra maintains every invariant on
//! its own. They exist to catch bugs: in tests, in debug builds with
//! [`debug_checks`](crate::Config::debug_checks) enabled, and when registering new container
//! kinds, where a malformed kind would silently break every tree it's inserted into.

use std::sync::Arc;

use crate::style::Style;
use crate::texel::{Container, ContainerKind, Kind, Texel};
use crate::{config, Error, Result};

use super::{get_styles, grouped, insert, split, takeout};

/// Returns whether all of the texels have the same depth
pub fn is_homogeneous(list: &[Texel]) -> bool {
    match list.first() {
        Some(first) => list.iter().all(|t| t.depth() == first.depth()),
        None => true,
    }
}

/// Returns whether every group below the root has between `ceil(nmax/2)` and `nmax` children
///
/// The root of the tree (and the root of each container slot) may have fewer, but never more.
pub fn is_efficient(t: &Texel) -> bool {
    let config = config::get();
    efficient(t, true, config.nmin(), config.nmax)
}

fn efficient(t: &Texel, is_root: bool, nmin: usize, nmax: usize) -> bool {
    match t.kind() {
        Kind::Group(g) => {
            let n = g.len();
            if n > nmax || (!is_root && n < nmin) {
                return false;
            }
            g.childs().iter().all(|c| efficient(c, false, nmin, nmax))
        }
        Kind::Container(c) => c
            .get_content()
            .iter()
            .all(|s| efficient(s, true, nmin, nmax)),
        Kind::Text(_) | Kind::Glyph(_) => true,
    }
}

fn tree_error(reason: String) -> Error {
    Error::Conformance {
        kind: "tree".to_owned(),
        reason,
    }
}

/// Checks the structural invariants of the tree
///
/// This verifies that groups are homogeneous and efficient, that no group other than a root is
/// empty, and that there are no empty text leaves.
///
/// ## Errors
///
/// Returns [`Error::Conformance`] describing the first violation found.
pub fn validate(t: &Texel) -> Result<()> {
    if !is_efficient(t) {
        return Err(tree_error(format!("tree is not efficient: {:?}", t)));
    }
    validate_node(t, true)
}

fn validate_node(t: &Texel, is_root: bool) -> Result<()> {
    match t.kind() {
        Kind::Text(x) if x.is_empty() => Err(tree_error("empty text leaf".to_owned())),
        Kind::Text(_) | Kind::Glyph(_) => Ok(()),
        Kind::Group(g) => {
            if g.is_empty() && !is_root {
                return Err(tree_error("empty group below the root".to_owned()));
            } else if !is_homogeneous(g.childs()) {
                return Err(tree_error(format!("group is not homogeneous: {:?}", t)));
            }

            g.childs().iter().try_for_each(|c| validate_node(c, false))
        }
        Kind::Container(c) => c
            .get_content()
            .iter()
            .try_for_each(|s| validate_node(s, true)),
    }
}

/// Exhaustively checks that splitting and partitioning the tree preserve its content
///
/// For every index, [`split`] must preserve the length and text. For every interval, the part
/// given by [`takeout`] must have the interval's length and text, and inserting it back must
/// recreate the original. Intervals rejected with [`Error::Boundary`] are skipped; any other error
/// is a failure.
///
/// This is quadratic in the length of the tree (with each step linear), so it's only suitable for
/// small samples.
pub fn conformance(t: &Texel) -> Result<()> {
    let len = t.length();
    let text = t.get_text();
    let chars: Vec<char> = text.chars().collect();

    let styled: usize = get_styles(t, 0, len)?.iter().map(|(n, _)| n).sum();
    if styled != len {
        return Err(tree_error(format!(
            "style runs cover {} positions of {}",
            styled, len
        )));
    }

    for i in 0..=len {
        let (a, b) = match split(t, i) {
            Ok(pair) => pair,
            Err(Error::Boundary { .. }) => continue,
            Err(e) => return Err(tree_error(format!("split at {} failed: {}", i, e))),
        };

        if a.length() + b.length() != len || a.get_text() + &b.get_text() != text {
            return Err(tree_error(format!("split at {} changed the content", i)));
        }
    }

    for i1 in 0..=len {
        for i2 in i1..=len {
            let (rest, part) = match takeout(t, i1, i2) {
                Ok(pair) => pair,
                Err(Error::Boundary { .. }) => continue,
                Err(e) => {
                    return Err(tree_error(format!(
                        "takeout of {}..{} failed: {}",
                        i1, i2, e
                    )))
                }
            };

            let part = grouped(part);
            let expected: String = chars[i1..i2].iter().collect();
            if part.length() != i2 - i1 || part.get_text() != expected {
                return Err(tree_error(format!(
                    "takeout of {}..{} gave the wrong part: {:?}",
                    i1, i2, part
                )));
            }

            let restored = insert(&grouped(rest), i1, super::as_list(&part))
                .map(grouped)
                .map_err(|e| tree_error(format!("reinsertion at {} failed: {}", i1, e)))?;
            if restored.get_text() != text {
                return Err(tree_error(format!(
                    "reinserting {}..{} changed the content",
                    i1, i2
                )));
            }
        }
    }

    Ok(())
}

/// Checks that the container kind upholds the texel protocol
///
/// A sample container is built from the kind and embedded between two text leaves; the result is
/// run through [`validate`] and [`conformance`].
///
/// ## Errors
///
/// Returns [`Error::Conformance`] (with the name of the kind) if anything fails.
pub fn check_kind(kind: Arc<dyn ContainerKind>) -> Result<()> {
    let name = kind.name().to_owned();
    let rename = |e: Error| match e {
        Error::Conformance { reason, .. } => Error::Conformance {
            kind: name.clone(),
            reason,
        },
        e => Error::Conformance {
            kind: name.clone(),
            reason: e.to_string(),
        },
    };

    let style = Style::default();
    let n = kind.slot_count();

    if kind.separators().len() != n + 1 {
        return Err(rename(tree_error(format!(
            "expected {} separators, found {}",
            n + 1,
            kind.separators().len()
        ))));
    }

    // One slot is left empty, to check that empty slots are handled
    let slots = (0..n)
        .map(|k| match k {
            0 => grouped(Vec::new()),
            _ => Texel::text(&format!("s{}", k), style.clone()),
        })
        .collect();
    let container = Container::new(kind.clone(), slots, &style).map_err(&rename)?;

    let rebuilt = container
        .from_childs(container.get_childs())
        .map_err(&rename)?;
    if Texel::from(rebuilt).get_text() != Texel::from(container.clone()).get_text() {
        return Err(rename(tree_error(
            "rebuilding from its children changed the content".to_owned(),
        )));
    }

    let sample = grouped(vec![
        Texel::text("<", style.clone()),
        Texel::from(container),
        Texel::text(">", style),
    ]);

    validate(&sample).map_err(&rename)?;
    conformance(&sample).map_err(&rename)
}
