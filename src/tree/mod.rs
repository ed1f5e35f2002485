//! The algebra of structural operations on texel trees
//!
//! Everything here is a pure function: texels go in, new texels come out, and the inputs are left
//! untouched. Untouched subtrees are shared between the old and new trees.
//!
//! ## Lists and trees
//!
//! Most operations here produce *lists* of texels rather than single trees. A list is always
//! homogeneous -- every element has the same depth -- and can be turned into a single balanced
//! tree with [`grouped`]. The reverse is [`as_list`]. Working with lists lets the operations
//! compose without introducing extra levels of grouping at every step: [`join`] stitches lists of
//! differing depth together by descending into the deeper side, much like concatenation in a 2-3
//! tree.
//!
//! ## Balance
//!
//! So long as their inputs were efficient (see [`is_efficient`]), every operation here produces
//! efficient output: all groups other than the root have between `ceil(nmax/2)` and `nmax`
//! children. This keeps the depth logarithmic in the number of leaves.
//!
//! ## Containers
//!
//! Containers have depth zero; they sit among the leaves of the balancing structure, and each of
//! their slots is a separately balanced tree. Operations that reach into a container are confined
//! to a single slot.

use std::cmp::Ordering;

use crate::texel::{Kind, Texel};
use crate::{config, Error, Result};

mod check;
mod dump;
mod styles;
mod weights;

#[cfg(test)]
mod tests;

pub use check::{check_kind, conformance, is_efficient, is_homogeneous, validate};
pub use dump::dump;
pub use styles::{get_style, get_styles, set_properties, set_styles};
pub(crate) use styles::runs_end;
pub use weights::{find_weight, get_weight, iter_leaves, leaf_at, linelengths, Leaves};

//////////////////////////////////////////
// Balancing                            //
//////////////////////////////////////////

/// Partitions a homogeneous list into groups of near-equal size
///
/// With `N` elements, this produces `ceil(N / nmax)` groups, whose sizes differ by at most one.
/// When `N > nmax`, every group has between `ceil(nmax/2)` and `nmax` children.
pub fn groups(list: Vec<Texel>) -> Vec<Texel> {
    let total = list.len();
    if total == 0 {
        return Vec::new();
    }

    let nmax = config::nmax();
    let n = (total + nmax - 1) / nmax;

    let mut out = Vec::with_capacity(n);
    let mut iter = list.into_iter();
    let mut start = 0;
    for k in 1..=n {
        // round(k * total / n), in integer arithmetic
        let end = (2 * k * total + n) / (2 * n);
        out.push(Texel::group(iter.by_ref().take(end - start).collect()));
        start = end;
    }

    out
}

/// Builds a single balanced tree from a homogeneous list
///
/// A list with exactly one element gives that element back, and an empty list gives an empty
/// group.
pub fn grouped(mut list: Vec<Texel>) -> Texel {
    let nmax = config::nmax();
    while list.len() > nmax {
        list = groups(list);
    }

    strip(Texel::group(list))
}

/// Removes any chain of single-child groups from the top of the tree
pub fn strip(mut t: Texel) -> Texel {
    loop {
        let child = match t.as_group() {
            Some(g) if g.len() == 1 => g.childs()[0].clone(),
            _ => return t,
        };
        t = child;
    }
}

/// Returns the children of a group, or the texel itself as a single-element list
///
/// This is the inverse of [`grouped`]. An empty tree gives an empty list.
pub fn as_list(t: &Texel) -> Vec<Texel> {
    match t.as_group() {
        Some(g) => g.childs().to_vec(),
        None => vec![t.clone()],
    }
}

/// Concatenates the homogeneous lists, which may have different depths
///
/// The result is homogeneous, with the depth of the deepest input.
pub fn join(lists: Vec<Vec<Texel>>) -> Vec<Texel> {
    lists.into_iter().fold(Vec::new(), join2)
}

fn join2(mut l1: Vec<Texel>, mut l2: Vec<Texel>) -> Vec<Texel> {
    let (d1, d2) = match (l1.last(), l2.first()) {
        (Some(a), Some(b)) => (a.depth(), b.depth()),
        _ => {
            l1.append(&mut l2);
            return l1;
        }
    };

    match d1.cmp(&d2) {
        Ordering::Equal => {
            l1.append(&mut l2);
            l1
        }
        // The left list is deeper: merge the right list into the children of its last element,
        // and regroup whatever that produces.
        Ordering::Greater => {
            let t1 = l1.remove(l1.len() - 1);
            let inner = join2(t1.children().cloned().collect(), l2);
            l1.extend(groups(inner));
            l1
        }
        Ordering::Less => {
            let t2 = l2.remove(0);
            let mut out = groups(join2(l1, t2.children().cloned().collect()));
            out.extend(l2);
            out
        }
    }
}

//////////////////////////////////////////
// Structural edits                     //
//////////////////////////////////////////

/// Partitions the texel around `i1..i2`, returning the lists `(rest, part)`
///
/// `part` holds everything in the interval and `rest` everything outside of it; both are
/// homogeneous, but may be shallower than the input. Inserting `part` back into `rest` at `i1`
/// recreates the original content.
///
/// ## Errors
///
/// Returns [`Error::OutOfRange`] if the interval isn't within `0..=length`, and
/// [`Error::Boundary`] if it crosses the edge of a container slot. Removing an entire container is
/// always allowed.
pub fn takeout(t: &Texel, i1: usize, i2: usize) -> Result<(Vec<Texel>, Vec<Texel>)> {
    let len = t.length();
    Error::check_interval(i1, i2, len)?;

    if i1 == i2 {
        return Ok((as_list(t), Vec::new()));
    } else if i1 == 0 && i2 == len {
        return Ok((Vec::new(), as_list(t)));
    }

    match t.kind() {
        Kind::Text(x) => Ok((
            vec![x.without(i1, i2).into()],
            vec![x.slice(i1, i2).into()],
        )),
        // Glyphs have length one; they're always covered by the trivial cases above.
        Kind::Glyph(_) => Ok((as_list(t), Vec::new())),
        Kind::Container(c) => c.takeout(i1, i2),
        Kind::Group(g) => {
            let mut left = Vec::new();
            let mut mid = Vec::new();
            let mut right = Vec::new();

            // Results from the children straddling `i1` and `i2`
            let (mut rest1, mut part1) = (Vec::new(), Vec::new());
            let (mut rest2, mut part2) = (Vec::new(), Vec::new());

            let mut start = 0;
            for c in g.childs() {
                let end = start + c.length();

                if end <= i1 {
                    left.push(c.clone());
                } else if start >= i2 {
                    right.push(c.clone());
                } else if start >= i1 && end <= i2 {
                    mid.push(c.clone());
                } else {
                    let (r, p) = takeout(c, i1.max(start) - start, i2.min(end) - start)
                        .map_err(|e| e.shifted(start))?;

                    if start < i1 {
                        rest1 = r;
                        part1 = p;
                    } else {
                        rest2 = r;
                        part2 = p;
                    }
                }

                start = end;
            }

            let rest = join(vec![left, rest1, rest2, right]);
            let part = join(vec![part1, mid, part2]);
            Ok((rest, part))
        }
    }
}

/// Returns the list of everything in `i1..i2`
///
/// Refer to [`takeout`] for the possible errors.
pub fn copy(t: &Texel, i1: usize, i2: usize) -> Result<Vec<Texel>> {
    takeout(t, i1, i2).map(|(_, part)| part)
}

/// Returns the list of everything *outside* of `i1..i2`
///
/// Refer to [`takeout`] for the possible errors.
pub fn remove(t: &Texel, i1: usize, i2: usize) -> Result<Vec<Texel>> {
    takeout(t, i1, i2).map(|(rest, _)| rest)
}

/// Splits the texel into the trees before and after `i`
///
/// ## Errors
///
/// Returns [`Error::OutOfRange`] if `i > length`, or [`Error::Boundary`] if `i` is strictly
/// inside a container.
pub fn split(t: &Texel, i: usize) -> Result<(Texel, Texel)> {
    Error::check_index(i, t.length())?;
    let (left, right) = takeout(t, i, t.length())?;
    Ok((grouped(left), grouped(right)))
}

/// Inserts the homogeneous list `stuff` at index `i`, returning the resulting list
///
/// If `i` is inside of a container, the insertion goes into the slot containing it.
///
/// ## Errors
///
/// Returns [`Error::OutOfRange`] if `i > length`. Insertions can never cross a slot boundary, but
/// an index on a container's placeholder (where there's no slot) gives [`Error::Boundary`].
pub fn insert(t: &Texel, i: usize, stuff: Vec<Texel>) -> Result<Vec<Texel>> {
    let len = t.length();
    Error::check_index(i, len)?;

    if stuff.is_empty() {
        return Ok(as_list(t));
    } else if i == 0 && !t.is_group() {
        return Ok(join(vec![stuff, vec![t.clone()]]));
    } else if i == len && !t.is_group() {
        return Ok(join(vec![vec![t.clone()], stuff]));
    }

    match t.kind() {
        Kind::Text(x) => {
            let left: Texel = x.slice(0, i).into();
            let right: Texel = x.slice(i, len).into();
            Ok(join(vec![vec![left], stuff, vec![right]]))
        }
        // Glyphs have length one, so `i` is always at one of their edges.
        Kind::Glyph(_) => Ok(join(vec![vec![t.clone()], stuff])),
        Kind::Container(c) => c.insert(i, stuff),
        Kind::Group(g) => {
            let childs = g.childs();

            let mut start = 0;
            for (k, c) in childs.iter().enumerate() {
                let end = start + c.length();

                if i == start {
                    return Ok(join(vec![childs[..k].to_vec(), stuff, childs[k..].to_vec()]));
                } else if i < end {
                    let inner = insert(c, i - start, stuff).map_err(|e| e.shifted(start))?;
                    return Ok(join(vec![
                        childs[..k].to_vec(),
                        inner,
                        childs[k + 1..].to_vec(),
                    ]));
                }

                start = end;
            }

            Ok(join(vec![childs.to_vec(), stuff]))
        }
    }
}

/// Replaces `i1..i2` with the homogeneous list `stuff`, returning the resulting tree
pub fn replace(t: &Texel, i1: usize, i2: usize, stuff: Vec<Texel>) -> Result<Texel> {
    let rest = grouped(remove(t, i1, i2)?);
    Ok(grouped(insert(&rest, i1, stuff)?))
}

//////////////////////////////////////////
// Healing                              //
//////////////////////////////////////////

/// Fuses the leaves on either side of each of the positions, where possible
///
/// Repeated edits can leave a document fragmented into many small leaves; healing at the edges of
/// every edit keeps the number of leaves proportional to the number of distinct style runs (with
/// each run capped at `max_run`). Healing never changes the content of the tree, and healing the
/// same position twice has no further effect.
///
/// Positions are processed in order. Positions at either end of the tree are ignored.
pub fn heal(t: &Texel, positions: &[usize]) -> Result<Texel> {
    let mut t = t.clone();
    for &i in positions {
        t = heal_at(&t, i)?;
    }
    Ok(t)
}

fn heal_at(t: &Texel, i: usize) -> Result<Texel> {
    let len = t.length();
    Error::check_index(i, len)?;
    if i == 0 || i == len {
        return Ok(t.clone());
    }

    let (left, lstart) = leaf_at(t, i - 1)?;
    let (right, rstart) = leaf_at(t, i)?;

    // A single leaf spans the position; there's nothing to fuse
    if rstart != i || lstart + left.length() != i {
        return Ok(t.clone());
    }

    match left.merge(&right) {
        Some(merged) => {
            log::trace!("heal: fusing leaves at {}..{}", lstart, rstart + right.length());
            replace(t, lstart, rstart + right.length(), vec![merged])
        }
        None => Ok(t.clone()),
    }
}

//////////////////////////////////////////
// Text                                 //
//////////////////////////////////////////

/// Returns the text in `i1..i2`
///
/// Every glyph contributes its single character.
pub fn get_text(t: &Texel, i1: usize, i2: usize) -> Result<String> {
    Error::check_interval(i1, i2, t.length())?;
    let mut out = String::with_capacity(i2 - i1);
    write_text(t, i1, i2, &mut out);
    Ok(out)
}

/// (*Internal*) Appends the text in `i1..i2` to `out`; the interval must be valid
pub(crate) fn write_text(t: &Texel, i1: usize, i2: usize, out: &mut String) {
    match t.kind() {
        Kind::Text(x) => out.push_str(x.str_slice(i1, i2)),
        Kind::Glyph(g) if i1 < i2 => out.push(g.text()),
        Kind::Glyph(_) => (),
        Kind::Group(_) | Kind::Container(_) => {
            let mut start = 0;
            for c in t.children() {
                if start >= i2 {
                    break;
                }

                let end = start + c.length();
                if end > i1 {
                    write_text(c, i1.max(start) - start, i2.min(end) - start, out);
                }
                start = end;
            }
        }
    }
}
