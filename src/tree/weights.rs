//! Weighted index translation and leaf queries
//!
//! All of the functions here descend the tree iteratively, so they're safe to use on arbitrarily
//! deep nesting of containers.

use crate::texel::{Channel, Texel};
use crate::{Error, Result};

/// Returns the smallest index `i` such that `0..i` weighs at least `w` in the channel
///
/// For [`Channel::Length`] this is just `w`. For [`Channel::Lines`], it gives the index just after
/// the `w`th newline, i.e. the start of row `w`. A weight of zero always gives index zero.
///
/// ## Errors
///
/// Returns [`Error::OutOfRange`] if `w` is greater than the total weight of the texel.
pub fn find_weight(t: &Texel, w: usize, channel: Channel) -> Result<usize> {
    let total = t.weights().get(channel);
    if w > total {
        return Err(Error::OutOfRange { idx: w, len: total });
    } else if w == 0 {
        return Ok(0);
    }

    // Invariant: `1 <= w <= node.weights().get(channel)`
    let mut node = t;
    let mut w = w;
    let mut offset = 0;

    loop {
        if node.is_leaf() {
            return Ok(offset + node.leaf_index_of_weight(channel, w));
        }

        let mut next = None;
        for c in node.children() {
            let cw = c.weights().get(channel);
            if cw >= w {
                next = Some(c);
                break;
            }

            w -= cw;
            offset += c.length();
        }

        node = match next {
            Some(c) => c,
            None => return Err(Error::OutOfRange { idx: w, len: total }),
        };
    }
}

/// Returns the total weight of the channel over `0..i`
///
/// ## Errors
///
/// Returns [`Error::OutOfRange`] if `i > length`.
pub fn get_weight(t: &Texel, channel: Channel, i: usize) -> Result<usize> {
    Error::check_index(i, t.length())?;

    let mut node = t;
    let mut i = i;
    let mut acc = 0;

    loop {
        if i == 0 {
            return Ok(acc);
        } else if i >= node.length() {
            return Ok(acc + node.weights().get(channel));
        } else if node.is_leaf() {
            return Ok(acc + node.leaf_partial_weight(channel, i));
        }

        // `0 < i < node.length()`, so one of the children must contain it
        let mut next = None;
        for c in node.children() {
            if i < c.length() {
                next = Some(c);
                break;
            }

            acc += c.weights().get(channel);
            i -= c.length();
        }

        match next {
            Some(c) => node = c,
            None => return Ok(acc),
        }
    }
}

/// Returns the leaf at index `i`, along with the index it starts at
///
/// Containers are descended into, so the leaf may be one of their placeholders.
///
/// ## Errors
///
/// Returns [`Error::OutOfRange`] unless `i < length`.
pub fn leaf_at(t: &Texel, i: usize) -> Result<(Texel, usize)> {
    let len = t.length();
    if i >= len {
        return Err(Error::OutOfRange { idx: i, len });
    }

    let mut node = t;
    let mut offset = 0;

    loop {
        if node.is_leaf() {
            return Ok((node.clone(), offset));
        }

        let mut next = None;
        for c in node.children() {
            if i < offset + c.length() {
                next = Some(c);
                break;
            }
            offset += c.length();
        }

        node = match next {
            Some(c) => c,
            None => return Err(Error::OutOfRange { idx: i, len }),
        };
    }
}

/// An iterator over the leaves of a tree, in index order
///
/// This is produced by [`iter_leaves`].
pub struct Leaves {
    // The subtrees still to visit, with the next one on top
    stack: Vec<Texel>,
}

/// Produces an iterator over every leaf in the tree, including container placeholders
pub fn iter_leaves(t: &Texel) -> Leaves {
    Leaves {
        stack: vec![t.clone()],
    }
}

impl Iterator for Leaves {
    type Item = Texel;

    fn next(&mut self) -> Option<Texel> {
        while let Some(t) = self.stack.pop() {
            if t.is_leaf() {
                return Some(t);
            }

            let childs: Vec<_> = t.children().cloned().collect();
            self.stack.extend(childs.into_iter().rev());
        }

        None
    }
}

/// Returns the length of every line in the tree, each including its terminating newline
///
/// There's always one more line than there are newlines; the last line has no terminator (and may
/// be empty). The lengths sum to the length of the tree.
pub fn linelengths(t: &Texel) -> Vec<usize> {
    let mut out = Vec::with_capacity(t.lines() + 1);
    let mut current = 0;

    for leaf in iter_leaves(t) {
        current += leaf.length();
        if leaf.lines() != 0 {
            out.push(current);
            current = 0;
        }
    }

    out.push(current);
    out
}
