//! Style-run storage: reading and writing the styles of ranges of a tree
//!
//! Styles are stored on the leaves, so a run of a single style may span many leaves (and a single
//! text leaf is always a single run). The functions here translate between the leaves and
//! run-length lists of `(length, style)` pairs.

use crate::style::{Style, StyleMap};
use crate::texel::{Container, Kind, Texel};
use crate::{config, Error, Result};

use super::{grouped, heal, is_homogeneous, join, leaf_at};

/// Returns the style at index `i`
///
/// The index just past the end gives the style of the last position, so that appending text
/// continues with the surrounding style.
///
/// ## Errors
///
/// Returns [`Error::OutOfRange`] if `i > length`, or for any index into an empty tree.
pub fn get_style(t: &Texel, i: usize) -> Result<Style> {
    let len = t.length();
    if len == 0 {
        return Err(Error::OutOfRange { idx: i, len });
    }
    Error::check_index(i, len)?;

    let (leaf, _) = leaf_at(t, i.min(len - 1))?;
    Ok(leaf.leaf_style().cloned().unwrap_or_default())
}

/// Returns the style runs covering `i1..i2`
///
/// Neighboring runs always have different styles; leaves with identical style handles are
/// reported as a single run. The lengths sum to `i2 - i1`.
pub fn get_styles(t: &Texel, i1: usize, i2: usize) -> Result<Vec<(usize, Style)>> {
    Error::check_interval(i1, i2, t.length())?;

    let mut runs = Vec::new();
    collect_styles(t, i1, i2, &mut runs);
    Ok(runs)
}

fn collect_styles(t: &Texel, i1: usize, i2: usize, runs: &mut Vec<(usize, Style)>) {
    if let Some(style) = t.leaf_style() {
        push_run(runs, i2 - i1, style);
        return;
    }

    let mut start = 0;
    for c in t.children() {
        if start >= i2 {
            break;
        }

        let end = start + c.length();
        if end > i1 {
            collect_styles(c, i1.max(start) - start, i2.min(end) - start, runs);
        }
        start = end;
    }
}

fn push_run(runs: &mut Vec<(usize, Style)>, n: usize, style: &Style) {
    if n == 0 {
        return;
    }

    match runs.last_mut() {
        Some((m, s)) if Style::same(s, style) => *m += n,
        _ => runs.push((n, style.clone())),
    }
}

// An absolute interval of the tree, to be given a particular style
struct Span {
    start: usize,
    end: usize,
    style: Style,
}

/// Restyles the tree with the runs, starting at index `i`
///
/// Each run `(n, style)` applies `style` to the next `n` positions. Text leaves are split where
/// a run boundary falls inside of them. Newlines keep their paragraph styles.
///
/// ## Errors
///
/// Returns [`Error::OutOfRange`] if the runs extend past the end of the tree.
pub fn set_styles(t: &Texel, i: usize, runs: &[(usize, Style)]) -> Result<Texel> {
    let end = runs_end(i, runs, t.length())?;
    Error::check_interval(i, end, t.length())?;

    let mut spans = Vec::with_capacity(runs.len());
    let mut start = i;
    for (n, style) in runs {
        if *n != 0 {
            spans.push(Span {
                start,
                end: start + n,
                style: style.clone(),
            });
        }
        start += n;
    }
    if spans.is_empty() {
        return Ok(t.clone());
    }

    Ok(grouped(restyle(t, 0, &spans)?))
}

/// (*Internal*) Returns the index just past the last run that starts at `i`
///
/// Totals that don't fit in a `usize` give [`Error::OutOfRange`] against `len`.
pub(crate) fn runs_end(i: usize, runs: &[(usize, Style)], len: usize) -> Result<usize> {
    runs.iter()
        .try_fold(i, |end, (n, _)| end.checked_add(*n))
        .ok_or(Error::OutOfRange {
            idx: usize::MAX,
            len,
        })
}

// Returns the spans that overlap with `start..end`
fn overlapping(spans: &[Span], start: usize, end: usize) -> &[Span] {
    let first = spans.partition_point(|s| s.end <= start);
    let count = spans[first..].partition_point(|s| s.start < end);
    &spans[first..first + count]
}

// Restyles the texel starting at `offset`, returning the list that replaces it
fn restyle(t: &Texel, offset: usize, spans: &[Span]) -> Result<Vec<Texel>> {
    let end = offset + t.length();
    let spans = overlapping(spans, offset, end);
    if spans.is_empty() {
        return Ok(vec![t.clone()]);
    }

    match t.kind() {
        Kind::Text(x) => {
            // Pieces of the text, as relative intervals with their new styles
            let mut pieces = Vec::with_capacity(2 * spans.len() + 1);
            let mut pos = offset;
            for s in spans {
                let s_start = s.start.max(offset);
                let s_end = s.end.min(end);
                push_piece(&mut pieces, pos - offset, s_start - offset, x.style());
                push_piece(&mut pieces, s_start - offset, s_end - offset, &s.style);
                pos = s_end;
            }
            push_piece(&mut pieces, pos - offset, end - offset, x.style());

            Ok(pieces
                .into_iter()
                .map(|(a, b, s)| x.slice(a, b).with_style(s.clone()).into())
                .collect())
        }
        // The only overlapping span covers the glyph
        Kind::Glyph(g) => Ok(vec![g.with_style(spans[0].style.clone()).into()]),
        Kind::Container(c) => Ok(vec![restyle_container(c, offset, spans)?.into()]),
        Kind::Group(g) => {
            let depth = t.depth();
            let mut lists = Vec::with_capacity(g.len());
            let mut start = offset;
            for c in g.childs() {
                lists.push(restyle(c, start, spans)?);
                start += c.length();
            }

            let list = join(lists);

            // Keep the original shape where it's still valid, instead of regrouping
            let nmax = config::nmax();
            let fits = list.len() >= (nmax + 1) / 2 && list.len() <= nmax;
            if fits && is_homogeneous(&list) && list.iter().all(|c| c.depth() + 1 == depth) {
                return Ok(vec![Texel::group(list)]);
            }
            Ok(list)
        }
    }
}

// Adds the piece `a..b` of a text, extending the previous piece if it has the same style
fn push_piece<'a>(
    pieces: &mut Vec<(usize, usize, &'a Style)>,
    a: usize,
    b: usize,
    style: &'a Style,
) {
    if a == b {
        return;
    }

    match pieces.last_mut() {
        Some((_, end, s)) if Style::same(s, style) => *end = b,
        _ => pieces.push((a, b, style)),
    }
}

fn restyle_container(c: &Container, offset: usize, spans: &[Span]) -> Result<Container> {
    let mut childs = Vec::new();
    let mut start = offset;

    for (k, child) in c.childs().enumerate() {
        let restyled = restyle(child, start, spans)?;
        start += child.length();

        match k % 2 {
            // Placeholders are single glyphs, restyled in place
            0 => childs.extend(restyled),
            _ => childs.push(grouped(restyled)),
        }
    }

    c.from_childs(childs)
}

/// Overrides the properties in `patch` for every style in `i1..i2`
///
/// Every run in the interval has its style updated through the style pool, and the edges of the
/// interval (along with the boundaries between the original runs) are healed afterwards, so runs
/// that became identical are fused.
pub fn set_properties(t: &Texel, i1: usize, i2: usize, patch: &StyleMap) -> Result<Texel> {
    let runs = get_styles(t, i1, i2)?;

    let mut positions = vec![i1];
    let mut updated = Vec::with_capacity(runs.len());
    let mut pos = i1;
    for (n, style) in runs {
        pos += n;
        positions.push(pos);
        updated.push((n, style.update(patch)));
    }

    let restyled = set_styles(t, i1, &updated)?;
    heal(&restyled, &positions)
}
