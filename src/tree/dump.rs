//! Debug printing for trees

use std::fmt::Write;

use crate::texel::{Kind, Texel};

/// Produces an indented, human-readable description of the tree, one node per line
///
/// Groups and containers list their weights; leaves show their content and style.
pub fn dump(t: &Texel) -> String {
    let mut out = String::new();

    // (node, indentation level), with the next node on top
    let mut stack = vec![(t.clone(), 0)];
    while let Some((node, level)) = stack.pop() {
        let indent = "  ".repeat(level);
        let w = node.weights();

        // Writing into a `String` never fails
        let _ = match node.kind() {
            Kind::Text(x) => writeln!(out, "{}{:?} {:?}", indent, x, x.style()),
            Kind::Glyph(g) => writeln!(out, "{}{:?} {:?}", indent, g, g.style()),
            Kind::Group(g) => writeln!(
                out,
                "{}Group[{}] depth = {}, length = {}, lines = {}",
                indent,
                g.len(),
                w.depth,
                w.length,
                w.lines
            ),
            Kind::Container(c) => writeln!(
                out,
                "{}Container<{}> length = {}, lines = {}",
                indent,
                c.name(),
                w.length,
                w.lines
            ),
        };

        let childs: Vec<_> = node.children().cloned().collect();
        stack.extend(childs.into_iter().rev().map(|c| (c, level + 1)));
    }

    out
}
