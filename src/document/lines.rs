//! Wrapper module for [`LineIndex`]

/// The length of every line in a document, kept up to date incrementally
///
/// Each length includes the line's terminating newline, so the lengths always sum to the length of
/// the document. There's always at least one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineIndex {
    lengths: Vec<usize>,
}

impl LineIndex {
    pub fn new(lengths: Vec<usize>) -> Self {
        debug_assert!(!lengths.is_empty());
        LineIndex { lengths }
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Updates the index for the insertion of content with line lengths `inserted` at the given
    /// row and column
    pub fn insert(&mut self, row: usize, col: usize, inserted: &[usize]) {
        let old = self.lengths[row];
        let k = inserted.len() - 1;

        let replacement = match k {
            0 => vec![old + inserted[0]],
            _ => {
                let mut lines = Vec::with_capacity(k + 1);
                lines.push(col + inserted[0]);
                lines.extend_from_slice(&inserted[1..k]);
                lines.push(inserted[k] + old - col);
                lines
            }
        };

        self.lengths.splice(row..=row, replacement);
    }

    /// Updates the index for the removal of everything between the two positions
    pub fn remove(&mut self, (r1, c1): (usize, usize), (r2, c2): (usize, usize)) {
        let joined = c1 + (self.lengths[r2] - c2);
        self.lengths.splice(r1..=r2, Some(joined));
    }
}

#[cfg(test)]
mod tests {
    use super::LineIndex;

    #[test]
    fn insert_without_newlines() {
        // "ab\ncd"
        let mut lines = LineIndex::new(vec![3, 2]);
        lines.insert(1, 1, &[4]);
        assert_eq!(lines.lengths(), &[3, 6]);
    }

    #[test]
    fn insert_with_newlines() {
        // "ab\ncd" -> "ab\ncX\nY\nZd"
        let mut lines = LineIndex::new(vec![3, 2]);
        lines.insert(1, 1, &[2, 2, 1]);
        assert_eq!(lines.lengths(), &[3, 3, 2, 2]);
        assert_eq!(lines.lengths().iter().sum::<usize>(), 10);
    }

    #[test]
    fn remove_across_lines() {
        // "ab\ncd\nef" -> remove "b\ncd\ne" -> "af"
        let mut lines = LineIndex::new(vec![3, 3, 2]);
        lines.remove((0, 1), (2, 1));
        assert_eq!(lines.lengths(), &[2]);

        // "ab\ncd" -> remove "b" -> "a\ncd"
        let mut lines = LineIndex::new(vec![3, 2]);
        lines.remove((0, 1), (0, 2));
        assert_eq!(lines.lengths(), &[2, 2]);
    }
}
