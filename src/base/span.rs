//! Line/column conversion for byte offsets
//!
//! Diagnostics are rendered as `file:line:col`, so every error range needs
//! a cheap offset → line/column mapping over the single input header.

use text_size::TextSize;

/// A line/column pair (0-indexed; display code adds 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Maps byte offsets to line/column pairs
///
/// Built once per input file from the newline positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line; index 0 is always 0.
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::new(i as u32 + 1));
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 0-indexed line/column pair.
    ///
    /// Offsets past the end of the text map to the last line.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = u32::from(offset) - u32::from(self.line_starts[line]);
        LineCol {
            line: line as u32,
            col,
        }
    }

    /// 0-indexed line containing the given offset.
    pub fn line(&self, offset: TextSize) -> u32 {
        self.line_col(offset).line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_line_zero() {
        let index = LineIndex::new("");
        assert_eq!(index.line_col(TextSize::new(0)), LineCol { line: 0, col: 0 });
    }

    #[test]
    fn offsets_map_to_lines_and_columns() {
        let index = LineIndex::new("abc\ndef\n\nghi");
        assert_eq!(index.line_col(TextSize::new(0)), LineCol { line: 0, col: 0 });
        assert_eq!(index.line_col(TextSize::new(2)), LineCol { line: 0, col: 2 });
        assert_eq!(index.line_col(TextSize::new(4)), LineCol { line: 1, col: 0 });
        assert_eq!(index.line_col(TextSize::new(8)), LineCol { line: 2, col: 0 });
        assert_eq!(index.line_col(TextSize::new(9)), LineCol { line: 3, col: 0 });
        assert_eq!(index.line_col(TextSize::new(11)), LineCol { line: 3, col: 2 });
    }

    #[test]
    fn newline_belongs_to_the_line_it_ends() {
        let index = LineIndex::new("a\nb");
        assert_eq!(index.line_col(TextSize::new(1)), LineCol { line: 0, col: 1 });
        assert_eq!(index.line_col(TextSize::new(2)), LineCol { line: 1, col: 0 });
    }
}
