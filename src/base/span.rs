//! Source text positions.

use std::fmt;

use super::FileId;

// Re-export from text-size for compatibility
pub use text_size::TextRange;
pub use text_size::TextSize;

/// A line and column position in source text.
///
/// Both line and column are 0-indexed internally, but displayed as 1-indexed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct LineCol {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column (in UTF-8 bytes, not characters)
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Get 1-indexed line number (for display).
    #[inline]
    pub const fn line_one_indexed(self) -> u32 {
        self.line + 1
    }

    /// Get 1-indexed column number (for display).
    #[inline]
    pub const fn col_one_indexed(self) -> u32 {
        self.col + 1
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.col_one_indexed())
    }
}

/// Index for converting byte offsets produced by the lexer into
/// line/column positions.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];

        for (offset, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }

        Self { line_starts }
    }

    /// Convert a byte offset to a line/column position.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        let line_start = self.line_starts[line];
        let col = offset - line_start;

        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }
}

/// A place in the source where a name occurs.
///
/// Lines and columns are 1-based. The derived ordering is
/// (file, line, column), which is the order references are kept in.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub struct Occurrence {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl Occurrence {
    #[inline]
    pub const fn new(file: FileId, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    /// Build an occurrence from a 0-indexed [`LineCol`].
    #[inline]
    pub const fn from_line_col(file: FileId, pos: LineCol) -> Self {
        Self {
            file,
            line: pos.line_one_indexed(),
            column: pos.col_one_indexed(),
        }
    }
}

impl fmt::Debug for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}:{}", self.file, self.line, self.column)
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_multi_line() {
        let index = LineIndex::new("class A\n{\n}");

        assert_eq!(index.line_col(TextSize::from(0)), LineCol::new(0, 0));
        assert_eq!(index.line_col(TextSize::from(6)), LineCol::new(0, 6));
        assert_eq!(index.line_col(TextSize::from(8)), LineCol::new(1, 0));
        assert_eq!(index.line_col(TextSize::from(10)), LineCol::new(2, 0));
    }

    #[test]
    fn test_occurrence_from_line_col_is_one_based() {
        let occ = Occurrence::from_line_col(FileId::new(0), LineCol::new(0, 4));
        assert_eq!(occ.line, 1);
        assert_eq!(occ.column, 5);
    }

    #[test]
    fn test_occurrence_orders_by_file_then_position() {
        let a = Occurrence::new(FileId::new(0), 9, 1);
        let b = Occurrence::new(FileId::new(1), 1, 1);
        let c = Occurrence::new(FileId::new(1), 1, 7);
        let d = Occurrence::new(FileId::new(1), 2, 1);

        let mut all = vec![d, c, b, a];
        all.sort();
        assert_eq!(all, vec![a, b, c, d]);
    }
}
