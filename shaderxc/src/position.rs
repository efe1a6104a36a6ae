//! Source positions and areas shared by every pipeline stage.
use std::cmp::Ordering;

/// Identifies a loaded source buffer (the root shader or an included file).
pub type FileId = u32;

/// A single point in a source buffer: `(file, line, column)`, all zero-based.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    pub fn start_of(file: FileId) -> Self {
        Self { file, line: 0, column: 0 }
    }
}

impl Ord for SourcePosition {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.file, self.line, self.column).cmp(&(other.file, other.line, other.column))
    }
}

impl PartialOrd for SourcePosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A contiguous run of source starting at `start` and spanning `length` bytes
/// on that same line. Multi-line areas only need the start for diagnostics,
/// so `length` is a byte count within the starting line, not a second position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceArea {
    pub start: SourcePosition,
    pub length: u32,
}

impl SourceArea {
    pub fn new(start: SourcePosition, length: u32) -> Self {
        Self { start, length }
    }

    pub fn zero(file: FileId) -> Self {
        Self { start: SourcePosition::start_of(file), length: 0 }
    }

    /// Smallest area enclosing both `self` and `other`. Both must share a file;
    /// the caller (always within one source buffer during parsing) guarantees this.
    pub fn join(self, other: SourceArea) -> SourceArea {
        debug_assert_eq!(self.start.file, other.start.file, "cannot join areas from different files");
        let start = std::cmp::min(self.start, other.start);
        let end_col = |a: SourceArea| a.start.column + a.length;
        let self_end = (self.start.line, end_col(self));
        let other_end = (other.start.line, end_col(other));
        let (end_line, end_column) = std::cmp::max(self_end, other_end);
        let length = if end_line == start.line { end_column.saturating_sub(start.column) } else { self.length.max(other.length) };
        SourceArea { start, length }
    }
}
