//! Source location tracking.
//!
//! Offsets are byte offsets into the UTF-8 input, so `&input[start..end]`
//! always recovers the text of a token or node. Columns count UTF-16 code
//! units from the start of the line, as ESTree consumers expect.

use serde::Serialize;

use crate::whitespace::next_line_break;

/// A line/column pair. Lines are 1-based, columns are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// A position on the same line, `n` columns further right.
    #[inline]
    pub const fn offset(self, n: u32) -> Self {
        Self { line: self.line, column: self.column + n }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start and end positions of a node or comment, plus the source name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SourceLocation {
    pub fn new(start: Position, end: Position, source: Option<String>) -> Self {
        Self { start, end, source }
    }
}

/// A half-open byte range in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Number of UTF-16 code units in `text`.
#[inline]
pub(crate) fn utf16_len(text: &str) -> u32 {
    if text.is_ascii() {
        text.len() as u32
    } else {
        text.encode_utf16().count() as u32
    }
}

/// Largest char boundary at or before `offset`.
pub(crate) fn floor_char_boundary(input: &str, offset: usize) -> usize {
    let mut offset = offset.min(input.len());
    while !input.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Byte offsets of line starts, for turning offsets into positions.
///
/// Every ECMAScript line terminator starts a new line; `\r\n` counts once.
#[derive(Debug)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        let mut cur = 0;
        while let Some((_, next)) = next_line_break(source, cur, source.len()) {
            line_starts.push(next);
            cur = next;
        }
        Self { source, line_starts }
    }

    /// Convert a byte offset into a 1-based line and 0-based column.
    pub fn position(&self, offset: usize) -> Position {
        let offset = floor_char_boundary(self.source, offset);
        let line = self.line_of(offset);
        let start = self.line_starts[line];
        Position::new(line as u32 + 1, utf16_len(&self.source[start..offset]))
    }

    /// Byte offset where the line containing `offset` begins.
    pub fn line_start(&self, offset: usize) -> usize {
        self.line_starts[self.line_of(offset)]
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i.saturating_sub(1))
    }
}

/// Line number and line start offset of `offset`, scanning from the start.
pub(crate) fn locate(input: &str, offset: usize) -> (u32, usize) {
    let mut line = 1;
    let mut cur = 0;
    while let Some((_, next)) = next_line_break(input, cur, offset) {
        line += 1;
        cur = next;
    }
    (line, cur)
}

/// Position of `offset` in `input`, scanning from the start.
pub fn line_info(input: &str, offset: usize) -> Position {
    let offset = floor_char_boundary(input, offset);
    let (line, start) = locate(input, offset);
    Position::new(line, utf16_len(&input[start.min(offset)..offset]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_offset() {
        let p = Position::new(3, 4);
        assert_eq!(p.offset(2), Position::new(3, 6));
    }

    #[test]
    fn test_line_index() {
        let source = "line1\nline2\r\nline3\u{2028}x";
        let index = LineIndex::new(source);

        assert_eq!(index.position(0), Position::new(1, 0));
        assert_eq!(index.position(5), Position::new(1, 5));
        assert_eq!(index.position(6), Position::new(2, 0));
        assert_eq!(index.position(13), Position::new(3, 0));
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_line_info_matches_index() {
        let source = "a\r\nbb\rccc\n\nd";
        let index = LineIndex::new(source);
        for offset in 0..=source.len() {
            let mid_crlf = offset > 0 && &source[offset - 1..=offset.min(source.len() - 1)] == "\r\n";
            if !mid_crlf {
                assert_eq!(line_info(source, offset), index.position(offset), "offset {offset}");
            }
        }
    }

    #[test]
    fn test_columns_count_utf16_units() {
        let source = "'é😀'; x\nü = 1";
        let index = LineIndex::new(source);
        let x = source.find('x').unwrap();
        assert_eq!(index.position(x), Position::new(1, 7));
        assert_eq!(line_info(source, x), Position::new(1, 7));
        let eq = source.find('=').unwrap();
        assert_eq!(line_info(source, eq), Position::new(2, 2));
        assert_eq!(index.line_start(eq), x + 2);
    }

    #[test]
    fn test_offsets_inside_a_char_round_down() {
        let source = "é+1";
        assert_eq!(floor_char_boundary(source, 1), 0);
        assert_eq!(line_info(source, 1), Position::new(1, 0));
        assert_eq!(LineIndex::new(source).position(1), Position::new(1, 0));
    }
}
