//! Whitespace and line terminator classification.

/// ECMAScript *LineTerminator*: LF, CR, LINE SEPARATOR, PARAGRAPH SEPARATOR.
#[inline]
pub fn is_new_line(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Whitespace that is not a line terminator.
#[inline]
pub fn is_white_space(c: char) -> bool {
    matches!(
        c,
        '\t' | '\x0B' | '\x0C' | ' ' | '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}'
            | '\u{202F}' | '\u{205F}' | '\u{3000}' | '\u{FEFF}'
    )
}

/// Find the first line terminator starting in `from..end`.
///
/// Returns the terminator's start offset and the offset just past it;
/// a `\r\n` pair is consumed as a single break.
pub fn next_line_break(input: &str, from: usize, end: usize) -> Option<(usize, usize)> {
    let end = end.min(input.len());
    if from >= end {
        return None;
    }
    for (i, c) in input[from..end].char_indices() {
        let at = from + i;
        match c {
            '\n' | '\u{2028}' | '\u{2029}' => return Some((at, at + c.len_utf8())),
            '\r' => {
                let next = if input[at + 1..].starts_with('\n') { at + 2 } else { at + 1 };
                return Some((at, next));
            }
            _ => {}
        }
    }
    None
}

/// Whether the text contains any line terminator.
#[inline]
pub fn has_line_break(text: &str) -> bool {
    text.chars().any(is_new_line)
}

/// Result of [`skip_white_space`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skipped {
    /// Offset of the first significant character.
    pub end: usize,
    /// Whether a line terminator was crossed, including inside comments.
    pub line_break: bool,
}

/// Skip whitespace, line terminators, `//` and `/* */` comments from `pos`.
///
/// An unterminated block comment is left in place.
pub fn skip_white_space(input: &str, mut pos: usize) -> Skipped {
    let mut line_break = false;
    while let Some(c) = input[pos..].chars().next() {
        if is_new_line(c) {
            line_break = true;
            pos += c.len_utf8();
        } else if is_white_space(c) {
            pos += c.len_utf8();
        } else if input[pos..].starts_with("//") {
            let rest = &input[pos..];
            pos += rest.find(is_new_line).unwrap_or(rest.len());
        } else if input[pos..].starts_with("/*") {
            match input[pos + 2..].find("*/") {
                Some(close) => {
                    line_break |= has_line_break(&input[pos + 2..pos + 2 + close]);
                    pos += close + 4;
                }
                None => break,
            }
        } else {
            break;
        }
    }
    Skipped { end: pos, line_break }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_terminators() {
        assert!(is_new_line('\u{2028}'));
        assert!(is_new_line('\r'));
        assert!(!is_new_line('\t'));
        assert!(is_white_space('\u{FEFF}'));
    }

    #[test]
    fn test_next_line_break_crlf() {
        assert_eq!(next_line_break("ab\r\ncd", 0, 6), Some((2, 4)));
        assert_eq!(next_line_break("ab\rcd", 0, 5), Some((2, 3)));
        assert_eq!(next_line_break("abcd", 0, 4), None);
        assert_eq!(next_line_break("a\nb", 2, 3), None);
    }

    #[test]
    fn test_skip_white_space_comments() {
        let src = "  /* c */ // line\n  'x'";
        let skipped = skip_white_space(src, 0);
        assert_eq!(&src[skipped.end..], "'x'");
        assert!(skipped.line_break);

        let skipped = skip_white_space("/* a */ b", 0);
        assert_eq!(skipped.end, 8);
        assert!(!skipped.line_break);
    }

    #[test]
    fn test_skip_stops_at_unterminated_comment() {
        assert_eq!(skip_white_space(" /* open", 0).end, 1);
    }
}
