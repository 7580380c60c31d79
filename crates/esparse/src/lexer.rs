//! Scanner.
//!
//! The scanner is a set of methods on [`Parser`]. It reads one token at a
//! time starting at `state.pos`, and the token context stack decides how
//! ambiguous characters are read: `/` as regex or division, `}` as block end
//! or template continuation.

use crate::context::{update_context, ContextInput, ContextOverride, TokenContext};
use crate::error::{Error, Result};
use crate::options::{Comment, CommentKind};
use crate::parser::Parser;
use crate::regexp::RegExpValidationState;
use crate::span::{utf16_len, Position, SourceLocation};
use crate::token::{is_keyword, keyword_from_str, RegexValue, Token, TokenType, TokenValue};
use crate::unicode::{
    code_point_to_string, combine_surrogates, full_char_at, is_identifier_char,
    is_identifier_start, is_lead_surrogate, is_trail_surrogate,
};
use crate::whitespace::{has_line_break, is_new_line, is_white_space, next_line_break};

/// Failure inside an escape sequence.
///
/// From ES2018 on, a bad escape inside a template does not stop scanning:
/// the template chunk is rescanned as an `InvalidTemplate` token and the
/// parser decides whether that is allowed.
enum EscapeError {
    Fatal(Error),
    InvalidTemplate { pos: usize, message: &'static str },
}

impl From<Error> for EscapeError {
    fn from(err: Error) -> Self {
        EscapeError::Fatal(err)
    }
}

type EscapeResult<T> = std::result::Result<T, EscapeError>;

impl<'a> Parser<'a> {
    // =========================================================================
    // Token Handling
    // =========================================================================

    /// Report the current token and move to the next one.
    pub(crate) fn next(&mut self) -> Result<()> {
        if self.wants_tokens() {
            let token = self.current_token();
            self.emit_token(token);
        }
        self.state.last_tok_start = self.state.start;
        self.state.last_tok_end = self.state.end;
        self.state.last_tok_start_loc = self.state.start_loc;
        self.state.last_tok_end_loc = self.state.end_loc;
        self.next_token()
    }

    /// The current token as a standalone value.
    pub(crate) fn current_token(&self) -> Token {
        let state = &self.state;
        Token {
            ty: state.ty,
            value: state.value.clone(),
            start: state.start,
            end: state.end,
            loc: self
                .options
                .locations
                .then(|| SourceLocation::new(state.start_loc, state.end_loc, self.source_file.clone())),
            range: self.options.ranges.then_some((state.start, state.end)),
        }
    }

    #[inline]
    pub(crate) fn cur_context(&self) -> TokenContext {
        self.state.context.last().copied().unwrap_or(TokenContext::B_STAT)
    }

    #[inline]
    pub(crate) fn cur_position(&self) -> Position {
        Position::new(self.state.line, self.column_at(self.state.pos))
    }

    /// UTF-16 column of `pos` on the current line, counted from the last
    /// anchor when it lies on this line.
    fn column_at(&self, pos: usize) -> u32 {
        let (anchor, column) = self.state.column_anchor;
        if anchor >= self.state.line_start && anchor <= pos {
            column + utf16_len(&self.input[anchor..pos])
        } else {
            utf16_len(&self.input[self.state.line_start..pos])
        }
    }

    /// Read the token starting at the cursor.
    pub(crate) fn next_token(&mut self) -> Result<()> {
        let ctx = self.cur_context();
        if !ctx.preserve_space {
            self.skip_space()?;
        }
        self.state.start = self.state.pos;
        self.state.start_loc = self.cur_position();
        self.state.column_anchor = (self.state.start, self.state.start_loc.column);
        if self.state.pos >= self.input.len() {
            return self.finish_token(TokenType::Eof, TokenValue::None);
        }
        if ctx.override_ == Some(ContextOverride::ReadTemplate) {
            return self.read_template_token();
        }
        self.read_token()
    }

    fn finish_token(&mut self, ty: TokenType, value: TokenValue) -> Result<()> {
        self.state.end = self.state.pos;
        self.state.end_loc = self.cur_position();
        self.state.column_anchor = (self.state.end, self.state.end_loc.column);
        let prev = self.state.ty;
        self.state.ty = ty;
        self.state.value = value;

        let line_break_before = has_line_break(&self.input[self.state.last_tok_end..self.state.start]);
        let input = ContextInput {
            ecma_version: self.ecma,
            expr_allowed: self.state.expr_allowed,
            value: &self.state.value,
            line_break_before,
        };
        self.state.expr_allowed = update_context(&mut self.state.context, prev, ty, &input);
        Ok(())
    }

    #[inline]
    fn char_at(&self, pos: usize) -> Option<char> {
        full_char_at(self.input, pos)
    }

    /// Byte at `pos`, or 0 past the end.
    #[inline]
    fn byte_at(&self, pos: usize) -> u8 {
        self.input.as_bytes().get(pos).copied().unwrap_or(0)
    }

    fn new_line_at(&mut self, line_start: usize) {
        self.state.line += 1;
        self.state.line_start = line_start;
        self.state.column_anchor = (line_start, 0);
    }

    // =========================================================================
    // Whitespace and Comments
    // =========================================================================

    fn skip_space(&mut self) -> Result<()> {
        while self.state.pos < self.input.len() {
            let pos = self.state.pos;
            match self.byte_at(pos) {
                b' ' | b'\t' | 0x0B | 0x0C => self.state.pos += 1,
                b'\r' => {
                    self.state.pos += if self.byte_at(pos + 1) == b'\n' { 2 } else { 1 };
                    self.new_line_at(self.state.pos);
                }
                b'\n' => {
                    self.state.pos += 1;
                    self.new_line_at(self.state.pos);
                }
                b'/' => match self.byte_at(pos + 1) {
                    b'*' => self.skip_block_comment()?,
                    b'/' => self.skip_line_comment(2),
                    _ => break,
                },
                b if b < 0x80 => break,
                _ => {
                    let Some(c) = self.char_at(pos) else { break };
                    if is_new_line(c) {
                        self.state.pos += c.len_utf8();
                        self.new_line_at(self.state.pos);
                    } else if is_white_space(c) {
                        self.state.pos += c.len_utf8();
                    } else {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.state.pos;
        let start_loc = self.cur_position();
        let Some(close) = self.input[start + 2..].find("*/") else {
            return self.raise(start, "Unterminated comment");
        };
        let end = start + 2 + close;
        self.state.pos = end + 2;

        let mut cur = start + 2;
        while let Some((_, next)) = next_line_break(self.input, cur, end) {
            self.new_line_at(next);
            cur = next;
        }

        if self.wants_comments() {
            self.push_comment(CommentKind::Block, start + 2, end, start, start_loc);
        }
        Ok(())
    }

    /// Skip to the end of the line; `skip` is the length of the opening
    /// delimiter (`//` or `#!`).
    pub(crate) fn skip_line_comment(&mut self, skip: usize) {
        let start = self.state.pos;
        let start_loc = self.cur_position();
        let rest = &self.input[start + skip..];
        let len = rest.find(is_new_line).unwrap_or(rest.len());
        self.state.pos = start + skip + len;

        if self.wants_comments() {
            self.push_comment(CommentKind::Line, start + skip, self.state.pos, start, start_loc);
        }
    }

    fn push_comment(
        &mut self,
        kind: CommentKind,
        text_start: usize,
        text_end: usize,
        start: usize,
        start_loc: Position,
    ) {
        let end = self.state.pos;
        let comment = Comment {
            kind,
            value: self.input[text_start..text_end].to_string(),
            start,
            end,
            loc: self
                .options
                .locations
                .then(|| SourceLocation::new(start_loc, self.cur_position(), self.source_file.clone())),
            range: self.options.ranges.then_some((start, end)),
        };
        self.emit_comment(comment);
    }

    // =========================================================================
    // Punctuation and Operators
    // =========================================================================

    fn read_token(&mut self) -> Result<()> {
        let Some(c) = self.char_at(self.state.pos) else {
            return self.finish_token(TokenType::Eof, TokenValue::None);
        };
        if c == '\\' || is_identifier_start(c as u32, self.ecma >= 6) {
            return self.read_word();
        }
        self.read_token_from_char(c)
    }

    fn read_token_from_char(&mut self, c: char) -> Result<()> {
        let pos = self.state.pos;
        match c {
            '.' => self.read_token_dot(),

            '(' => self.finish_punct(TokenType::ParenL),
            ')' => self.finish_punct(TokenType::ParenR),
            ';' => self.finish_punct(TokenType::Semi),
            ',' => self.finish_punct(TokenType::Comma),
            '[' => self.finish_punct(TokenType::BracketL),
            ']' => self.finish_punct(TokenType::BracketR),
            '{' => self.finish_punct(TokenType::BraceL),
            '}' => self.finish_punct(TokenType::BraceR),
            ':' => self.finish_punct(TokenType::Colon),
            '?' => self.read_token_question(),
            '`' if self.ecma >= 6 => self.finish_punct(TokenType::BackQuote),

            '0' => match self.byte_at(pos + 1) {
                b'x' | b'X' => self.read_radix_number(16),
                b'o' | b'O' if self.ecma >= 6 => self.read_radix_number(8),
                b'b' | b'B' if self.ecma >= 6 => self.read_radix_number(2),
                _ => self.read_number(false),
            },
            '1'..='9' => self.read_number(false),

            '"' | '\'' => self.read_string(c),

            '/' => self.read_token_slash(),
            '%' | '*' => self.read_token_mult_modulo_exp(c),
            '|' | '&' => self.read_token_pipe_amp(c),
            '^' => self.read_token_caret(),
            '+' | '-' => self.read_token_plus_min(c),
            '<' | '>' => self.read_token_lt_gt(c),
            '=' | '!' => self.read_token_eq_excl(c),
            '~' => self.finish_op(TokenType::Prefix, 1),

            '#' => self.unsupported(pos, "private name"),
            '@' => self.unsupported(pos, "decorator"),

            _ => self.raise(pos, format!("Unexpected character '{c}'")),
        }
    }

    fn finish_punct(&mut self, ty: TokenType) -> Result<()> {
        self.state.pos += 1;
        self.finish_token(ty, TokenValue::None)
    }

    fn finish_op(&mut self, ty: TokenType, size: usize) -> Result<()> {
        let start = self.state.pos;
        self.state.pos += size;
        let text = self.input[start..self.state.pos].to_string();
        self.finish_token(ty, TokenValue::Str(text))
    }

    fn read_token_dot(&mut self) -> Result<()> {
        let pos = self.state.pos;
        let next = self.byte_at(pos + 1);
        if next.is_ascii_digit() {
            return self.read_number(true);
        }
        if self.ecma >= 6 && next == b'.' && self.byte_at(pos + 2) == b'.' {
            self.state.pos += 3;
            return self.finish_token(TokenType::Ellipsis, TokenValue::None);
        }
        self.finish_punct(TokenType::Dot)
    }

    fn read_token_question(&mut self) -> Result<()> {
        let pos = self.state.pos;
        if self.ecma >= 11 {
            match self.byte_at(pos + 1) {
                b'.' if !self.byte_at(pos + 2).is_ascii_digit() => {
                    return self.unsupported(pos, "optional chaining");
                }
                b'?' => return self.finish_op(TokenType::Coalesce, 2),
                _ => {}
            }
        }
        self.finish_punct(TokenType::Question)
    }

    fn read_token_slash(&mut self) -> Result<()> {
        if self.state.expr_allowed {
            self.state.pos += 1;
            return self.read_regexp();
        }
        if self.byte_at(self.state.pos + 1) == b'=' {
            return self.finish_op(TokenType::Assign, 2);
        }
        self.finish_op(TokenType::Slash, 1)
    }

    fn read_token_mult_modulo_exp(&mut self, c: char) -> Result<()> {
        let pos = self.state.pos;
        let mut next = self.byte_at(pos + 1);
        let mut size = 1;
        let mut ty = if c == '*' { TokenType::Star } else { TokenType::Modulo };
        if self.ecma >= 7 && c == '*' && next == b'*' {
            size = 2;
            ty = TokenType::StarStar;
            next = self.byte_at(pos + 2);
        }
        if next == b'=' {
            return self.finish_op(TokenType::Assign, size + 1);
        }
        self.finish_op(ty, size)
    }

    fn read_token_pipe_amp(&mut self, c: char) -> Result<()> {
        let next = self.byte_at(self.state.pos + 1);
        let pipe = c == '|';
        if next == c as u8 {
            return self.finish_op(if pipe { TokenType::LogicalOr } else { TokenType::LogicalAnd }, 2);
        }
        if next == b'=' {
            return self.finish_op(TokenType::Assign, 2);
        }
        self.finish_op(if pipe { TokenType::BitwiseOr } else { TokenType::BitwiseAnd }, 1)
    }

    fn read_token_caret(&mut self) -> Result<()> {
        if self.byte_at(self.state.pos + 1) == b'=' {
            return self.finish_op(TokenType::Assign, 2);
        }
        self.finish_op(TokenType::BitwiseXor, 1)
    }

    fn read_token_plus_min(&mut self, c: char) -> Result<()> {
        let next = self.byte_at(self.state.pos + 1);
        if next == c as u8 {
            return self.finish_op(TokenType::IncDec, 2);
        }
        if next == b'=' {
            return self.finish_op(TokenType::Assign, 2);
        }
        self.finish_op(TokenType::PlusMin, 1)
    }

    fn read_token_lt_gt(&mut self, c: char) -> Result<()> {
        let pos = self.state.pos;
        let next = self.byte_at(pos + 1);
        if next == c as u8 {
            let size = if c == '>' && self.byte_at(pos + 2) == b'>' { 3 } else { 2 };
            if self.byte_at(pos + size) == b'=' {
                return self.finish_op(TokenType::Assign, size + 1);
            }
            return self.finish_op(TokenType::BitShift, size);
        }
        let size = if next == b'=' { 2 } else { 1 };
        self.finish_op(TokenType::Relational, size)
    }

    fn read_token_eq_excl(&mut self, c: char) -> Result<()> {
        let pos = self.state.pos;
        let next = self.byte_at(pos + 1);
        if next == b'=' {
            let size = if self.byte_at(pos + 2) == b'=' { 3 } else { 2 };
            return self.finish_op(TokenType::Equality, size);
        }
        if c == '=' && next == b'>' && self.ecma >= 6 {
            self.state.pos += 2;
            return self.finish_token(TokenType::Arrow, TokenValue::None);
        }
        self.finish_op(if c == '=' { TokenType::Eq } else { TokenType::Prefix }, 1)
    }

    // =========================================================================
    // Numbers
    // =========================================================================

    /// Read digits in `radix`. With `len`, exactly that many digits must be
    /// present.
    fn read_int(&mut self, radix: u32, len: Option<usize>) -> Option<f64> {
        let start = self.state.pos;
        let limit = len.unwrap_or(usize::MAX);
        let mut total = 0f64;
        let mut count = 0;
        while count < limit {
            let Some(digit) = (self.byte_at(self.state.pos) as char).to_digit(36) else {
                break;
            };
            if digit >= radix {
                break;
            }
            self.state.pos += 1;
            total = total * f64::from(radix) + f64::from(digit);
            count += 1;
        }
        if self.state.pos == start || len.is_some_and(|len| self.state.pos - start != len) {
            return None;
        }
        Some(total)
    }

    fn read_radix_number(&mut self, radix: u32) -> Result<()> {
        let start = self.state.pos;
        self.state.pos += 2;
        let Some(value) = self.read_int(radix, None) else {
            return self.raise(self.state.start + 2, format!("Expected number in radix {radix}"));
        };
        if self.ecma >= 11 && self.byte_at(self.state.pos) == b'n' {
            let digits = self.input[start..self.state.pos].to_string();
            self.state.pos += 1;
            self.check_after_number()?;
            return self.finish_token(TokenType::BigInt, TokenValue::BigInt(digits));
        }
        self.check_after_number()?;
        self.finish_token(TokenType::Num, TokenValue::Num(value))
    }

    fn read_number(&mut self, starts_with_dot: bool) -> Result<()> {
        let start = self.state.pos;
        if !starts_with_dot && self.read_int(10, None).is_none() {
            return self.raise(start, "Invalid number");
        }
        let mut octal = self.state.pos - start >= 2 && self.byte_at(start) == b'0';
        if octal && self.strict {
            self.raise_recoverable(start, "Octal literal in strict mode");
        }
        let mut next = self.byte_at(self.state.pos);
        if !octal && !starts_with_dot && self.ecma >= 11 && next == b'n' {
            let digits = self.input[start..self.state.pos].to_string();
            self.state.pos += 1;
            self.check_after_number()?;
            return self.finish_token(TokenType::BigInt, TokenValue::BigInt(digits));
        }
        if octal && self.input[start..self.state.pos].contains(['8', '9']) {
            octal = false;
        }
        if next == b'.' && !octal {
            self.state.pos += 1;
            let _ = self.read_int(10, None);
            next = self.byte_at(self.state.pos);
        }
        if matches!(next, b'e' | b'E') && !octal {
            self.state.pos += 1;
            if matches!(self.byte_at(self.state.pos), b'+' | b'-') {
                self.state.pos += 1;
            }
            if self.read_int(10, None).is_none() {
                return self.raise(start, "Invalid number");
            }
        }
        self.check_after_number()?;

        let text = &self.input[start..self.state.pos];
        let value = if octal {
            text.bytes().fold(0f64, |acc, b| acc * 8.0 + f64::from(b - b'0'))
        } else {
            match text.parse::<f64>() {
                Ok(value) => value,
                Err(_) => return self.raise(start, "Invalid number"),
            }
        };
        self.finish_token(TokenType::Num, TokenValue::Num(value))
    }

    fn check_after_number(&self) -> Result<()> {
        match self.char_at(self.state.pos) {
            Some(c) if is_identifier_start(c as u32, true) => {
                self.raise(self.state.pos, "Identifier directly after number")
            }
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Strings and Escapes
    // =========================================================================

    fn read_string(&mut self, quote: char) -> Result<()> {
        let mut out = String::new();
        self.state.pos += 1;
        let mut chunk_start = self.state.pos;
        loop {
            let Some(c) = self.char_at(self.state.pos) else {
                return self.raise(self.state.start, "Unterminated string constant");
            };
            if c == quote {
                break;
            }
            if c == '\\' {
                out.push_str(&self.input[chunk_start..self.state.pos]);
                if let Err(err) = self.read_escaped_char(false, &mut out) {
                    return Err(self.escape_error(err));
                }
                chunk_start = self.state.pos;
            } else if c == '\u{2028}' || c == '\u{2029}' {
                if self.ecma < 10 {
                    return self.raise(self.state.start, "Unterminated string constant");
                }
                self.state.pos += c.len_utf8();
                self.new_line_at(self.state.pos);
            } else {
                if is_new_line(c) {
                    return self.raise(self.state.start, "Unterminated string constant");
                }
                self.state.pos += c.len_utf8();
            }
        }
        out.push_str(&self.input[chunk_start..self.state.pos]);
        self.state.pos += 1;
        self.finish_token(TokenType::String, TokenValue::Str(out))
    }

    fn escape_error(&self, err: EscapeError) -> Error {
        match err {
            EscapeError::Fatal(err) => err,
            EscapeError::InvalidTemplate { pos, message } => Error::Syntax(self.syntax_error(pos, message)),
        }
    }

    fn invalid_string_token<T>(&self, pos: usize, message: &'static str) -> EscapeResult<T> {
        if self.in_template_element && self.ecma >= 9 {
            Err(EscapeError::InvalidTemplate { pos, message })
        } else {
            Err(EscapeError::Fatal(Error::Syntax(self.syntax_error(pos, message))))
        }
    }

    /// Read the escape sequence at the cursor (which is on the backslash)
    /// and append its value to `out`.
    fn read_escaped_char(&mut self, in_template: bool, out: &mut String) -> EscapeResult<()> {
        self.state.pos += 1;
        let Some(c) = self.char_at(self.state.pos) else {
            return Ok(());
        };
        self.state.pos += c.len_utf8();
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'v' => out.push('\u{B}'),
            'f' => out.push('\u{C}'),
            'x' => {
                let code = self.read_hex_char(2)?;
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'u' => {
                let code = self.read_code_point()?;
                self.push_code_point(code, out);
            }
            '\r' => {
                if self.byte_at(self.state.pos) == b'\n' {
                    self.state.pos += 1;
                }
                self.new_line_at(self.state.pos);
            }
            '\n' | '\u{2028}' | '\u{2029}' => self.new_line_at(self.state.pos),
            '8' | '9' if in_template => {
                return self.invalid_string_token(self.state.pos - 1, "Invalid escape sequence in template string");
            }
            '0'..='7' => {
                let digits = &self.input[self.state.pos - 1..];
                let mut len = digits.bytes().take(3).take_while(|b| (b'0'..=b'7').contains(b)).count();
                let parse = |s: &str| s.bytes().fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                let mut value = parse(&digits[..len]);
                if value > 255 {
                    len -= 1;
                    value = parse(&digits[..len]);
                }
                let is_zero = &digits[..len] == "0";
                self.state.pos += len - 1;
                let next = self.byte_at(self.state.pos);
                if !is_zero || next == b'8' || next == b'9' {
                    let at = self.state.pos - 1 - len;
                    if in_template {
                        return self.invalid_string_token(at, "Octal literal in template string");
                    }
                    if self.strict {
                        self.raise_recoverable(at, "Octal literal in strict mode");
                    }
                }
                out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            other => out.push(other),
        }
        Ok(())
    }

    /// Append a code point, pairing a lead surrogate with a following
    /// `\uXXXX` trail surrogate.
    fn push_code_point(&mut self, code: u32, out: &mut String) {
        if is_lead_surrogate(code) && self.input[self.state.pos..].starts_with("\\u") {
            let trail = self
                .input
                .get(self.state.pos + 2..self.state.pos + 6)
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .filter(|&trail| is_trail_surrogate(trail));
            if let Some(combined) = trail.and_then(|trail| combine_surrogates(code, trail)) {
                self.state.pos += 6;
                out.push_str(&code_point_to_string(combined));
                return;
            }
        }
        out.push_str(&code_point_to_string(code));
    }

    fn read_hex_char(&mut self, len: usize) -> EscapeResult<u32> {
        let code_pos = self.state.pos;
        match self.read_int(16, Some(len)) {
            Some(value) => Ok(value as u32),
            None => self.invalid_string_token(code_pos, "Bad character escape sequence"),
        }
    }

    /// Read `XXXX` or `{X...}` after `\u`.
    fn read_code_point(&mut self) -> EscapeResult<u32> {
        if self.byte_at(self.state.pos) != b'{' {
            return self.read_hex_char(4);
        }
        if self.ecma < 6 {
            return self.unexpected().map_err(EscapeError::Fatal);
        }
        self.state.pos += 1;
        let code_pos = self.state.pos;
        let len = self.input[code_pos..].find('}').unwrap_or(0);
        let code = self.read_hex_char(len)?;
        self.state.pos += 1;
        if code > 0x10FFFF {
            return self.invalid_string_token(code_pos, "Code point out of bounds");
        }
        Ok(code)
    }

    // =========================================================================
    // Templates
    // =========================================================================

    fn read_template_token(&mut self) -> Result<()> {
        let (line, line_start, anchor) = (self.state.line, self.state.line_start, self.state.column_anchor);
        self.in_template_element = true;
        let result = self.read_tmpl_token();
        self.in_template_element = false;
        match result {
            Ok(()) => Ok(()),
            Err(EscapeError::Fatal(err)) => Err(err),
            Err(EscapeError::InvalidTemplate { .. }) => {
                self.state.line = line;
                self.state.line_start = line_start;
                self.state.column_anchor = anchor;
                self.read_invalid_template_token()
            }
        }
    }

    fn read_tmpl_token(&mut self) -> EscapeResult<()> {
        let mut out = String::new();
        let mut chunk_start = self.state.pos;
        loop {
            let pos = self.state.pos;
            let Some(c) = self.char_at(pos) else {
                return self.raise(self.state.start, "Unterminated template").map_err(EscapeError::Fatal);
            };
            if c == '`' || (c == '$' && self.byte_at(pos + 1) == b'{') {
                let continues = matches!(self.state.ty, TokenType::Template | TokenType::InvalidTemplate);
                if pos == self.state.start && continues {
                    let result = if c == '$' {
                        self.state.pos += 2;
                        self.finish_token(TokenType::DollarBraceL, TokenValue::None)
                    } else {
                        self.state.pos += 1;
                        self.finish_token(TokenType::BackQuote, TokenValue::None)
                    };
                    return result.map_err(EscapeError::Fatal);
                }
                out.push_str(&self.input[chunk_start..pos]);
                return self
                    .finish_token(TokenType::Template, TokenValue::Str(out))
                    .map_err(EscapeError::Fatal);
            }
            if c == '\\' {
                out.push_str(&self.input[chunk_start..pos]);
                self.read_escaped_char(true, &mut out)?;
                chunk_start = self.state.pos;
            } else if is_new_line(c) {
                out.push_str(&self.input[chunk_start..pos]);
                self.state.pos += c.len_utf8();
                if c == '\r' {
                    if self.byte_at(self.state.pos) == b'\n' {
                        self.state.pos += 1;
                    }
                    out.push('\n');
                } else {
                    out.push(c);
                }
                self.new_line_at(self.state.pos);
                chunk_start = self.state.pos;
            } else {
                self.state.pos += c.len_utf8();
            }
        }
    }

    /// Rescan a template chunk containing an invalid escape. The token's
    /// value is the raw text.
    fn read_invalid_template_token(&mut self) -> Result<()> {
        self.state.pos = self.state.start;
        while let Some(c) = self.char_at(self.state.pos) {
            match c {
                '\\' => {
                    self.state.pos += 1;
                    if let Some(escaped) = self.char_at(self.state.pos) {
                        self.skip_template_char(escaped);
                    }
                }
                '`' => break,
                '$' if self.byte_at(self.state.pos + 1) == b'{' => break,
                _ => self.skip_template_char(c),
            }
        }
        if self.state.pos >= self.input.len() {
            return self.raise(self.state.start, "Unterminated template");
        }
        let raw = self.input[self.state.start..self.state.pos].to_string();
        self.finish_token(TokenType::InvalidTemplate, TokenValue::Str(raw))
    }

    fn skip_template_char(&mut self, c: char) {
        self.state.pos += c.len_utf8();
        if is_new_line(c) {
            if c == '\r' && self.byte_at(self.state.pos) == b'\n' {
                self.state.pos += 1;
            }
            self.new_line_at(self.state.pos);
        }
    }

    // =========================================================================
    // Regular Expressions
    // =========================================================================

    fn read_regexp(&mut self) -> Result<()> {
        let start = self.state.pos;
        let mut escaped = false;
        let mut in_class = false;
        loop {
            let Some(c) = self.char_at(self.state.pos) else {
                return self.raise(start, "Unterminated regular expression");
            };
            if is_new_line(c) {
                return self.raise(start, "Unterminated regular expression");
            }
            if escaped {
                escaped = false;
            } else {
                match c {
                    '[' => in_class = true,
                    ']' if in_class => in_class = false,
                    '/' if !in_class => break,
                    _ => {}
                }
                escaped = c == '\\';
            }
            self.state.pos += c.len_utf8();
        }
        let pattern = self.input[start..self.state.pos].to_string();
        self.state.pos += 1;

        let flags_start = self.state.pos;
        let flags = self.read_word1()?;
        if self.state.contains_esc {
            return self.unexpected_at(flags_start);
        }

        let ecma = self.ecma;
        let state = self.regexp_state.get_or_insert_with(|| RegExpValidationState::new(ecma));
        state.reset(&pattern, &flags);
        let flags_result = state.validate_flags();
        let pattern_result = state.validate_pattern();
        if let Err(err) = flags_result {
            self.raise_recoverable(start, err.to_string());
        }
        if let Err(err) = pattern_result {
            return self.raise(start, err.to_string());
        }
        self.finish_token(TokenType::Regexp, TokenValue::Regex(RegexValue { pattern, flags }))
    }

    // =========================================================================
    // Words
    // =========================================================================

    /// Read an identifier, resolving `\u` escapes. Sets `contains_esc`.
    fn read_word1(&mut self) -> Result<String> {
        self.state.contains_esc = false;
        let astral = self.ecma >= 6;
        let mut word = String::new();
        let mut first = true;
        let mut chunk_start = self.state.pos;
        while let Some(c) = self.char_at(self.state.pos) {
            if is_identifier_char(c as u32, astral) {
                self.state.pos += c.len_utf8();
            } else if c == '\\' {
                self.state.contains_esc = true;
                word.push_str(&self.input[chunk_start..self.state.pos]);
                let esc_start = self.state.pos;
                self.state.pos += 1;
                if self.byte_at(self.state.pos) != b'u' {
                    return self.raise(self.state.pos, "Expecting Unicode escape sequence \\uXXXX");
                }
                self.state.pos += 1;
                let code = match self.read_code_point() {
                    Ok(code) => code,
                    Err(err) => return Err(self.escape_error(err)),
                };
                let valid = if first { is_identifier_start(code, astral) } else { is_identifier_char(code, astral) };
                if !valid {
                    return self.raise(esc_start, "Invalid Unicode escape");
                }
                word.push_str(&code_point_to_string(code));
                chunk_start = self.state.pos;
            } else {
                break;
            }
            first = false;
        }
        word.push_str(&self.input[chunk_start..self.state.pos]);
        Ok(word)
    }

    /// Read a word. Escaped words are never keywords.
    fn read_word(&mut self) -> Result<()> {
        let word = self.read_word1()?;
        let mut ty = TokenType::Name;
        if !self.state.contains_esc {
            let module_word = self.in_module && matches!(word.as_str(), "export" | "import");
            if is_keyword(&word, self.ecma) || module_word {
                ty = keyword_from_str(&word).unwrap_or(TokenType::Name);
            }
        }
        self.finish_token(ty, TokenValue::Str(word))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::options::{Callbacks, EcmaVersion, Options};

    fn lex_with(options: Options, src: &str) -> Result<Vec<(TokenType, TokenValue)>> {
        let mut p = Parser::new(options, src);
        p.start_scanning()?;
        let mut out = Vec::new();
        loop {
            out.push((p.state.ty, p.state.value.clone()));
            if p.state.ty == TokenType::Eof {
                return Ok(out);
            }
            p.next()?;
        }
    }

    fn types(src: &str) -> Vec<TokenType> {
        lex_with(Options::default(), src).unwrap().into_iter().map(|(ty, _)| ty).collect()
    }

    fn single(src: &str) -> TokenValue {
        lex_with(Options::default(), src).unwrap().remove(0).1
    }

    fn lex_err(src: &str) -> String {
        lex_with(Options::default(), src).unwrap_err().message()
    }

    fn str_(s: &str) -> TokenValue {
        TokenValue::Str(s.to_string())
    }

    #[test]
    fn test_punctuation_and_operators() {
        use TokenType::*;
        assert_eq!(
            types("a >>>= b ** c ?? d => ..."),
            vec![Name, Assign, Name, StarStar, Name, Coalesce, Name, Arrow, Ellipsis, Eof]
        );
        assert_eq!(types("x !== y && z++"), vec![Name, Equality, Name, LogicalAnd, Name, IncDec, Eof]);
        assert_eq!(types("a << b >= c"), vec![Name, BitShift, Name, Relational, Name, Eof]);
        assert_eq!(single("|="), str_("|="));
    }

    #[test]
    fn test_division_vs_regex() {
        use TokenType::*;
        assert_eq!(types("(a)/x/g"), vec![ParenL, Name, ParenR, Slash, Name, Slash, Name, Eof]);
        assert_eq!(types("(/x/g)"), vec![ParenL, Regexp, ParenR, Eof]);
        assert_eq!(types("a /= 2"), vec![Name, Assign, Num, Eof]);
        assert_eq!(
            single("/[/]\\//gi"),
            TokenValue::Regex(RegexValue { pattern: "[/]\\/".into(), flags: "gi".into() })
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(single("0x1F"), TokenValue::Num(31.0));
        assert_eq!(single("0o17"), TokenValue::Num(15.0));
        assert_eq!(single("0b101"), TokenValue::Num(5.0));
        assert_eq!(single("017"), TokenValue::Num(15.0));
        assert_eq!(single("019"), TokenValue::Num(19.0));
        assert_eq!(single("1.5e3"), TokenValue::Num(1500.0));
        assert_eq!(single(".25"), TokenValue::Num(0.25));
        assert_eq!(single("10n"), TokenValue::BigInt("10".into()));
        assert_eq!(single("0xFFn"), TokenValue::BigInt("0xFF".into()));
    }

    #[test]
    fn test_number_errors() {
        assert_eq!(lex_err("3in x"), "Identifier directly after number");
        assert_eq!(lex_err("0x"), "Expected number in radix 16");
        assert_eq!(lex_err("1e+"), "Invalid number");
    }

    #[test]
    fn test_bigint_requires_es2020() {
        let options = Options::default().with_ecma_version(EcmaVersion::new(10).unwrap());
        let err = lex_with(options, "10n").unwrap_err();
        assert_eq!(err.message(), "Identifier directly after number");
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(single(r"'a\nb'"), str_("a\nb"));
        assert_eq!(single(r"'\x41B\u{43}'"), str_("ABC"));
        assert_eq!(single(r"'😀'"), str_("😀"));
        assert_eq!(single(r"'\101'"), str_("A"));
        assert_eq!(single("'a\\\nb'"), str_("ab"));
        assert_eq!(single("\"it's\""), str_("it's"));
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(lex_err("'abc"), "Unterminated string constant");
        assert_eq!(lex_err("'a\nb'"), "Unterminated string constant");
        assert_eq!(lex_err(r"'\u{110000}'"), "Code point out of bounds");
        assert_eq!(lex_err(r"'\xZ1'"), "Bad character escape sequence");
    }

    #[test]
    fn test_template_tokens() {
        use TokenType::*;
        let tokens = lex_with(Options::default(), "`a${b}c`").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|(ty, _)| *ty).collect();
        assert_eq!(kinds, vec![BackQuote, Template, DollarBraceL, Name, BraceR, Template, BackQuote, Eof]);
        assert_eq!(tokens[1].1, str_("a"));
        assert_eq!(tokens[5].1, str_("c"));

        assert_eq!(types("``"), vec![BackQuote, Template, BackQuote, Eof]);
    }

    #[test]
    fn test_invalid_template_escape() {
        let tokens = lex_with(Options::default(), r"`\unicode`").unwrap();
        assert_eq!(tokens[1], (TokenType::InvalidTemplate, str_(r"\unicode")));

        let options = Options::default().with_ecma_version(EcmaVersion::new(8).unwrap());
        let err = lex_with(options, r"`\unicode`").unwrap_err();
        assert_eq!(err.message(), "Bad character escape sequence");
    }

    #[test]
    fn test_words_and_escapes() {
        use TokenType::*;
        assert_eq!(types("if x"), vec![If, Name, Eof]);
        assert_eq!(single(r"\u0061bc"), str_("abc"));
        assert_eq!(types(r"\u0069f"), vec![Name, Eof]);
        assert_eq!(lex_err(r"\x"), "Expecting Unicode escape sequence \\uXXXX");
        assert_eq!(lex_err(r"\u0031"), "Invalid Unicode escape");
    }

    #[test]
    fn test_keywords_depend_on_version() {
        let es5 = Options::default().with_ecma_version(EcmaVersion::ES5);
        let tokens = lex_with(es5, "class").unwrap();
        assert_eq!(tokens[0].0, TokenType::Name);
        assert_eq!(types("class")[0], TokenType::Class);
    }

    #[test]
    fn test_comments_reported() {
        let comments = Rc::new(RefCell::new(Vec::new()));
        let mut p = Parser::new(Options::default().with_locations(true), "/* a\nb */ x // tail")
            .with_callbacks(Callbacks::new().collect_comments(Rc::clone(&comments)));
        p.start_scanning().unwrap();
        assert_eq!(p.state.start_loc, Position::new(2, 5));
        p.next().unwrap();

        let comments = comments.borrow();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].kind, CommentKind::Block);
        assert_eq!(comments[0].value, " a\nb ");
        assert_eq!(comments[1].kind, CommentKind::Line);
        assert_eq!(comments[1].value, " tail");
        assert_eq!(comments[1].loc.as_ref().map(|loc| loc.start), Some(Position::new(2, 7)));
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(lex_err("x /* open"), "Unterminated comment");
    }

    #[test]
    fn test_unsupported_characters() {
        let err = lex_with(Options::default(), "#x").unwrap_err();
        assert!(matches!(err, Error::Unsupported { construct: "private name", .. }));
        let err = lex_with(Options::default(), "a?.b").unwrap_err();
        assert!(matches!(err, Error::Unsupported { construct: "optional chaining", .. }));
        assert_eq!(types("a?.5:1")[1], TokenType::Question);
    }

    #[test]
    fn test_hash_bang() {
        let options = Options::default().with_allow_hash_bang(true);
        let tokens = lex_with(options, "#!/usr/bin/env node\nx").unwrap();
        assert_eq!(tokens[0], (TokenType::Name, str_("x")));
    }

    #[test]
    fn test_regex_flag_errors_are_recoverable() {
        let mut p = Parser::new(Options::default(), "/a/gg");
        p.start_scanning().unwrap();
        assert_eq!(p.state.ty, TokenType::Regexp);
        assert_eq!(p.recoverable_errors()[0].message, "Duplicate regular expression flag");

        assert!(lex_err("/(/").starts_with("Invalid regular expression: /(/:"));
    }
}
