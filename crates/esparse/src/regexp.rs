//! Regular expression literal validation.
//!
//! [`RegExpValidationState`] checks a `/pattern/flags` literal against the
//! RegExp grammar of the active ECMAScript version. The pattern is validated
//! as UTF-16 code units; under the `u` flag surrogate pairs are combined with
//! the same rules the scanner uses (see [`crate::unicode`]).

use rustc_hash::FxHashSet;

use crate::parser::MAX_NESTING;
use crate::unicode::{
    code_point_at, code_point_to_string, is_identifier_char, is_identifier_start, next_index,
};

/// Value of a class escape like `\d`, which stands for a set of characters.
const CHAR_SET: u32 = u32::MAX;

/// Regex validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegExpError {
    #[error("Invalid regular expression flag")]
    InvalidFlag,
    #[error("Duplicate regular expression flag")]
    DuplicateFlag,
    #[error("Invalid regular expression: /{pattern}/{flags}: {message}")]
    Pattern { pattern: String, flags: String, message: &'static str },
}

impl RegExpError {
    /// Flag errors are reported without aborting the parse.
    pub fn is_flag_error(&self) -> bool {
        matches!(self, RegExpError::InvalidFlag | RegExpError::DuplicateFlag)
    }
}

type Res<T> = Result<T, RegExpError>;

/// Scanning state for one regular expression literal.
#[derive(Debug, Clone)]
pub struct RegExpValidationState {
    ecma_version: u32,
    valid_flags: &'static str,
    pattern: String,
    source: Vec<u16>,
    pub flags: String,
    /// `u` flag: code points, strict escapes, property escapes.
    pub switch_u: bool,
    /// Named groups are enabled (`u` flag, or any named group at ≥ 9).
    pub switch_n: bool,
    pub pos: usize,
    last_int_value: u32,
    last_string_value: String,
    last_assertion_is_quantifiable: bool,
    pub num_capturing_parens: u32,
    pub max_back_reference: u32,
    pub group_names: FxHashSet<String>,
    pub back_reference_names: Vec<String>,
    /// Open groups and lookarounds around the cursor.
    depth: u32,
}

impl RegExpValidationState {
    pub fn new(ecma_version: u32) -> Self {
        let valid_flags = if ecma_version >= 9 {
            "gimsuy"
        } else if ecma_version >= 6 {
            "gimuy"
        } else {
            "gim"
        };
        Self {
            ecma_version,
            valid_flags,
            pattern: String::new(),
            source: Vec::new(),
            flags: String::new(),
            switch_u: false,
            switch_n: false,
            pos: 0,
            last_int_value: 0,
            last_string_value: String::new(),
            last_assertion_is_quantifiable: false,
            num_capturing_parens: 0,
            max_back_reference: 0,
            group_names: FxHashSet::default(),
            back_reference_names: Vec::new(),
            depth: 0,
        }
    }

    /// Load a new literal.
    pub fn reset(&mut self, pattern: &str, flags: &str) {
        let unicode = flags.contains('u');
        self.pattern = pattern.to_string();
        self.source = pattern.encode_utf16().collect();
        self.flags = flags.to_string();
        self.switch_u = unicode && self.ecma_version >= 6;
        self.switch_n = unicode && self.ecma_version >= 9;
    }

    /// Check the flag string against the version's flag alphabet.
    pub fn validate_flags(&self) -> Res<()> {
        for (i, flag) in self.flags.char_indices() {
            if !self.valid_flags.contains(flag) {
                return Err(RegExpError::InvalidFlag);
            }
            if self.flags[i + flag.len_utf8()..].contains(flag) {
                return Err(RegExpError::DuplicateFlag);
            }
        }
        Ok(())
    }

    /// Validate the pattern.
    ///
    /// Without `u`, a pattern containing named groups is reparsed with named
    /// group syntax enabled, since `\k` changes meaning.
    pub fn validate_pattern(&mut self) -> Res<()> {
        self.pattern_()?;
        if !self.switch_n && self.ecma_version >= 9 && !self.group_names.is_empty() {
            self.switch_n = true;
            self.pattern_()?;
        }
        Ok(())
    }

    fn raise<T>(&self, message: &'static str) -> Res<T> {
        Err(RegExpError::Pattern { pattern: self.pattern.clone(), flags: self.flags.clone(), message })
    }

    // === Cursor ===

    #[inline]
    fn at(&self, i: usize, force_u: bool) -> Option<u32> {
        code_point_at(&self.source, i, force_u || self.switch_u)
    }

    #[inline]
    fn current(&self) -> Option<u32> {
        self.at(self.pos, false)
    }

    #[inline]
    fn lookahead(&self) -> Option<u32> {
        self.at(next_index(&self.source, self.pos, self.switch_u), false)
    }

    #[inline]
    fn advance(&mut self) {
        self.advance_u(false);
    }

    #[inline]
    fn advance_u(&mut self, force_u: bool) {
        if self.pos < self.source.len() {
            self.pos = next_index(&self.source, self.pos, force_u || self.switch_u);
        }
    }

    #[inline]
    fn eat(&mut self, ch: char) -> bool {
        if self.current() == Some(ch as u32) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is(&self, ch: char) -> bool {
        self.current() == Some(ch as u32)
    }

    // === Pattern structure ===

    fn pattern_(&mut self) -> Res<()> {
        self.pos = 0;
        self.last_int_value = 0;
        self.last_string_value.clear();
        self.last_assertion_is_quantifiable = false;
        self.num_capturing_parens = 0;
        self.max_back_reference = 0;
        self.group_names.clear();
        self.back_reference_names.clear();

        self.disjunction()?;

        if self.pos != self.source.len() {
            if self.eat(')') {
                return self.raise("Unmatched ')'");
            }
            if self.eat(']') || self.eat('}') {
                return self.raise("Lone quantifier brackets");
            }
        }
        if self.max_back_reference > self.num_capturing_parens {
            return self.raise("Invalid escape");
        }
        if self.back_reference_names.iter().any(|name| !self.group_names.contains(name)) {
            return self.raise("Invalid named capture referenced");
        }
        Ok(())
    }

    fn disjunction(&mut self) -> Res<()> {
        if self.depth >= MAX_NESTING {
            return self.raise("Group nesting is too deep");
        }
        self.depth += 1;
        let result = self.alternatives();
        self.depth -= 1;
        result
    }

    fn alternatives(&mut self) -> Res<()> {
        self.alternative()?;
        while self.eat('|') {
            self.alternative()?;
        }
        if self.eat_quantifier(true)? {
            return self.raise("Nothing to repeat");
        }
        if self.eat('{') {
            return self.raise("Lone quantifier brackets");
        }
        Ok(())
    }

    fn alternative(&mut self) -> Res<()> {
        while self.pos < self.source.len() && self.eat_term()? {}
        Ok(())
    }

    fn eat_term(&mut self) -> Res<bool> {
        if self.eat_assertion()? {
            // Lookaheads are quantifiable in Annex B mode only.
            if self.last_assertion_is_quantifiable && self.eat_quantifier(false)? && self.switch_u {
                return self.raise("Invalid quantifier");
            }
            return Ok(true);
        }
        let atom = if self.switch_u { self.eat_atom()? } else { self.eat_extended_atom()? };
        if atom {
            self.eat_quantifier(false)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn eat_assertion(&mut self) -> Res<bool> {
        let start = self.pos;
        self.last_assertion_is_quantifiable = false;

        if self.eat('^') || self.eat('$') {
            return Ok(true);
        }
        if self.eat('\\') {
            if self.eat('B') || self.eat('b') {
                return Ok(true);
            }
            self.pos = start;
        }
        if self.eat('(') && self.eat('?') {
            let lookbehind = self.ecma_version >= 9 && self.eat('<');
            if self.eat('=') || self.eat('!') {
                self.disjunction()?;
                if !self.eat(')') {
                    return self.raise("Unterminated group");
                }
                self.last_assertion_is_quantifiable = !lookbehind;
                return Ok(true);
            }
        }
        self.pos = start;
        Ok(false)
    }

    fn eat_quantifier(&mut self, no_error: bool) -> Res<bool> {
        if self.eat('*') || self.eat('+') || self.eat('?') || self.eat_braced_quantifier(no_error)? {
            self.eat('?');
            return Ok(true);
        }
        Ok(false)
    }

    fn eat_braced_quantifier(&mut self, no_error: bool) -> Res<bool> {
        let start = self.pos;
        if self.eat('{') {
            if self.eat_decimal_digits() {
                let min = self.last_int_value;
                let mut max = None;
                if self.eat(',') && self.eat_decimal_digits() {
                    max = Some(self.last_int_value);
                }
                if self.eat('}') {
                    if max.is_some_and(|max| max < min) && !no_error {
                        return self.raise("numbers out of order in {} quantifier");
                    }
                    return Ok(true);
                }
            }
            if self.switch_u && !no_error {
                return self.raise("Incomplete quantifier");
            }
            self.pos = start;
        }
        Ok(false)
    }

    // === Atoms ===

    fn eat_atom(&mut self) -> Res<bool> {
        Ok(self.eat_pattern_characters()
            || self.eat('.')
            || self.eat_reverse_solidus_atom_escape()?
            || self.eat_character_class()?
            || self.eat_uncapturing_group()?
            || self.eat_capturing_group()?)
    }

    /// Annex B atoms, accepted without the `u` flag.
    fn eat_extended_atom(&mut self) -> Res<bool> {
        Ok(self.eat('.')
            || self.eat_reverse_solidus_atom_escape()?
            || self.eat_character_class()?
            || self.eat_uncapturing_group()?
            || self.eat_capturing_group()?
            || self.eat_invalid_braced_quantifier()?
            || self.eat_extended_pattern_character())
    }

    fn eat_reverse_solidus_atom_escape(&mut self) -> Res<bool> {
        let start = self.pos;
        if self.eat('\\') {
            if self.eat_atom_escape()? {
                return Ok(true);
            }
            self.pos = start;
        }
        Ok(false)
    }

    fn eat_uncapturing_group(&mut self) -> Res<bool> {
        let start = self.pos;
        if self.eat('(') {
            if self.eat('?') && self.eat(':') {
                self.disjunction()?;
                if self.eat(')') {
                    return Ok(true);
                }
                return self.raise("Unterminated group");
            }
            self.pos = start;
        }
        Ok(false)
    }

    fn eat_capturing_group(&mut self) -> Res<bool> {
        if self.eat('(') {
            if self.ecma_version >= 9 {
                self.group_specifier()?;
            } else if self.is('?') {
                return self.raise("Invalid group");
            }
            self.disjunction()?;
            if self.eat(')') {
                self.num_capturing_parens += 1;
                return Ok(true);
            }
            return self.raise("Unterminated group");
        }
        Ok(false)
    }

    fn eat_invalid_braced_quantifier(&mut self) -> Res<bool> {
        if self.eat_braced_quantifier(true)? {
            return self.raise("Nothing to repeat");
        }
        Ok(false)
    }

    fn eat_syntax_character(&mut self) -> bool {
        match self.current() {
            Some(ch) if is_syntax_character(ch) => {
                self.last_int_value = ch;
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn eat_pattern_characters(&mut self) -> bool {
        let start = self.pos;
        while let Some(ch) = self.current() {
            if is_syntax_character(ch) {
                break;
            }
            self.advance();
        }
        self.pos != start
    }

    fn eat_extended_pattern_character(&mut self) -> bool {
        match self.current() {
            Some(ch)
                if !matches!(
                    char::from_u32(ch),
                    Some('$' | '(' | ')' | '*' | '+' | '.' | '?' | '[' | '^' | '|')
                ) =>
            {
                self.advance();
                true
            }
            _ => false,
        }
    }

    // === Groups ===

    fn group_specifier(&mut self) -> Res<()> {
        if self.eat('?') {
            if self.eat_group_name()? {
                let name = std::mem::take(&mut self.last_string_value);
                if self.group_names.contains(&name) {
                    return self.raise("Duplicate capture group name");
                }
                self.group_names.insert(name);
                return Ok(());
            }
            return self.raise("Invalid group");
        }
        Ok(())
    }

    fn eat_group_name(&mut self) -> Res<bool> {
        self.last_string_value.clear();
        if self.eat('<') {
            if self.eat_identifier_name()? && self.eat('>') {
                return Ok(true);
            }
            return self.raise("Invalid capture group name");
        }
        Ok(false)
    }

    fn eat_identifier_name(&mut self) -> Res<bool> {
        self.last_string_value.clear();
        if self.eat_identifier_start()? {
            self.last_string_value.push_str(&code_point_to_string(self.last_int_value));
            while self.eat_identifier_part()? {
                self.last_string_value.push_str(&code_point_to_string(self.last_int_value));
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn eat_identifier_start(&mut self) -> Res<bool> {
        self.eat_identifier_code(|ch| is_identifier_start(ch, true))
    }

    fn eat_identifier_part(&mut self) -> Res<bool> {
        self.eat_identifier_code(|ch| is_identifier_char(ch, true))
    }

    /// One identifier code point, possibly written as `\u` escape.
    /// From ES2020 group names are read as code points even without `u`.
    fn eat_identifier_code(&mut self, accept: impl Fn(u32) -> bool) -> Res<bool> {
        let start = self.pos;
        let force_u = self.ecma_version >= 11;
        let Some(mut ch) = self.at(self.pos, force_u) else {
            return Ok(false);
        };
        self.advance_u(force_u);
        if ch == '\\' as u32 && self.eat_unicode_escape_sequence(force_u)? {
            ch = self.last_int_value;
        }
        if accept(ch) {
            self.last_int_value = ch;
            return Ok(true);
        }
        self.pos = start;
        Ok(false)
    }

    // === Escapes ===

    fn eat_atom_escape(&mut self) -> Res<bool> {
        if self.eat_back_reference()
            || self.eat_character_class_escape()?
            || self.eat_character_escape()?
            || (self.switch_n && self.eat_k_group_name()?)
        {
            return Ok(true);
        }
        if self.switch_u {
            if self.is('c') {
                return self.raise("Invalid unicode escape");
            }
            return self.raise("Invalid escape");
        }
        Ok(false)
    }

    fn eat_back_reference(&mut self) -> bool {
        let start = self.pos;
        if self.eat_decimal_escape() {
            let n = self.last_int_value;
            if self.switch_u {
                self.max_back_reference = self.max_back_reference.max(n);
                return true;
            }
            if n <= self.num_capturing_parens {
                return true;
            }
            self.pos = start;
        }
        false
    }

    fn eat_k_group_name(&mut self) -> Res<bool> {
        if self.eat('k') {
            if self.eat_group_name()? {
                let name = std::mem::take(&mut self.last_string_value);
                self.back_reference_names.push(name);
                return Ok(true);
            }
            return self.raise("Invalid named reference");
        }
        Ok(false)
    }

    fn eat_character_escape(&mut self) -> Res<bool> {
        Ok(self.eat_control_escape()
            || self.eat_c_control_letter()
            || self.eat_zero()
            || self.eat_hex_escape_sequence()?
            || self.eat_unicode_escape_sequence(false)?
            || (!self.switch_u && self.eat_legacy_octal_escape_sequence())
            || self.eat_identity_escape())
    }

    fn eat_c_control_letter(&mut self) -> bool {
        let start = self.pos;
        if self.eat('c') {
            if self.eat_control_letter() {
                return true;
            }
            self.pos = start;
        }
        false
    }

    fn eat_zero(&mut self) -> bool {
        if self.is('0') && !self.lookahead().is_some_and(is_decimal_digit) {
            self.last_int_value = 0;
            self.advance();
            return true;
        }
        false
    }

    fn eat_control_escape(&mut self) -> bool {
        let value = match self.current().and_then(char::from_u32) {
            Some('t') => 0x09,
            Some('n') => 0x0A,
            Some('v') => 0x0B,
            Some('f') => 0x0C,
            Some('r') => 0x0D,
            _ => return false,
        };
        self.last_int_value = value;
        self.advance();
        true
    }

    fn eat_control_letter(&mut self) -> bool {
        match self.current() {
            Some(ch) if is_control_letter(ch) => {
                self.last_int_value = ch % 0x20;
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn eat_unicode_escape_sequence(&mut self, force_u: bool) -> Res<bool> {
        let start = self.pos;
        let switch_u = force_u || self.switch_u;
        if self.eat('u') {
            if self.eat_fixed_hex_digits(4) {
                let lead = self.last_int_value;
                if switch_u && (0xD800..=0xDBFF).contains(&lead) {
                    let lead_end = self.pos;
                    if self.eat('\\') && self.eat('u') && self.eat_fixed_hex_digits(4) {
                        let trail = self.last_int_value;
                        if (0xDC00..=0xDFFF).contains(&trail) {
                            self.last_int_value = (lead - 0xD800) * 0x400 + (trail - 0xDC00) + 0x10000;
                            return Ok(true);
                        }
                    }
                    self.pos = lead_end;
                    self.last_int_value = lead;
                }
                return Ok(true);
            }
            if switch_u
                && self.eat('{')
                && self.eat_hex_digits()
                && self.eat('}')
                && self.last_int_value <= 0x10FFFF
            {
                return Ok(true);
            }
            if switch_u {
                return self.raise("Invalid unicode escape");
            }
            self.pos = start;
        }
        Ok(false)
    }

    fn eat_identity_escape(&mut self) -> bool {
        if self.switch_u {
            if self.eat_syntax_character() {
                return true;
            }
            if self.eat('/') {
                self.last_int_value = 0x2F;
                return true;
            }
            return false;
        }
        match self.current() {
            Some(ch) if ch != 'c' as u32 && (!self.switch_n || ch != 'k' as u32) => {
                self.last_int_value = ch;
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn eat_decimal_escape(&mut self) -> bool {
        self.last_int_value = 0;
        match self.current() {
            Some(ch) if (0x31..=0x39).contains(&ch) => {
                while let Some(ch) = self.current().filter(|&c| is_decimal_digit(c)) {
                    self.last_int_value = self.last_int_value.saturating_mul(10).saturating_add(ch - 0x30);
                    self.advance();
                }
                true
            }
            _ => false,
        }
    }

    fn eat_character_class_escape(&mut self) -> Res<bool> {
        let Some(ch) = self.current() else {
            return Ok(false);
        };
        if matches!(char::from_u32(ch), Some('d' | 'D' | 's' | 'S' | 'w' | 'W')) {
            self.last_int_value = CHAR_SET;
            self.advance();
            return Ok(true);
        }
        if self.switch_u && self.ecma_version >= 9 && (ch == 'P' as u32 || ch == 'p' as u32) {
            self.last_int_value = CHAR_SET;
            self.advance();
            if self.eat('{') && self.eat_unicode_property_value_expression()? && self.eat('}') {
                return Ok(true);
            }
            return self.raise("Invalid property name");
        }
        Ok(false)
    }

    fn eat_unicode_property_value_expression(&mut self) -> Res<bool> {
        let start = self.pos;

        // \p{Name=Value}
        if self.eat_unicode_property_name() && self.eat('=') {
            let name = std::mem::take(&mut self.last_string_value);
            if self.eat_unicode_property_value() {
                let value = std::mem::take(&mut self.last_string_value);
                match non_binary_property(&name) {
                    None => return self.raise("Invalid property name"),
                    Some(values) if !values(&value, self.ecma_version) => {
                        return self.raise("Invalid property value");
                    }
                    Some(_) => return Ok(true),
                }
            }
        }
        self.pos = start;

        // \p{NameOrValue}
        if self.eat_unicode_property_value() {
            let name_or_value = std::mem::take(&mut self.last_string_value);
            if !is_binary_property(&name_or_value, self.ecma_version)
                && !is_general_category_value(&name_or_value, self.ecma_version)
            {
                return self.raise("Invalid property name");
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn eat_unicode_property_name(&mut self) -> bool {
        self.eat_property_chars(|ch| is_control_letter(ch) || ch == '_' as u32)
    }

    fn eat_unicode_property_value(&mut self) -> bool {
        self.eat_property_chars(|ch| is_control_letter(ch) || ch == '_' as u32 || is_decimal_digit(ch))
    }

    fn eat_property_chars(&mut self, accept: impl Fn(u32) -> bool) -> bool {
        self.last_string_value.clear();
        while let Some(ch) = self.current().filter(|&c| accept(c)) {
            self.last_string_value.push_str(&code_point_to_string(ch));
            self.advance();
        }
        !self.last_string_value.is_empty()
    }

    // === Character classes ===

    fn eat_character_class(&mut self) -> Res<bool> {
        if self.eat('[') {
            self.eat('^');
            self.class_ranges()?;
            if self.eat(']') {
                return Ok(true);
            }
            return self.raise("Unterminated character class");
        }
        Ok(false)
    }

    fn class_ranges(&mut self) -> Res<()> {
        while self.eat_class_atom()? {
            let left = self.last_int_value;
            if self.eat('-') && self.eat_class_atom()? {
                let right = self.last_int_value;
                if self.switch_u && (left == CHAR_SET || right == CHAR_SET) {
                    return self.raise("Invalid character class");
                }
                if left != CHAR_SET && right != CHAR_SET && left > right {
                    return self.raise("Range out of order in character class");
                }
            }
        }
        Ok(())
    }

    fn eat_class_atom(&mut self) -> Res<bool> {
        let start = self.pos;
        if self.eat('\\') {
            if self.eat_class_escape()? {
                return Ok(true);
            }
            if self.switch_u {
                if self.current().is_some_and(|ch| ch == 'c' as u32 || is_octal_digit(ch)) {
                    return self.raise("Invalid class escape");
                }
                return self.raise("Invalid escape");
            }
            self.pos = start;
        }
        match self.current() {
            Some(ch) if ch != ']' as u32 => {
                self.last_int_value = ch;
                self.advance();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn eat_class_escape(&mut self) -> Res<bool> {
        let start = self.pos;
        if self.eat('b') {
            self.last_int_value = 0x08;
            return Ok(true);
        }
        if self.switch_u && self.eat('-') {
            self.last_int_value = 0x2D;
            return Ok(true);
        }
        if !self.switch_u && self.eat('c') {
            if self.eat_class_control_letter() {
                return Ok(true);
            }
            self.pos = start;
        }
        Ok(self.eat_character_class_escape()? || self.eat_character_escape()?)
    }

    fn eat_class_control_letter(&mut self) -> bool {
        match self.current() {
            Some(ch) if is_decimal_digit(ch) || ch == '_' as u32 => {
                self.last_int_value = ch % 0x20;
                self.advance();
                true
            }
            _ => false,
        }
    }

    // === Digits ===

    fn eat_hex_escape_sequence(&mut self) -> Res<bool> {
        let start = self.pos;
        if self.eat('x') {
            if self.eat_fixed_hex_digits(2) {
                return Ok(true);
            }
            if self.switch_u {
                return self.raise("Invalid escape");
            }
            self.pos = start;
        }
        Ok(false)
    }

    fn eat_decimal_digits(&mut self) -> bool {
        let start = self.pos;
        self.last_int_value = 0;
        while let Some(ch) = self.current().filter(|&c| is_decimal_digit(c)) {
            self.last_int_value = self.last_int_value.saturating_mul(10).saturating_add(ch - 0x30);
            self.advance();
        }
        self.pos != start
    }

    fn eat_hex_digits(&mut self) -> bool {
        let start = self.pos;
        self.last_int_value = 0;
        while let Some(digit) = self.current().and_then(hex_value) {
            self.last_int_value = self.last_int_value.saturating_mul(16).saturating_add(digit);
            self.advance();
        }
        self.pos != start
    }

    fn eat_legacy_octal_escape_sequence(&mut self) -> bool {
        let Some(n1) = self.eat_octal_digit() else {
            return false;
        };
        let value = match self.eat_octal_digit() {
            Some(n2) if n1 <= 3 => match self.eat_octal_digit() {
                Some(n3) => n1 * 64 + n2 * 8 + n3,
                None => n1 * 8 + n2,
            },
            Some(n2) => n1 * 8 + n2,
            None => n1,
        };
        self.last_int_value = value;
        true
    }

    fn eat_octal_digit(&mut self) -> Option<u32> {
        let ch = self.current().filter(|&c| is_octal_digit(c))?;
        self.advance();
        Some(ch - 0x30)
    }

    fn eat_fixed_hex_digits(&mut self, length: usize) -> bool {
        let start = self.pos;
        self.last_int_value = 0;
        for _ in 0..length {
            match self.current().and_then(hex_value) {
                Some(digit) => {
                    self.last_int_value = self.last_int_value * 16 + digit;
                    self.advance();
                }
                None => {
                    self.pos = start;
                    return false;
                }
            }
        }
        true
    }
}

/// Validate a regular expression literal's pattern and flags.
pub fn validate_regexp(
    pattern: &str,
    flags: &str,
    ecma_version: u32,
) -> Result<RegExpValidationState, RegExpError> {
    let mut state = RegExpValidationState::new(ecma_version);
    state.reset(pattern, flags);
    state.validate_flags()?;
    state.validate_pattern()?;
    Ok(state)
}

fn is_syntax_character(ch: u32) -> bool {
    matches!(
        char::from_u32(ch),
        Some('$' | '(' | ')' | '*' | '+' | '.' | '?' | '[' | '\\' | ']' | '^' | '{' | '|' | '}')
    )
}

#[inline]
fn is_decimal_digit(ch: u32) -> bool {
    (0x30..=0x39).contains(&ch)
}

#[inline]
fn is_octal_digit(ch: u32) -> bool {
    (0x30..=0x37).contains(&ch)
}

#[inline]
fn is_control_letter(ch: u32) -> bool {
    (0x41..=0x5A).contains(&ch) || (0x61..=0x7A).contains(&ch)
}

fn hex_value(ch: u32) -> Option<u32> {
    char::from_u32(ch)?.to_digit(16)
}

// === Unicode property tables ===

const BINARY_PROPERTIES: &[&str] = &[
    "ASCII", "ASCII_Hex_Digit", "AHex", "Alphabetic", "Alpha", "Any", "Assigned", "Bidi_Control",
    "Bidi_C", "Bidi_Mirrored", "Bidi_M", "Case_Ignorable", "CI", "Cased", "Changes_When_Casefolded",
    "CWCF", "Changes_When_Casemapped", "CWCM", "Changes_When_Lowercased", "CWL",
    "Changes_When_NFKC_Casefolded", "CWKCF", "Changes_When_Titlecased", "CWT",
    "Changes_When_Uppercased", "CWU", "Dash", "Default_Ignorable_Code_Point", "DI", "Deprecated",
    "Dep", "Diacritic", "Dia", "Emoji", "Emoji_Component", "Emoji_Modifier", "Emoji_Modifier_Base",
    "Emoji_Presentation", "Extender", "Ext", "Grapheme_Base", "Gr_Base", "Grapheme_Extend",
    "Gr_Ext", "Hex_Digit", "Hex", "IDS_Binary_Operator", "IDSB", "IDS_Trinary_Operator", "IDST",
    "ID_Continue", "IDC", "ID_Start", "IDS", "Ideographic", "Ideo", "Join_Control", "Join_C",
    "Logical_Order_Exception", "LOE", "Lowercase", "Lower", "Math", "Noncharacter_Code_Point",
    "NChar", "Pattern_Syntax", "Pat_Syn", "Pattern_White_Space", "Pat_WS", "Quotation_Mark",
    "QMark", "Radical", "Regional_Indicator", "RI", "Sentence_Terminal", "STerm", "Soft_Dotted",
    "SD", "Terminal_Punctuation", "Term", "Unified_Ideograph", "UIdeo", "Uppercase", "Upper",
    "Variation_Selector", "VS", "White_Space", "space", "XID_Continue", "XIDC", "XID_Start", "XIDS",
];

const BINARY_PROPERTIES_10: &[&str] = &["Extended_Pictographic"];

const GENERAL_CATEGORY_VALUES: &[&str] = &[
    "Cased_Letter", "LC", "Close_Punctuation", "Pe", "Connector_Punctuation", "Pc", "Control", "Cc",
    "cntrl", "Currency_Symbol", "Sc", "Dash_Punctuation", "Pd", "Decimal_Number", "Nd", "digit",
    "Enclosing_Mark", "Me", "Final_Punctuation", "Pf", "Format", "Cf", "Initial_Punctuation", "Pi",
    "Letter", "L", "Letter_Number", "Nl", "Line_Separator", "Zl", "Lowercase_Letter", "Ll", "Mark",
    "M", "Combining_Mark", "Math_Symbol", "Sm", "Modifier_Letter", "Lm", "Modifier_Symbol", "Sk",
    "Nonspacing_Mark", "Mn", "Number", "N", "Open_Punctuation", "Ps", "Other", "C", "Other_Letter",
    "Lo", "Other_Number", "No", "Other_Punctuation", "Po", "Other_Symbol", "So",
    "Paragraph_Separator", "Zp", "Private_Use", "Co", "Punctuation", "P", "punct", "Separator", "Z",
    "Space_Separator", "Zs", "Spacing_Mark", "Mc", "Surrogate", "Cs", "Symbol", "S",
    "Titlecase_Letter", "Lt", "Unassigned", "Cn", "Uppercase_Letter", "Lu",
];

const SCRIPT_VALUES: &[&str] = &[
    "Adlam", "Adlm", "Ahom", "Anatolian_Hieroglyphs", "Hluw", "Arabic", "Arab", "Armenian", "Armn",
    "Avestan", "Avst", "Balinese", "Bali", "Bamum", "Bamu", "Bassa_Vah", "Bass", "Batak", "Batk",
    "Bengali", "Beng", "Bhaiksuki", "Bhks", "Bopomofo", "Bopo", "Brahmi", "Brah", "Braille", "Brai",
    "Buginese", "Bugi", "Buhid", "Buhd", "Canadian_Aboriginal", "Cans", "Carian", "Cari",
    "Caucasian_Albanian", "Aghb", "Chakma", "Cakm", "Cham", "Cherokee", "Cher", "Common", "Zyyy",
    "Coptic", "Copt", "Qaac", "Cuneiform", "Xsux", "Cypriot", "Cprt", "Cyrillic", "Cyrl", "Deseret",
    "Dsrt", "Devanagari", "Deva", "Duployan", "Dupl", "Egyptian_Hieroglyphs", "Egyp", "Elbasan",
    "Elba", "Ethiopic", "Ethi", "Georgian", "Geor", "Glagolitic", "Glag", "Gothic", "Goth",
    "Grantha", "Gran", "Greek", "Grek", "Gujarati", "Gujr", "Gurmukhi", "Guru", "Han", "Hani",
    "Hangul", "Hang", "Hanunoo", "Hano", "Hatran", "Hatr", "Hebrew", "Hebr", "Hiragana", "Hira",
    "Imperial_Aramaic", "Armi", "Inherited", "Zinh", "Qaai", "Inscriptional_Pahlavi", "Phli",
    "Inscriptional_Parthian", "Prti", "Javanese", "Java", "Kaithi", "Kthi", "Kannada", "Knda",
    "Katakana", "Kana", "Kayah_Li", "Kali", "Kharoshthi", "Khar", "Khmer", "Khmr", "Khojki", "Khoj",
    "Khudawadi", "Sind", "Lao", "Laoo", "Latin", "Latn", "Lepcha", "Lepc", "Limbu", "Limb",
    "Linear_A", "Lina", "Linear_B", "Linb", "Lisu", "Lycian", "Lyci", "Lydian", "Lydi", "Mahajani",
    "Mahj", "Malayalam", "Mlym", "Mandaic", "Mand", "Manichaean", "Mani", "Marchen", "Marc",
    "Masaram_Gondi", "Gonm", "Meetei_Mayek", "Mtei", "Mende_Kikakui", "Mend", "Meroitic_Cursive",
    "Merc", "Meroitic_Hieroglyphs", "Mero", "Miao", "Plrd", "Modi", "Mongolian", "Mong", "Mro",
    "Mroo", "Multani", "Mult", "Myanmar", "Mymr", "Nabataean", "Nbat", "New_Tai_Lue", "Talu", "Newa",
    "Nko", "Nkoo", "Nushu", "Nshu", "Ogham", "Ogam", "Ol_Chiki", "Olck", "Old_Hungarian", "Hung",
    "Old_Italic", "Ital", "Old_North_Arabian", "Narb", "Old_Permic", "Perm", "Old_Persian", "Xpeo",
    "Old_South_Arabian", "Sarb", "Old_Turkic", "Orkh", "Oriya", "Orya", "Osage", "Osge", "Osmanya",
    "Osma", "Pahawh_Hmong", "Hmng", "Palmyrene", "Palm", "Pau_Cin_Hau", "Pauc", "Phags_Pa", "Phag",
    "Phoenician", "Phnx", "Psalter_Pahlavi", "Phlp", "Rejang", "Rjng", "Runic", "Runr", "Samaritan",
    "Samr", "Saurashtra", "Saur", "Sharada", "Shrd", "Shavian", "Shaw", "Siddham", "Sidd",
    "SignWriting", "Sgnw", "Sinhala", "Sinh", "Sora_Sompeng", "Sora", "Soyombo", "Soyo", "Sundanese",
    "Sund", "Syloti_Nagri", "Sylo", "Syriac", "Syrc", "Tagalog", "Tglg", "Tagbanwa", "Tagb", "Tai_Le",
    "Tale", "Tai_Tham", "Lana", "Tai_Viet", "Tavt", "Takri", "Takr", "Tamil", "Taml", "Tangut",
    "Tang", "Telugu", "Telu", "Thaana", "Thaa", "Thai", "Tibetan", "Tibt", "Tifinagh", "Tfng",
    "Tirhuta", "Tirh", "Ugaritic", "Ugar", "Vai", "Vaii", "Warang_Citi", "Wara", "Yi", "Yiii",
    "Zanabazar_Square", "Zanb",
];

const SCRIPT_VALUES_10: &[&str] = &[
    "Dogra", "Dogr", "Gunjala_Gondi", "Gong", "Hanifi_Rohingya", "Rohg", "Makasar", "Maka",
    "Medefaidrin", "Medf", "Old_Sogdian", "Sogo", "Sogdian", "Sogd",
];

const SCRIPT_VALUES_11: &[&str] = &[
    "Elymaic", "Elym", "Nandinagari", "Nand", "Nyiakeng_Puachue_Hmong", "Hmnp", "Wancho", "Wcho",
];

fn is_binary_property(name: &str, ecma_version: u32) -> bool {
    BINARY_PROPERTIES.contains(&name) || (ecma_version >= 10 && BINARY_PROPERTIES_10.contains(&name))
}

fn is_general_category_value(value: &str, _ecma_version: u32) -> bool {
    GENERAL_CATEGORY_VALUES.contains(&value)
}

fn is_script_value(value: &str, ecma_version: u32) -> bool {
    SCRIPT_VALUES.contains(&value)
        || (ecma_version >= 10 && SCRIPT_VALUES_10.contains(&value))
        || (ecma_version >= 11 && SCRIPT_VALUES_11.contains(&value))
}

/// Value table for a `Name=Value` property.
fn non_binary_property(name: &str) -> Option<fn(&str, u32) -> bool> {
    match name {
        "General_Category" | "gc" => Some(is_general_category_value),
        "Script" | "sc" | "Script_Extensions" | "scx" => Some(is_script_value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(pattern: &str, flags: &str, ecma: u32) -> String {
        match validate_regexp(pattern, flags, ecma) {
            Ok(_) => String::new(),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn test_named_group_back_reference() {
        let state = validate_regexp("(?<n>a)\\k<n>", "u", 9).unwrap();
        assert_eq!(state.num_capturing_parens, 1);
        assert!(state.group_names.contains("n"));
        assert_eq!(state.back_reference_names, vec!["n".to_string()]);
    }

    #[test]
    fn test_flags() {
        assert_eq!(validate_regexp("a", "gg", 11).unwrap_err(), RegExpError::DuplicateFlag);
        assert_eq!(validate_regexp("a", "s", 8).unwrap_err(), RegExpError::InvalidFlag);
        assert_eq!(validate_regexp("a", "u", 5).unwrap_err(), RegExpError::InvalidFlag);
        assert!(validate_regexp("a", "gimsuy", 9).is_ok());
        assert!(RegExpError::DuplicateFlag.is_flag_error());
    }

    #[test]
    fn test_structure_errors() {
        assert_eq!(message("a)", "", 11), "Invalid regular expression: /a)/: Unmatched ')'");
        assert_eq!(message("(a", "", 11), "Invalid regular expression: /(a/: Unterminated group");
        assert_eq!(message("*a", "", 11), "Invalid regular expression: /*a/: Nothing to repeat");
        assert_eq!(
            message("[b-a]", "", 11),
            "Invalid regular expression: /[b-a]/: Range out of order in character class"
        );
        assert_eq!(
            message("a{2,1}", "", 11),
            "Invalid regular expression: /a{2,1}/: numbers out of order in {} quantifier"
        );
        assert_eq!(message("(?<n>a", "gu", 11), "Invalid regular expression: /(?<n>a/gu: Unterminated group");
    }

    #[test]
    fn test_group_nesting_limit() {
        let depth = MAX_NESTING as usize;
        let ok = format!("{}a{}", "(".repeat(depth - 1), ")".repeat(depth - 1));
        assert!(validate_regexp(&ok, "", 11).is_ok());
        let deep = format!("{}a{}", "(?:".repeat(depth * 10), ")".repeat(depth * 10));
        assert!(message(&deep, "u", 11).ends_with("/u: Group nesting is too deep"));
    }

    #[test]
    fn test_annex_b_is_lenient_without_unicode() {
        assert!(validate_regexp("]", "", 11).is_ok());
        assert!(message("]", "u", 11).contains("Lone quantifier brackets"));
        assert!(validate_regexp("a{", "", 11).is_ok());
        assert!(validate_regexp("\\1", "", 11).is_ok());
        assert!(validate_regexp("\\c", "", 11).is_ok());
        assert!(validate_regexp("(?=a)*", "", 11).is_ok());
        assert!(validate_regexp("a{", "u", 11).is_err());
        assert!(validate_regexp("\\1", "u", 11).is_err());
        assert!(validate_regexp("(?=a)*", "u", 11).is_err());
    }

    #[test]
    fn test_named_groups() {
        assert!(message("(?<a>x)(?<a>y)", "", 9).contains("Duplicate capture group name"));
        assert!(message("\\k<b>(?<a>x)", "", 9).contains("Invalid named capture referenced"));
        // Without named groups, `\k` is an identity escape.
        assert!(validate_regexp("\\k<b>", "", 9).is_ok());
        assert!(message("(?<a>x)", "", 8).contains("Invalid group"));
    }

    #[test]
    fn test_property_escapes() {
        assert!(validate_regexp("\\p{L}", "u", 9).is_ok());
        assert!(validate_regexp("\\p{Script=Greek}", "u", 9).is_ok());
        assert!(validate_regexp("\\P{ASCII_Hex_Digit}", "u", 9).is_ok());
        assert!(message("\\p{Nope}", "u", 9).contains("Invalid property name"));
        assert!(message("\\p{Script=Nope}", "u", 9).contains("Invalid property value"));
        assert!(validate_regexp("\\p{Extended_Pictographic}", "u", 9).is_err());
        assert!(validate_regexp("\\p{Extended_Pictographic}", "u", 10).is_ok());
        // Outside unicode mode `\p` is an identity escape.
        assert!(validate_regexp("\\p{Nope}", "", 9).is_ok());
    }

    #[test]
    fn test_lookbehind_and_surrogates() {
        assert!(validate_regexp("(?<=a)b", "", 9).is_ok());
        assert!(validate_regexp("(?<!a)b", "", 9).is_ok());
        assert!(validate_regexp("[😀-😂]", "u", 9).is_ok());
        // Without `u` the astral range splits into out-of-order code units.
        assert!(validate_regexp("[😀-😂]", "", 9).is_err());
        assert!(validate_regexp("\\u{1F600}", "u", 9).is_ok());
    }
}
