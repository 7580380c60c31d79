//! Unicode helpers shared by the scanner and the regular expression validator.
//!
//! The scanner works on `&str`, so every `char` is already a full code point.
//! Escape sequences and regex patterns, however, are specified in UTF-16
//! terms: `😀` names one astral character and a non-unicode regex
//! sees it as two units. Both sides go through [`combine_surrogates`] and
//! [`code_point_at`] so they agree on what a "character" is.

/// Check if a code point can start an identifier.
///
/// Astral code points are accepted only when `astral` is set.
pub fn is_identifier_start(code: u32, astral: bool) -> bool {
    match code {
        0x24 | 0x5F => true,
        0x41..=0x5A | 0x61..=0x7A => true,
        0..=0x7F => false,
        0x10000.. if !astral => false,
        _ => char::from_u32(code).is_some_and(char::is_alphabetic),
    }
}

/// Check if a code point can continue an identifier.
pub fn is_identifier_char(code: u32, astral: bool) -> bool {
    match code {
        0x24 | 0x5F => true,
        0x30..=0x39 | 0x41..=0x5A | 0x61..=0x7A => true,
        0..=0x7F => false,
        // ZWNJ, ZWJ
        0x200C | 0x200D => true,
        0x10000.. if !astral => false,
        _ => char::from_u32(code).is_some_and(|c| c.is_alphanumeric() || is_combining_mark(code)),
    }
}

/// Nonspacing and spacing combining marks commonly seen in identifiers.
fn is_combining_mark(code: u32) -> bool {
    matches!(
        code,
        0x0300..=0x036F
            | 0x0483..=0x0487
            | 0x0591..=0x05BD
            | 0x0610..=0x061A
            | 0x064B..=0x065F
            | 0x0900..=0x0903
            | 0x093A..=0x094F
            | 0x1AB0..=0x1AFF
            | 0x1DC0..=0x1DFF
            | 0x20D0..=0x20FF
            | 0xFE00..=0xFE0F
            | 0xFE20..=0xFE2F
            | 0x203F
            | 0x2040
    )
}

#[inline]
pub fn is_lead_surrogate(unit: u32) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

#[inline]
pub fn is_trail_surrogate(unit: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Combine a surrogate pair into one code point.
#[inline]
pub fn combine_surrogates(lead: u32, trail: u32) -> Option<u32> {
    if is_lead_surrogate(lead) && is_trail_surrogate(trail) {
        Some(((lead - 0xD800) << 10) + (trail - 0xDC00) + 0x10000)
    } else {
        None
    }
}

/// Code point at UTF-16 index `i`.
///
/// With `unicode` set, a surrogate pair starting at `i` is combined into a
/// single code point; otherwise each code unit stands alone.
pub fn code_point_at(units: &[u16], i: usize, unicode: bool) -> Option<u32> {
    let lead = u32::from(*units.get(i)?);
    if !unicode {
        return Some(lead);
    }
    match units.get(i + 1) {
        Some(&trail) => Some(combine_surrogates(lead, u32::from(trail)).unwrap_or(lead)),
        None => Some(lead),
    }
}

/// Index of the code point following the one at `i`, per [`code_point_at`].
pub fn next_index(units: &[u16], i: usize, unicode: bool) -> usize {
    match code_point_at(units, i, unicode) {
        Some(c) if c > 0xFFFF => i + 2,
        Some(_) => i + 1,
        None => units.len(),
    }
}

/// Character at byte offset `pos`, if `pos` is a character boundary.
#[inline]
pub fn full_char_at(input: &str, pos: usize) -> Option<char> {
    input.get(pos..)?.chars().next()
}

/// Encode a code point as a string.
///
/// Rust strings cannot hold lone surrogates; those become U+FFFD.
pub fn code_point_to_string(code: u32) -> String {
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_classes() {
        assert!(is_identifier_start('$' as u32, true));
        assert!(is_identifier_start('é' as u32, true));
        assert!(!is_identifier_start('1' as u32, true));
        assert!(is_identifier_char('1' as u32, true));
        assert!(is_identifier_char(0x200D, true));
        assert!(!is_identifier_start(0x1D49C, false));
        assert!(is_identifier_start(0x1D49C, true));
    }

    #[test]
    fn test_surrogate_policy() {
        let units: Vec<u16> = "a😀".encode_utf16().collect();
        assert_eq!(code_point_at(&units, 1, true), Some(0x1F600));
        assert_eq!(next_index(&units, 1, true), 3);
        assert_eq!(code_point_at(&units, 1, false), Some(0xD83D));
        assert_eq!(next_index(&units, 1, false), 2);
        assert_eq!(code_point_at(&units, 3, true), None);
    }

    #[test]
    fn test_combine_surrogates() {
        assert_eq!(combine_surrogates(0xD83D, 0xDE00), Some(0x1F600));
        assert_eq!(combine_surrogates(0x41, 0xDE00), None);
        assert_eq!(code_point_to_string(0x1F600), "😀");
        assert_eq!(code_point_to_string(0xD800), "\u{FFFD}");
    }
}
