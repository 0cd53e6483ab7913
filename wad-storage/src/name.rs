//! Entry-name validation and normalization
//!
//! A valid entry name is 1 to 8 characters, drawn from uppercase `A-Z`,
//! digits, `[`, `]`, `-`, `_` and the backslash. Names on the wire are
//! 8 bytes, NUL-padded.

use crate::types::NAME_LEN;

const fn is_name_char(c: char) -> bool {
    matches!(c, 'A'..='Z' | '0'..='9' | '[' | ']' | '-' | '_' | '\\')
}

/// Tests whether `name` is a valid entry name.
pub fn is_valid_entry_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= NAME_LEN && name.chars().all(is_name_char)
}

/// Cuts a string at the first NUL character.
pub fn null_trim(s: &str) -> &str {
    match s.find('\0') {
        Some(n) => &s[..n],
        None => s,
    }
}

/// Coerces an arbitrary string into a valid entry name.
///
/// Already-valid names pass through unchanged. Otherwise the input is cut at
/// the first NUL, truncated to 8 characters, letters are uppercased, digits
/// and the allowed punctuation are kept, and every other character becomes
/// `-`. The result may be empty if the input was.
pub fn to_valid_entry_name(name: &str) -> String {
    if is_valid_entry_name(name) {
        return name.to_owned();
    }

    null_trim(name)
        .chars()
        .take(NAME_LEN)
        .map(|c| {
            let c = c.to_ascii_uppercase();
            if is_name_char(c) { c } else { '-' }
        })
        .collect()
}

/// Encodes a name as its 8-byte NUL-padded wire form.
///
/// Names longer than 8 bytes are truncated.
pub fn name_bytes(name: &str) -> [u8; NAME_LEN] {
    let mut out = [0u8; NAME_LEN];
    let src = name.as_bytes();
    let n = src.len().min(NAME_LEN);
    out[..n].copy_from_slice(&src[..n]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(is_valid_entry_name("MAP01"));
        assert!(is_valid_entry_name("THINGS"));
        assert!(is_valid_entry_name("F_START"));
        assert!(is_valid_entry_name("W94_1"));
        assert!(is_valid_entry_name("[["));
        assert!(is_valid_entry_name("A\\B"));
        assert!(is_valid_entry_name("12345678"));
    }

    #[test]
    fn invalid_names() {
        assert!(!is_valid_entry_name(""));
        assert!(!is_valid_entry_name("things"));
        assert!(!is_valid_entry_name("TOOLONGNAME"));
        assert!(!is_valid_entry_name("SPA CE"));
        assert!(!is_valid_entry_name("DOT.TXT"));
    }

    #[test]
    fn normalization() {
        assert_eq!(to_valid_entry_name("MAP01"), "MAP01");
        assert_eq!(to_valid_entry_name("things"), "THINGS");
        assert_eq!(to_valid_entry_name("dot.txt"), "DOT-TXT");
        assert_eq!(to_valid_entry_name("waytoolongname"), "WAYTOOLO");
        assert_eq!(to_valid_entry_name("AB\0CD"), "AB");
        assert_eq!(to_valid_entry_name(""), "");
    }

    #[test]
    fn wire_name_padding() {
        assert_eq!(name_bytes("MAP01"), *b"MAP01\0\0\0");
        assert_eq!(name_bytes("LINEDEFS"), *b"LINEDEFS");
    }
}
