//! Atomic-value parsers
//!
//! Leaf tokens of a composite literal. Booleans accept the same spellings
//! the server's settings system accepts (`true`/`false`, `yes`/`no`,
//! `on`/`off`, `1`/`0`, case-insensitive unique prefixes). Integers are
//! 32-bit with optional memory-unit suffixes. Any atomic token may arrive
//! single-quoted; [`unquote`] undoes the quoting, with `''` as an escaped
//! quote.

/// Memory units accepted after an integer, in 1024 steps
const INT_UNITS: [(&str, i64); 4] = [
    ("kB", 1024),
    ("MB", 1024 * 1024),
    ("GB", 1024 * 1024 * 1024),
    ("TB", 1024 * 1024 * 1024 * 1024),
];

fn prefix_of(input: &str, word: &str) -> bool {
    !input.is_empty() && word.starts_with(input)
}

/// Parse a boolean token. Accepts case-insensitive unique prefixes of
/// `true`, `false`, `yes`, `no`, `on`, `off`, plus `1` and `0`; a lone
/// `o` is ambiguous and rejected.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    let v = text.to_ascii_lowercase();
    if prefix_of(&v, "true") || prefix_of(&v, "yes") || v == "1" {
        return Some(true);
    }
    if v == "on" {
        return Some(true);
    }
    if prefix_of(&v, "false") || prefix_of(&v, "no") || v == "0" {
        return Some(false);
    }
    if prefix_of(&v, "off") && v.len() > 1 {
        return Some(false);
    }
    None
}

/// Parse a 32-bit integer token with an optional memory-unit suffix
/// (`kB`, `MB`, `GB`, `TB`), e.g. `4096`, `-12`, `8 kB`.
pub(crate) fn parse_int(text: &str) -> Result<i32, &'static str> {
    let bytes = text.as_bytes();
    let mut digits_end = 0;
    if digits_end < bytes.len() && (bytes[digits_end] == b'+' || bytes[digits_end] == b'-') {
        digits_end += 1;
    }
    let number_start = digits_end;
    while digits_end < bytes.len() && bytes[digits_end].is_ascii_digit() {
        digits_end += 1;
    }
    if digits_end == number_start {
        return Err("value must start with a decimal number");
    }

    let number: i64 = text[..digits_end]
        .parse()
        .map_err(|_| "number out of range for int")?;

    let unit = text[digits_end..].trim();
    let factor = if unit.is_empty() {
        1
    } else {
        INT_UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, f)| *f)
            .ok_or("valid units are kB, MB, GB, and TB")?
    };

    let scaled = number
        .checked_mul(factor)
        .ok_or("number out of range for int")?;
    i32::try_from(scaled).map_err(|_| "number out of range for int")
}

/// Parse a real token
pub(crate) fn parse_real(text: &str) -> Result<f64, &'static str> {
    text.parse::<f64>()
        .map_err(|_| "use a decimal number with '.' as the separator")
}

/// Undo single-quoting: strip the outer quotes and collapse each doubled
/// `''` to one quote. The closing quote must end the token.
pub(crate) fn unquote(text: &str) -> Result<String, &'static str> {
    debug_assert!(text.starts_with('\''));
    let mut out = String::with_capacity(text.len());
    let mut chars = text[1..].chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                out.push('\'');
            } else if chars.next().is_some() {
                return Err("unexpected characters after the closing quote");
            } else {
                return Ok(out);
            }
        } else {
            out.push(c);
        }
    }
    Err("string has no closing quote")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_spellings() {
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("t"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("of"), Some(false));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("f"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
    }

    #[test]
    fn test_bool_rejects_ambiguous() {
        assert_eq!(parse_bool("o"), None);
        assert_eq!(parse_bool(""), None);
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool("truex"), None);
    }

    #[test]
    fn test_int_plain_and_signed() {
        assert_eq!(parse_int("5432"), Ok(5432));
        assert_eq!(parse_int("-17"), Ok(-17));
        assert_eq!(parse_int("+3"), Ok(3));
    }

    #[test]
    fn test_int_units() {
        assert_eq!(parse_int("8kB"), Ok(8192));
        assert_eq!(parse_int("2 MB"), Ok(2 * 1024 * 1024));
        assert_eq!(parse_int("1GB"), Ok(1024 * 1024 * 1024));
    }

    #[test]
    fn test_int_rejects() {
        assert!(parse_int("").is_err());
        assert!(parse_int("abc").is_err());
        assert!(parse_int("10 lightyears").is_err());
        assert!(parse_int("3000000 MB").is_err());
        assert!(parse_int("1TB").is_err()); // 2^40 exceeds i32
        assert!(parse_int("2147483648").is_err());
    }

    #[test]
    fn test_real() {
        assert_eq!(parse_real("2.5"), Ok(2.5));
        assert_eq!(parse_real("-1e3"), Ok(-1000.0));
        assert!(parse_real("2,5").is_err());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'abc'").unwrap(), "abc");
        assert_eq!(unquote("''").unwrap(), "");
        assert_eq!(unquote("'can''t'").unwrap(), "can't");
        assert_eq!(unquote("''''").unwrap(), "'");
    }

    #[test]
    fn test_unquote_rejects() {
        assert!(unquote("'open").is_err());
        assert!(unquote("'a'b").is_err());
    }
}
