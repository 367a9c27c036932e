//! Character-set negotiation for fetched module text
//!
//! Extracts the `charset` parameter from a Content-Type header, tolerating
//! RFC 822 comment parentheses and quoted values, and decodes the common
//! encodings. Anything we cannot decode is handed back to the caller as raw
//! bytes so its parser can sniff a BOM or an encoding declaration itself.

/// Extract the `charset` parameter from a Content-Type header value
///
/// Handles `text/xml; charset=utf-8`, quoted values
/// (`charset="UTF-8"`), and interleaved RFC 822 comments
/// (`text/xml (see RFC 3023); charset=utf-16`).
pub fn charset_from_content_type(header: &str) -> Option<String> {
    let stripped = strip_comments(header);
    for param in stripped.split(';').skip(1) {
        let (key, value) = match param.split_once('=') {
            Some(pair) => pair,
            None => continue,
        };
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = unquote(value.trim());
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Remove RFC 822 comments: parenthesized, nestable, never inside quotes
fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0u32;
    let mut in_quote = false;
    let mut escaped = false;

    for c in s.chars() {
        if in_quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quote = false;
            }
            continue;
        }
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            '"' if depth == 0 => {
                in_quote = true;
                out.push(c);
            }
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Strip surrounding quotes and resolve backslash escapes
fn unquote(s: &str) -> String {
    let inner = match s.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        Some(inner) => inner,
        None => return s.to_string(),
    };
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Decode bytes according to a charset label
///
/// Returns `None` for labels this layer does not know; the caller then keeps
/// the raw bytes. A leading byte-order mark is consumed, not surfaced.
pub fn decode(bytes: &[u8], charset: &str) -> Option<String> {
    let label = charset.trim().to_ascii_lowercase();
    let text = match label.as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => {
            let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(bytes);
            String::from_utf8(bytes.to_vec()).ok()?
        }
        // Unmarked utf-16 defaults to big-endian per RFC 2781
        "utf-16" => decode_utf16(bytes, true)?,
        "utf-16be" => decode_utf16(bytes, true)?,
        "utf-16le" => decode_utf16(bytes, false)?,
        "iso-8859-1" | "latin1" | "latin-1" => bytes.iter().map(|&b| b as char).collect(),
        _ => return None,
    };
    Some(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}

/// Decode UTF-16, honoring a byte-order mark when present
fn decode_utf16(bytes: &[u8], default_big_endian: bool) -> Option<String> {
    let (bytes, big_endian) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        _ => (bytes, default_big_endian),
    };
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_charset_parameter() {
        assert_eq!(
            charset_from_content_type("text/xml; charset=utf-8"),
            Some("utf-8".to_string())
        );
    }

    #[test]
    fn test_quoted_charset_value() {
        assert_eq!(
            charset_from_content_type(r#"application/xquery; charset="UTF-8""#),
            Some("UTF-8".to_string())
        );
    }

    #[test]
    fn test_rfc822_comments_tolerated() {
        assert_eq!(
            charset_from_content_type("text/xml (see RFC 3023) ; charset=utf-16 (default BE)"),
            Some("utf-16".to_string())
        );
        // Nested comments
        assert_eq!(
            charset_from_content_type("text/xml (outer (inner)); charset=utf-8"),
            Some("utf-8".to_string())
        );
    }

    #[test]
    fn test_missing_charset() {
        assert_eq!(charset_from_content_type("application/xquery"), None);
        assert_eq!(charset_from_content_type("text/xml; version=1.0"), None);
    }

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode(b"declare variable $x := 1;", "utf-8").as_deref(), Some("declare variable $x := 1;"));
        // BOM is consumed
        assert_eq!(decode(b"\xEF\xBB\xBFabc", "UTF-8").as_deref(), Some("abc"));
        // Invalid bytes decline
        assert_eq!(decode(&[0xFF, 0xFE, 0xFD], "utf-8"), None);
    }

    #[test]
    fn test_decode_utf16_boms() {
        // Big-endian with BOM
        assert_eq!(decode(&[0xFE, 0xFF, 0x00, 0x41], "utf-16").as_deref(), Some("A"));
        // Little-endian with BOM
        assert_eq!(decode(&[0xFF, 0xFE, 0x41, 0x00], "utf-16").as_deref(), Some("A"));
        // No BOM: big-endian default
        assert_eq!(decode(&[0x00, 0x42], "utf-16").as_deref(), Some("B"));
        // Explicit little-endian label
        assert_eq!(decode(&[0x42, 0x00], "utf-16le").as_deref(), Some("B"));
        // Odd byte count declines
        assert_eq!(decode(&[0x00, 0x41, 0x00], "utf-16"), None);
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode(&[0x63, 0x61, 0x66, 0xE9], "iso-8859-1").as_deref(), Some("café"));
    }

    #[test]
    fn test_unknown_charset_declines() {
        assert_eq!(decode(b"abc", "ebcdic-cp-us"), None);
    }
}
