const MAX_ERROR_LENGTH: usize = 500;
const EXCERPT_LENGTH: usize = 200;

/// Largest prefix of `text` that fits in `max_bytes` without splitting a char.
pub fn truncate_at_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Decode a raw body prefix, dropping a trailing partial UTF-8 sequence.
/// Invalid bytes elsewhere become U+FFFD.
pub fn decode_body(bytes: &[u8], max_bytes: usize) -> (String, bool) {
    let truncated = bytes.len() > max_bytes;
    let slice = if truncated { &bytes[..max_bytes] } else { bytes };
    (String::from_utf8_lossy(trim_partial_char(slice)).into_owned(), truncated)
}

fn trim_partial_char(bytes: &[u8]) -> &[u8] {
    match std::str::from_utf8(bytes) {
        // No error length: the input ended mid-sequence.
        Err(e) if e.error_len().is_none() => &bytes[..e.valid_up_to()],
        _ => bytes,
    }
}

/// Single-line excerpt of a response body for evidence summaries.
pub fn body_excerpt(body: &str) -> String {
    let collapsed: String = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut = truncate_at_boundary(&collapsed, EXCERPT_LENGTH);
    if cut.len() < collapsed.len() {
        format!("{}...", cut)
    } else {
        collapsed
    }
}

pub fn truncate_error(error: &str) -> String {
    if error.len() <= MAX_ERROR_LENGTH {
        error.to_string()
    } else {
        format!("{}...", truncate_at_boundary(error, MAX_ERROR_LENGTH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "héllo";
        // 'é' spans bytes 1..3
        assert_eq!(truncate_at_boundary(text, 2), "h");
        assert_eq!(truncate_at_boundary(text, 64), "héllo");
    }

    #[test]
    fn test_decode_body_flags_truncation() {
        let (body, truncated) = decode_body(b"abcdef", 4);
        assert_eq!(body, "abcd");
        assert!(truncated);
        let (body, truncated) = decode_body(b"abc", 4);
        assert_eq!(body, "abc");
        assert!(!truncated);
    }

    #[test]
    fn test_decode_body_drops_split_char() {
        // 'é' is 0xC3 0xA9; the cut lands between them.
        let (body, truncated) = decode_body("aé".as_bytes(), 2);
        assert_eq!(body, "a");
        assert!(truncated);

        let (body, _) = decode_body(&[b'a', 0xFF, b'b'], 16);
        assert_eq!(body, "a\u{FFFD}b");
    }

    #[test]
    fn test_body_excerpt_collapses_whitespace() {
        assert_eq!(body_excerpt("<h1>\n  No such app\n</h1>"), "<h1> No such app </h1>");
        let long = "x".repeat(400);
        assert!(body_excerpt(&long).ends_with("..."));
    }

    #[test]
    fn test_truncate_error() {
        assert_eq!(truncate_error("short"), "short");
        assert!(truncate_error(&"e".repeat(900)).len() < 520);
    }
}
