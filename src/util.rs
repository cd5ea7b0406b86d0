// src/util.rs — Shared utility functions

/// Truncate a string for display/logging (UTF-8 safe).
///
/// Returns a substring of at most `max_len` bytes, ensuring the cut
/// point falls on a valid UTF-8 character boundary.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

/// Percent-encode a single URL path segment (calendar IDs, sheet ranges).
pub fn encode_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'@' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "café" is 5 bytes (é = 2 bytes), truncating at 4 should not split é
        assert_eq!(truncate_str("café", 4), "caf");
    }

    #[test]
    fn test_encode_plain() {
        assert_eq!(encode_path_segment("primary"), "primary");
        assert_eq!(
            encode_path_segment("team@group.calendar.google.com"),
            "team@group.calendar.google.com"
        );
    }

    #[test]
    fn test_encode_sheet_range() {
        assert_eq!(encode_path_segment("Sheet1!A:E"), "Sheet1%21A%3AE");
        assert_eq!(encode_path_segment("Work Log!A:E"), "Work%20Log%21A%3AE");
    }

    #[test]
    fn test_encode_multibyte() {
        assert_eq!(encode_path_segment("é"), "%C3%A9");
    }
}
