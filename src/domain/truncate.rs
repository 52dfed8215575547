//! Codepoint-safe truncation of long strings.

use std::borrow::Cow;

/// Shorten `s` to at most `limit` bytes by cutting out its middle.
///
/// When `s` is longer than `limit`, the result is a head segment, then
/// `ellipsis`, then a tail segment. The space left after the ellipsis is split
/// evenly (the head gets the odd byte), then the head end is moved back and the
/// tail start moved forward to the nearest char boundary, so no multi-byte
/// character is ever split and the result never exceeds `limit`.
///
/// If `limit` cannot even hold the ellipsis, the longest char-boundary prefix
/// of the ellipsis that fits is returned.
///
/// Applying `truncate` to its own output with the same arguments returns it
/// unchanged.
///
/// ```
/// use throttled_log::truncate;
///
/// assert_eq!(truncate("hello world", 8, ".."), "hel..rld");
/// assert_eq!(truncate("héllo world", 8, ".."), "hé..rld");
/// assert_eq!(truncate("short", 8, ".."), "short");
/// ```
pub fn truncate<'a>(s: &'a str, limit: usize, ellipsis: &str) -> Cow<'a, str> {
    if s.len() <= limit {
        return Cow::Borrowed(s);
    }

    if ellipsis.len() >= limit {
        let end = floor_char_boundary(ellipsis, limit);
        return Cow::Owned(ellipsis[..end].to_string());
    }

    let available = limit - ellipsis.len();
    let head_len = available / 2 + available % 2;
    let tail_len = available / 2;

    let head_end = floor_char_boundary(s, head_len);
    let tail_start = ceil_char_boundary(s, s.len() - tail_len);

    let mut out = String::with_capacity(limit);
    out.push_str(&s[..head_end]);
    out.push_str(ellipsis);
    out.push_str(&s[tail_start..]);
    Cow::Owned(out)
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, mut index: usize) -> usize {
    while index < s.len() && !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_input_is_borrowed() {
        let out = truncate("abc", 3, "...");
        assert!(matches!(out, Cow::Borrowed("abc")));
    }

    #[test]
    fn test_ascii_split_head_gets_odd_byte() {
        // 9 bytes available after a 1 byte ellipsis: 5 head, 4 tail.
        assert_eq!(truncate("0123456789abcdef", 10, "~"), "01234~cdef");
    }

    #[test]
    fn test_multibyte_head_is_not_split() {
        let out = truncate("héllo world", 8, "..");
        assert_eq!(out, "hé..rld");
        assert!(out.len() <= 8);
    }

    #[test]
    fn test_multibyte_boundaries_snap_inward() {
        // Each char is 3 bytes; no split may land mid-char.
        let input = "日本語のテキストです";
        let out = truncate(input, 11, "...");

        assert!(out.len() <= 11);
        assert!(out.starts_with("日"));
        assert!(out.ends_with("す"));
        assert!(out.contains("..."));
    }

    #[test]
    fn test_emoji_never_split() {
        let input = "👋🏽👋🏽👋🏽👋🏽👋🏽";
        for limit in 0..input.len() {
            let out = truncate(input, limit, "..");
            assert!(out.len() <= limit, "limit {} produced {:?}", limit, out);
        }
    }

    #[test]
    fn test_idempotent() {
        let inputs = ["héllo world", "日本語のテキストです", "plain ascii text here", ""];
        for input in inputs {
            for limit in 0..24 {
                let once = truncate(input, limit, "..").into_owned();
                let twice = truncate(&once, limit, "..").into_owned();
                assert_eq!(once, twice, "input {:?} limit {}", input, limit);
            }
        }
    }

    #[test]
    fn test_limit_smaller_than_ellipsis() {
        assert_eq!(truncate("hello world", 2, "..."), "..");
        assert_eq!(truncate("hello world", 0, "..."), "");
        assert_eq!(truncate("hello world", 3, "…"), "…");
        assert_eq!(truncate("hello world", 2, "…"), "");
    }
}
