//! Page text sanitiser: a single-pass, byte-level cleanup of raw PDF text
//! extraction output, applied before a page is inserted into the store.

/// Tuning knobs for [`sanitize_page_text`].
#[derive(Debug, Clone, Copy)]
pub struct SanitizeOptions {
    /// Elide `http(s)://` runs down to a single separating space.
    pub remove_urls: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self { remove_urls: false }
    }
}

/// Truncate `s` to at most `limit` bytes without splitting a UTF-8 sequence.
pub fn truncate_to_limit(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Clean one page of raw extracted text. Returns an empty string when the
/// page should be rejected entirely (see the minimum-length guard below).
pub fn sanitize_page_text(input: &[u8], opts: &SanitizeOptions) -> String {
    let decoded = decode_and_filter(input);
    let mut s = decoded;
    if opts.remove_urls {
        s = elide_urls(&s);
    }
    s = collapse_dash_runs(&s);
    s = normalize_whitespace(&s);
    s = strip_stray_punctuation(&s);
    s = strip_tail(&s);
    if s.len() < 3 {
        return String::new();
    }
    s
}

/// Leading strip (stray page number) + per-codepoint UTF-8 validation +
/// artifact codepoint drop, all in one pass over the input bytes.
fn decode_and_filter(input: &[u8]) -> String {
    let n = input.len();
    let mut i = 0;

    if n > 0 && input[0].is_ascii_digit() {
        let mut j = 0;
        while j < n && j < 9 && (input[j].is_ascii_digit() || input[j].is_ascii_whitespace()) {
            j += 1;
        }
        i = j;
    }

    let mut out = String::with_capacity(n.saturating_sub(i));
    while i < n {
        let b0 = input[i];
        if b0 < 0x80 {
            if b0 == 0x7F || (b0 < 0x20 && b0 != b'\t' && b0 != b'\n' && b0 != b'\r') {
                i += 1;
                continue;
            }
            out.push(b0 as char);
            i += 1;
            continue;
        }
        match decode_seq(&input[i..]) {
            Some((ch, len)) => {
                if !is_artifact(ch) {
                    out.push(ch);
                }
                i += len;
            }
            None => i += 1,
        }
    }
    out
}

/// Decode one multi-byte UTF-8 sequence starting at `bytes[0]`, applying the
/// overlong- and surrogate-exclusion rules explicitly (not just relying on
/// `char::from_u32`, which alone would accept overlong encodings of the
/// wrong byte length).
fn decode_seq(bytes: &[u8]) -> Option<(char, usize)> {
    let b0 = bytes[0];
    match b0 {
        0xC2..=0xDF => {
            let b1 = *bytes.get(1)?;
            if !(0x80..=0xBF).contains(&b1) {
                return None;
            }
            let cp = ((b0 as u32 & 0x1F) << 6) | (b1 as u32 & 0x3F);
            char::from_u32(cp).map(|c| (c, 2))
        }
        0xE0..=0xEF => {
            let b1 = *bytes.get(1)?;
            let b2 = *bytes.get(2)?;
            let valid_b1 = match b0 {
                0xE0 => (0xA0..=0xBF).contains(&b1),
                0xED => (0x80..=0x9F).contains(&b1),
                _ => (0x80..=0xBF).contains(&b1),
            };
            if !valid_b1 || !(0x80..=0xBF).contains(&b2) {
                return None;
            }
            let cp = ((b0 as u32 & 0x0F) << 12) | ((b1 as u32 & 0x3F) << 6) | (b2 as u32 & 0x3F);
            char::from_u32(cp).map(|c| (c, 3))
        }
        0xF0..=0xF4 => {
            let b1 = *bytes.get(1)?;
            let b2 = *bytes.get(2)?;
            let b3 = *bytes.get(3)?;
            let valid_b1 = match b0 {
                0xF0 => (0x90..=0xBF).contains(&b1),
                0xF4 => (0x80..=0x8F).contains(&b1),
                _ => (0x80..=0xBF).contains(&b1),
            };
            if !valid_b1 || !(0x80..=0xBF).contains(&b2) || !(0x80..=0xBF).contains(&b3) {
                return None;
            }
            let cp = ((b0 as u32 & 0x07) << 18)
                | ((b1 as u32 & 0x3F) << 12)
                | ((b2 as u32 & 0x3F) << 6)
                | (b3 as u32 & 0x3F);
            char::from_u32(cp).map(|c| (c, 4))
        }
        _ => None,
    }
}

fn is_artifact(c: char) -> bool {
    matches!(
        c,
        '\u{FFFD}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}'
    )
}

fn elide_urls(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        let rest = &s[i..];
        if rest.starts_with("http://") || rest.starts_with("https://") {
            let bytes = rest.as_bytes();
            let mut j = 0;
            while j < bytes.len() {
                let b = bytes[j];
                if b.is_ascii_whitespace() || b == b')' || b == b']' || b == b'>' {
                    break;
                }
                j += 1;
            }
            out.push(' ');
            i += j;
        } else {
            let ch = rest.chars().next().unwrap();
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    out
}

/// Collapse runs of `-`/`.` (possibly interleaved with whitespace) of length
/// at least 10 into a single space. The run-length counter advances on
/// whitespace as well as on `-`/`.`, matching the reference behaviour
/// exactly (an intentional quirk, kept rather than "fixed").
fn collapse_dash_runs(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '-' || c == '.' {
            let mut j = i;
            let mut count = 0usize;
            let mut bytes_used = 0usize;
            while j < chars.len() && bytes_used < 100 {
                let cj = chars[j];
                if cj == '-' || cj == '.' || cj.is_whitespace() {
                    count += 1;
                    bytes_used += cj.len_utf8();
                    j += 1;
                } else {
                    break;
                }
            }
            if count >= 10 {
                out.push(' ');
                i = j;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Collapse whitespace runs to a single space, except an exact double
/// newline, which is preserved as a paragraph break.
fn normalize_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            let mut run = vec![c];
            while let Some(&nc) = chars.peek() {
                if nc.is_whitespace() {
                    run.push(nc);
                    chars.next();
                } else {
                    break;
                }
            }
            if run.len() == 2 && run[0] == '\n' && run[1] == '\n' {
                out.push('\n');
                out.push('\n');
            } else {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn strip_stray_punctuation(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for idx in 0..chars.len() {
        let c = chars[idx];
        if matches!(c, '|' | '~' | '^' | '`') {
            let prev_ws = idx == 0 || chars[idx - 1].is_whitespace();
            let next_ws = idx + 1 == chars.len() || chars[idx + 1].is_whitespace();
            if prev_ws && next_ws {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn strip_tail(s: &str) -> String {
    let mut out = s.trim_end().to_string();
    loop {
        if out.ends_with('-') || out.ends_with('.') {
            out.pop();
            let trimmed_len = out.trim_end().len();
            out.truncate(trimmed_len);
        } else {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_output() {
        for len in [0usize, 1, 2] {
            let input = "a".repeat(len);
            assert_eq!(sanitize_page_text(input.as_bytes(), &SanitizeOptions::default()), "");
        }
    }

    #[test]
    fn strips_leading_page_number() {
        let input = b"3 hello world";
        let out = sanitize_page_text(input, &SanitizeOptions::default());
        assert_eq!(out, "hello world");
    }

    #[test]
    fn elides_urls_when_enabled() {
        let input = b"hello world http://x/y stop";
        let opts = SanitizeOptions { remove_urls: true };
        let out = sanitize_page_text(input, &opts);
        assert_eq!(out, "hello world stop");
    }

    #[test]
    fn keeps_urls_when_disabled() {
        let input = b"hello http://x/y stop";
        let out = sanitize_page_text(input, &SanitizeOptions::default());
        assert!(out.contains("http://x/y"));
    }

    #[test]
    fn collapses_dash_runs() {
        let input = "a ".to_string() + &"-".repeat(20) + " b";
        let out = sanitize_page_text(input.as_bytes(), &SanitizeOptions::default());
        assert_eq!(out, "a b");
    }

    #[test]
    fn preserves_paragraph_break() {
        let input = b"first\n\nsecond";
        let out = sanitize_page_text(input, &SanitizeOptions::default());
        assert_eq!(out, "first\n\nsecond");
    }

    #[test]
    fn collapses_other_whitespace_runs() {
        let input = b"first   \t  second";
        let out = sanitize_page_text(input, &SanitizeOptions::default());
        assert_eq!(out, "first second");
    }

    #[test]
    fn drops_invalid_utf8_bytes() {
        let input: &[u8] = b"hello \xFF\xFE world";
        let out = sanitize_page_text(input, &SanitizeOptions::default());
        assert_eq!(out, "hello world");
    }

    #[test]
    fn drops_zero_width_artifacts() {
        let input = "hello\u{200B}world is here".as_bytes();
        let out = sanitize_page_text(input, &SanitizeOptions::default());
        assert_eq!(out, "helloworld is here");
    }

    #[test]
    fn strips_trailing_dash_and_whitespace() {
        let input = b"some text--- ";
        let out = sanitize_page_text(input, &SanitizeOptions::default());
        assert_eq!(out, "some text");
    }

    #[test]
    fn is_idempotent() {
        let input = b"3   some -------- text with http://a/b  weird | stuff---";
        let once = sanitize_page_text(input, &SanitizeOptions::default());
        let twice = sanitize_page_text(once.as_bytes(), &SanitizeOptions::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let truncated = truncate_to_limit(s, 3);
        assert!(s.as_bytes()[..4].len() >= truncated.len());
        assert!(std::str::from_utf8(truncated.as_bytes()).is_ok());
    }
}
