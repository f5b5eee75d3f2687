//! Endpoint-shape heuristic applied to string and template literal values.

use crate::syntax::SyntaxNode;

/// Text that, sitting right before a `/`, marks a MIME type or a closing tag
/// rather than a path.
const REJECTED_PREFIXES: [&str; 3] = ["application", "text", "<"];

/// Whether `value` looks like a path or URL.
///
/// True when some `/` is neither preceded by `application`, `text` or `<`
/// nor followed by `>`. That rejects `application/json`, `text/html` and
/// `</div>` while keeping `/api/users` and `https://host/path`.
pub fn looks_like_endpoint(value: &str) -> bool {
    value.match_indices('/').any(|(idx, _)| {
        let before = &value[..idx];
        let after = &value[idx + 1..];
        !REJECTED_PREFIXES.iter().any(|prefix| before.ends_with(prefix)) && !after.starts_with('>')
    })
}

/// Literal classifier: string literals and template elements whose decoded
/// value looks like an endpoint. Every other node is rejected.
pub fn is_endpoint_literal(node: &SyntaxNode<'_>, source: &str) -> bool {
    node.literal_value(source)
        .is_some_and(|value| looks_like_endpoint(&value))
}

/// Decode JavaScript escape sequences in the body of a string or template.
pub fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };

        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0'..='7' => push_octal_escape(&mut out, &mut chars, escaped),
            'x' => push_hex_escape(&mut out, &mut chars, 'x', 2),
            'u' if chars.peek() == Some(&'{') => {
                chars.next();
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    chars.next();
                    if d == '}' {
                        break;
                    }
                    digits.push(d);
                }
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push('\u{FFFD}'),
                }
            }
            'u' => push_hex_escape(&mut out, &mut chars, 'u', 4),
            // Line continuations vanish from the value.
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }

    out
}

fn push_hex_escape(
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    marker: char,
    width: usize,
) {
    let mut digits = String::with_capacity(width);
    while digits.len() < width {
        match chars.peek() {
            Some(d) if d.is_ascii_hexdigit() => {
                digits.push(*d);
                chars.next();
            }
            _ => break,
        }
    }

    if digits.len() == width {
        match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
            Some(decoded) => out.push(decoded),
            // Lone surrogate halves.
            None => out.push('\u{FFFD}'),
        }
    } else {
        out.push(marker);
        out.push_str(&digits);
    }
}

/// Legacy octal escape: up to three digits starting with 0-3, up to two
/// starting with 4-7, so the value never exceeds `\377`.
fn push_octal_escape(
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    first: char,
) {
    let max_digits = if first <= '3' { 3 } else { 2 };
    let mut value = first.to_digit(8).unwrap_or(0);
    for _ in 1..max_digits {
        match chars.peek().and_then(|d| d.to_digit(8)) {
            Some(digit) => {
                value = value * 8 + digit;
                chars.next();
            }
            None => break,
        }
    }
    out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mime_types() {
        assert!(!looks_like_endpoint("application/json"));
        assert!(!looks_like_endpoint("text/html"));
        assert!(!looks_like_endpoint("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_rejects_tag_fragments() {
        assert!(!looks_like_endpoint("</script>"));
        assert!(!looks_like_endpoint("<br/>"));
        assert!(!looks_like_endpoint("</div></span>"));
    }

    #[test]
    fn test_accepts_paths_and_urls() {
        assert!(looks_like_endpoint("/api/v1/users"));
        assert!(looks_like_endpoint("https://example.com/path"));
        assert!(looks_like_endpoint("./relative/file.js"));
        assert!(looks_like_endpoint("users/"));
    }

    #[test]
    fn test_rejects_strings_without_slash() {
        assert!(!looks_like_endpoint(""));
        assert!(!looks_like_endpoint("hello world"));
        assert!(!looks_like_endpoint("a\\b"));
    }

    #[test]
    fn test_one_good_slash_is_enough() {
        // The first slash is a MIME type, the second is a path.
        assert!(looks_like_endpoint("text/html /login"));
        assert!(looks_like_endpoint("<b>/admin</b>"));
    }

    #[test]
    fn test_whitespace_separates_prefix_from_slash() {
        assert!(looks_like_endpoint("text /html"));
        assert!(looks_like_endpoint("a/ >"));
    }

    #[test]
    fn test_decode_simple_escapes() {
        assert_eq!(decode_escapes(r"a\/b"), "a/b");
        assert_eq!(decode_escapes(r"line\nbreak"), "line\nbreak");
        assert_eq!(decode_escapes(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(decode_escapes(r"trailing\"), "trailing\\");
    }

    #[test]
    fn test_decode_hex_and_unicode_escapes() {
        assert_eq!(decode_escapes(r"\x2fapi"), "/api");
        assert_eq!(decode_escapes(r"\u002Fapi"), "/api");
        assert_eq!(decode_escapes(r"\u{2F}api"), "/api");
        assert_eq!(decode_escapes(r"\xZZ"), "xZZ");
        assert_eq!(decode_escapes(r"\uD83D"), "\u{FFFD}");
    }

    #[test]
    fn test_decode_legacy_octal_escapes() {
        assert_eq!(decode_escapes(r"\57api\57v1"), "/api/v1");
        assert_eq!(decode_escapes(r"\0"), "\0");
        assert_eq!(decode_escapes(r"\101\1011"), "AA1");
        assert_eq!(decode_escapes(r"\477"), "'7");
        assert_eq!(decode_escapes(r"\8"), "8");
    }

    #[test]
    fn test_decode_line_continuation() {
        assert_eq!(decode_escapes("/api\\\n/users"), "/api/users");
        assert_eq!(decode_escapes("/api\\\r\n/users"), "/api/users");
    }

    #[test]
    fn test_escaped_slash_is_an_endpoint() {
        assert!(looks_like_endpoint(&decode_escapes(r"\/api\/v2")));
    }
}
