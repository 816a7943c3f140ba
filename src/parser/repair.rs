//! Heuristic fixes for almost-JSON.

use std::sync::LazyLock;

use regex::Regex;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z]*").expect("valid regex"));

/// Remove markdown code fences (with or without a language tag).
pub(crate) fn strip_fences(text: &str) -> String {
    FENCE.replace_all(text, "").trim().to_string()
}

/// Rewrite the common ways model output breaks JSON into something
/// `serde_json` accepts.
///
/// Works outside of string literals only: single and typographic quotes become
/// double quotes, bare object keys get quoted, trailing commas are dropped and
/// Python-style `True`/`False`/`None` become JSON literals. Inside strings, raw
/// control characters and stray quotes are escaped.
pub fn repair_json(text: &str) -> String {
    let stripped = strip_fences(text);
    let sliced = slice_brackets(&stripped);
    let unescaped = unescape_stringified(sliced);
    let chars: Vec<char> = unescaped.chars().collect();

    let mut out = String::with_capacity(unescaped.len() + 16);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}' => {
                i = copy_string(&chars, i, &mut out);
                continue;
            }
            ',' => {
                if !matches!(next_significant(&chars, i + 1), Some(']' | '}' | ',') | None) {
                    out.push(',');
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if next_significant(&chars, i) == Some(':') {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                } else {
                    out.push_str(match word.as_str() {
                        "True" => "true",
                        "False" => "false",
                        "None" => "null",
                        other => other,
                    });
                }
                continue;
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

/// Drop anything before the first opening bracket and after the last closing one.
fn slice_brackets(text: &str) -> &str {
    let start = text.find(&['[', '{'][..]);
    let end = text.rfind(&[']', '}'][..]);
    match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Undo one level of string escaping, e.g. `[{\"question\": ...}]`, when the
/// text contains no bare double quote at all.
fn unescape_stringified(text: &str) -> String {
    let bytes = text.as_bytes();
    let has_escaped = text.contains("\\\"");
    let has_bare = bytes
        .iter()
        .enumerate()
        .any(|(i, &b)| b == b'"' && (i == 0 || bytes[i - 1] != b'\\'));
    if has_escaped && !has_bare {
        text.replace("\\\"", "\"").replace("\\\\", "\\")
    } else {
        text.to_string()
    }
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from.min(chars.len())..]
        .iter()
        .copied()
        .find(|c| !c.is_whitespace())
}

pub(crate) fn is_quote(c: char) -> bool {
    matches!(
        c,
        '"' | '\'' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}'
    )
}

/// Copy the string literal opening at `start` as a double-quoted JSON string.
/// Returns the index just past its closing quote.
///
/// A quote only closes the literal when it pairs with the opening quote and
/// the next significant character could follow a JSON value (`,` `:` `]` `}`
/// or end of input); other quotes are treated as part of the text.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let opener = chars[start];
    out.push('"');

    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                let escaped = chars[i + 1];
                if escaped == '\'' {
                    out.push('\'');
                } else {
                    out.push('\\');
                    out.push(escaped);
                }
                i += 2;
                continue;
            }
            c if is_quote(c) && closes_string(chars, i, opener) => {
                out.push('"');
                return i + 1;
            }
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
        i += 1;
    }

    out.push('"');
    i
}

/// A plain `"` is only closed by a plain `"`; typographic and single quotes
/// close with any quote of their own family.
fn closes_string(chars: &[char], at: usize, opener: char) -> bool {
    let c = chars[at];
    let pairs = match opener {
        '"' => c == '"',
        '\u{201C}' | '\u{201D}' => matches!(c, '"' | '\u{201C}' | '\u{201D}'),
        _ => matches!(c, '\'' | '\u{2018}' | '\u{2019}'),
    };
    pairs && matches!(next_significant(chars, at + 1), Some(',' | ':' | ']' | '}') | None)
}

/// Read the quoted literal at the start of `text` with the same closing-quote
/// rule as [`repair_json`]. Returns the decoded value and the number of bytes
/// consumed, or `None` when `text` does not start with a quote.
pub(crate) fn read_string_literal(text: &str) -> Option<(String, usize)> {
    let chars: Vec<char> = text.chars().collect();
    if !chars.first().copied().is_some_and(is_quote) {
        return None;
    }

    let mut json = String::new();
    let end = copy_string(&chars, 0, &mut json);
    let consumed = chars[..end].iter().map(|c| c.len_utf8()).sum();
    let value = serde_json::from_str::<String>(&json)
        .unwrap_or_else(|_| json[1..json.len() - 1].to_string());
    Some((value, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn repaired(text: &str) -> Value {
        let fixed = repair_json(text);
        serde_json::from_str(&fixed).unwrap_or_else(|e| panic!("{e}: {fixed}"))
    }

    #[test]
    fn test_trailing_commas_removed() {
        assert_eq!(repaired(r#"{"a": [1, 2, 3,], "b": 2,}"#), json!({"a": [1, 2, 3], "b": 2}));
    }

    #[test]
    fn test_bare_keys_quoted() {
        assert_eq!(
            repaired(r#"[{question: "Q?", answers: ["a","b","c","d"], correct: 0}]"#),
            json!([{"question": "Q?", "answers": ["a", "b", "c", "d"], "correct": 0}])
        );
    }

    #[test]
    fn test_single_quotes_keep_apostrophes() {
        assert_eq!(
            repaired(r#"{'question': 'Why don't cats bark?', 'ok': True}"#),
            json!({"question": "Why don't cats bark?", "ok": true})
        );
    }

    #[test]
    fn test_typographic_quotes_normalized() {
        assert_eq!(
            repaired("{\u{201C}question\u{201D}: \u{201C}What?\u{201D}}"),
            json!({"question": "What?"})
        );
    }

    #[test]
    fn test_fences_and_surrounding_prose_stripped() {
        let text = "Here it is:\n```json\n[{\"a\": 1}]\n```\nEnjoy.";
        assert_eq!(repaired(text), json!([{"a": 1}]));
    }

    #[test]
    fn test_raw_newlines_and_inner_quotes_escaped() {
        let text = "{\"question\": \"What does \"ownership\" mean\nin Rust?\"}";
        assert_eq!(
            repaired(text),
            json!({"question": "What does \"ownership\" mean\nin Rust?"})
        );
    }

    #[test]
    fn test_stringified_json_unescaped() {
        let text = r#"[{\"question\": \"Q?\", \"correct\": 1}]"#;
        assert_eq!(repaired(text), json!([{"question": "Q?", "correct": 1}]));
    }

    #[test]
    fn test_typographic_quotes_inside_plain_string_kept() {
        let text = r#"[{"question": "He said “hi”, then what?", "answers": ["a", "b", "c", "d"], "correct": 0}]"#;
        assert_eq!(
            repaired(text),
            json!([{"question": "He said “hi”, then what?", "answers": ["a", "b", "c", "d"], "correct": 0}])
        );
    }

    #[test]
    fn test_read_string_literal_stops_at_real_close() {
        let (value, consumed) = read_string_literal("'What's new?', 'next'").unwrap();
        assert_eq!(value, "What's new?");
        assert_eq!(consumed, "'What's new?'".len());

        let (value, _) = read_string_literal(r#""Say "hi" now" ]"#).unwrap();
        assert_eq!(value, r#"Say "hi" now"#);
        assert!(read_string_literal("plain").is_none());
    }

    #[test]
    fn test_commas_inside_strings_untouched() {
        assert_eq!(repaired(r#"{"a": "x, ]", "b": [1,],}"#), json!({"a": "x, ]", "b": [1]}));
    }
}
