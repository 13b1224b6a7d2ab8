//! Pre-parse cleanup of raw model replies.
//!
//! The reply is supposed to be bare JSON, but in practice it arrives wrapped
//! in markdown fences, with literal `\n`/`\t` tokens that were never escaped,
//! or with stray quotes inside string values. [`normalize`] applies the
//! text-level fixes that make the strict parser's job possible; structural
//! repair is the pipeline's job, not this module's.

use std::sync::OnceLock;

use regex::Regex;

/// Runs the full normalization pass over a raw reply.
pub fn normalize(raw: &str) -> String {
    let stripped = strip_code_fence(raw);
    let escaped = fix_literal_escapes(stripped);
    fix_unescaped_quotes(&escaped)
}

/// Strips a surrounding markdown code fence, if present.
///
/// Handles both ```` ```json ```` and bare ```` ``` ```` openers; content is
/// trimmed either way.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Rewrites lone `\n` and `\t` escape tokens so a preceding backslash is
/// doubled, turning `foo\nbar` (invalid inside a JSON string only when the
/// backslash itself was meant literally) into a parseable sequence.
///
/// `([^\\])\n` deliberately leaves already-doubled `\\n` alone.
fn fix_literal_escapes(input: &str) -> String {
    static NEWLINE: OnceLock<Regex> = OnceLock::new();
    static TAB: OnceLock<Regex> = OnceLock::new();
    let newline = NEWLINE.get_or_init(|| Regex::new(r"([^\\])\\n").expect("static pattern"));
    let tab = TAB.get_or_init(|| Regex::new(r"([^\\])\\t").expect("static pattern"));

    let pass = newline.replace_all(input, "$1\\\\n");
    tab.replace_all(&pass, "$1\\\\t").into_owned()
}

/// Escapes double quotes that appear inside string values.
///
/// Walks the text line by line, tracking whether the scanner currently sits
/// inside a JSON string (state persists across lines, since broken replies
/// split strings over newlines). A quote found while inside a string is kept
/// as the closing quote only when the next non-space character is a JSON
/// delimiter or the line ends; otherwise it is an interior quote and gets
/// escaped. Three quotes in a row still defeat the lookahead, the structural
/// stages catch those.
fn fix_unescaped_quotes(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 16);
    let mut in_string = false;

    for (line_idx, line) in input.lines().enumerate() {
        if line_idx > 0 {
            out.push('\n');
        }
        let chars: Vec<char> = line.chars().collect();
        for i in 0..chars.len() {
            let c = chars[i];
            if c != '"' {
                out.push(c);
                continue;
            }
            let escaped = i >= 1 && chars[i - 1] == '\\' && (i < 2 || chars[i - 2] != '\\');
            if escaped {
                out.push(c);
                continue;
            }
            if !in_string {
                in_string = true;
                out.push(c);
            } else if closes_string(&chars[i + 1..]) {
                in_string = false;
                out.push(c);
            } else {
                out.push('\\');
                out.push(c);
            }
        }
    }
    if input.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// True when the rest of the line reads like what follows a closing quote.
fn closes_string(rest: &[char]) -> bool {
    match rest.iter().find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => matches!(c, ',' | ':' | '}' | ']'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn strips_json_code_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(normalize(raw), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_code_fence() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(normalize(raw), "{\"a\": 1}");
    }

    #[test]
    fn unfenced_input_passes_through() {
        assert_eq!(normalize("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn doubles_literal_newline_tokens() {
        // The value holds a two-character `\n` token with a single backslash,
        // which strict JSON rejects only if the backslash was literal.
        let raw = r#"{"code": "SELECT 1;\nGO"}"#;
        let fixed = normalize(raw);
        assert!(fixed.contains(r"\\n"));
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["code"], r"SELECT 1;\nGO");
    }

    #[test]
    fn leaves_already_doubled_escapes_alone() {
        let raw = r#"{"code": "a\\nb"}"#;
        assert_eq!(normalize(raw), raw);
    }

    #[test]
    fn escapes_interior_quotes_in_values() {
        let raw = r#"{"scope": "uses "temp" tables"}"#;
        let fixed = normalize(raw);
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["scope"], r#"uses "temp" tables"#);
    }

    #[test]
    fn keeps_valid_json_intact() {
        let raw = r#"{"a": "x", "b": ["y", "z"], "c": {"d": "w"}}"#;
        assert_eq!(normalize(raw), raw);
        let _: Value = serde_json::from_str(&normalize(raw)).unwrap();
    }
}
