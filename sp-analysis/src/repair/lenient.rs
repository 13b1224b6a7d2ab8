//! Pluggable lenient JSON parsers used by the structural repair stages.
//!
//! Each parser accepts text the strict parser rejected and tries to produce a
//! [`serde_json::Value`] anyway. Parsers are stateless unit structs behind a
//! small trait so the pipeline can run with any subset wired in.

use serde_json::Value;

/// A fallback parser for near-JSON text.
pub trait LenientParser {
    /// Short label used in stage error messages.
    fn name(&self) -> &'static str;

    /// Attempts to parse, returning a human-readable reason on failure.
    fn parse(&self, text: &str) -> Result<Value, String>;
}

/// Strict parse after stripping trailing commas before `}` and `]`.
pub struct TrailingCommaParser;

impl LenientParser for TrailingCommaParser {
    fn name(&self) -> &'static str {
        "trailing-comma"
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        let cleaned = strip_trailing_commas(text);
        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }
}

/// Removes commas whose next non-whitespace character closes a container.
/// String-aware: commas inside string values are untouched.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut prev_backslash = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if prev_backslash {
                prev_backslash = false;
            } else if c == '\\' {
                prev_backslash = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// JSON5 parse: tolerates single quotes, unquoted keys, comments and
/// trailing commas.
pub struct Json5Parser;

impl LenientParser for Json5Parser {
    fn name(&self) -> &'static str {
        "json5"
    }

    fn parse(&self, text: &str) -> Result<Value, String> {
        json5::from_str(text).map_err(|e| e.to_string())
    }
}
