//! Layered JSON repair pipeline.
//!
//! Stages run strictly in order and stop at the first success:
//! - strict parse of the normalized text
//! - single-quote insertion for an unterminated string at the reported
//!   error position
//! - lenient parse with trailing-comma stripping
//! - balanced-span extraction (outermost `{..}`) followed by strict parse
//! - relaxed (JSON5) parse of the extracted span
//! - salvage: regex field scraping plus placeholders, never fails
//!
//! Every stage failure is recorded; the outcome reports which stage finally
//! produced the record so callers can tell degraded results apart.

pub mod lenient;

use serde_json::Value;
use tracing::{debug, warn};

use crate::record::{AnalysisRecord, OptimizationStep, SummaryInfo};
use lenient::{Json5Parser, LenientParser, TrailingCommaParser};

/// Which stage produced the final record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStage {
    Strict,
    QuoteFix,
    TrailingComma,
    Extract,
    Relaxed,
    Salvage,
}

impl RepairStage {
    /// Stable label for logs and the debug sidecar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::QuoteFix => "quote-fix",
            Self::TrailingComma => "trailing-comma",
            Self::Extract => "extract",
            Self::Relaxed => "relaxed",
            Self::Salvage => "salvage",
        }
    }

    /// Anything past the strict parse means the reply needed repair.
    pub fn is_degraded(self) -> bool {
        !matches!(self, Self::Strict)
    }
}

/// Result of running the pipeline: always a record, plus provenance.
#[derive(Debug)]
pub struct RepairOutcome {
    pub record: AnalysisRecord,
    pub stage: RepairStage,
    /// One entry per stage that ran and failed, in order.
    pub stage_errors: Vec<String>,
}

/// Why the strict stage rejected its input.
enum StrictFailure {
    /// Text did not parse at all.
    Syntax(serde_json::Error),
    /// Text parsed but the value is not a usable record.
    Invalid(String),
}

/// The repair pipeline, with optional lenient parser slots.
pub struct RepairPipeline<'a> {
    lenient: Option<&'a dyn LenientParser>,
    relaxed: Option<&'a dyn LenientParser>,
}

static TRAILING_COMMA: TrailingCommaParser = TrailingCommaParser;
static JSON5: Json5Parser = Json5Parser;

impl<'a> RepairPipeline<'a> {
    /// Pipeline with no lenient parsers; those stages are skipped with a note.
    pub fn new() -> Self {
        Self {
            lenient: None,
            relaxed: None,
        }
    }

    /// Pipeline with the stock trailing-comma and JSON5 parsers wired in.
    pub fn with_default_parsers() -> Self {
        Self {
            lenient: Some(&TRAILING_COMMA),
            relaxed: Some(&JSON5),
        }
    }

    /// Runs the pipeline over normalized reply text. Infallible: the salvage
    /// stage always produces a record.
    pub fn repair(&self, text: &str) -> RepairOutcome {
        let mut errors = Vec::new();

        // Strict parse first.
        let syntax_error = match parse_strict(text) {
            Ok(record) => {
                return RepairOutcome {
                    record,
                    stage: RepairStage::Strict,
                    stage_errors: errors,
                };
            }
            Err(StrictFailure::Syntax(e)) => {
                errors.push(format!("strict: {e}"));
                Some(e)
            }
            Err(StrictFailure::Invalid(reason)) => {
                errors.push(format!("strict: {reason}"));
                None
            }
        };

        // One missing quote at the reported position.
        if let Some(e) = &syntax_error {
            match repair_unterminated_string(text, e) {
                Ok(Some(record)) => {
                    debug!("recovered reply by inserting a closing quote");
                    return RepairOutcome {
                        record,
                        stage: RepairStage::QuoteFix,
                        stage_errors: errors,
                    };
                }
                Ok(None) => errors.push("quote-fix: not an unterminated-string error".to_string()),
                Err(reason) => errors.push(format!("quote-fix: {reason}")),
            }
        } else {
            errors.push("quote-fix: skipped, input parsed but was invalid".to_string());
        }

        // Lenient parse of the whole text.
        match self.try_parser(self.lenient, text) {
            Ok(record) => {
                return RepairOutcome {
                    record,
                    stage: RepairStage::TrailingComma,
                    stage_errors: errors,
                };
            }
            Err(reason) => errors.push(reason),
        }

        // Pull the outermost object out of surrounding prose.
        let span = extract_balanced_span(text);
        if let Some(span) = span {
            match parse_strict(span) {
                Ok(record) => {
                    return RepairOutcome {
                        record,
                        stage: RepairStage::Extract,
                        stage_errors: errors,
                    };
                }
                Err(StrictFailure::Syntax(e)) => errors.push(format!("extract: {e}")),
                Err(StrictFailure::Invalid(reason)) => errors.push(format!("extract: {reason}")),
            }
        } else {
            errors.push("extract: no balanced object span found".to_string());
        }

        // Relaxed parse of the span (or the whole text if none).
        let relaxed_input = span.unwrap_or(text);
        match self.try_parser(self.relaxed, relaxed_input) {
            Ok(record) => {
                return RepairOutcome {
                    record,
                    stage: RepairStage::Relaxed,
                    stage_errors: errors,
                };
            }
            Err(reason) => errors.push(reason),
        }

        // Salvage what we can.
        warn!(
            stages_failed = errors.len(),
            "all parse stages failed, salvaging fields from raw text"
        );
        RepairOutcome {
            record: salvage_record(text),
            stage: RepairStage::Salvage,
            stage_errors: errors,
        }
    }

    fn try_parser(
        &self,
        parser: Option<&dyn LenientParser>,
        text: &str,
    ) -> Result<AnalysisRecord, String> {
        let Some(parser) = parser else {
            return Err("lenient parser not configured".to_string());
        };
        let value = parser
            .parse(text)
            .map_err(|e| format!("{}: {e}", parser.name()))?;
        AnalysisRecord::from_json_value(value).map_err(|e| format!("{}: {e}", parser.name()))
    }
}

impl Default for RepairPipeline<'_> {
    fn default() -> Self {
        Self::with_default_parsers()
    }
}

fn parse_strict(text: &str) -> Result<AnalysisRecord, StrictFailure> {
    let value: Value = serde_json::from_str(text).map_err(StrictFailure::Syntax)?;
    AnalysisRecord::from_json_value(value).map_err(StrictFailure::Invalid)
}

/// Inserts one `"` where the strict parser choked, when the error is in the
/// unterminated-string class and the failing line holds an odd number of
/// unescaped quotes up to that position.
///
/// serde_json attributes the newline that terminates a broken string to
/// column 0 of the *next* line, so a zero column is mapped back to the end of
/// the previous line. The quote goes in before any trailing `,` there, since
/// a swallowed member separator must stay outside the repaired string.
///
/// Returns `Ok(None)` when the error class does not apply.
fn repair_unterminated_string(
    text: &str,
    error: &serde_json::Error,
) -> Result<Option<AnalysisRecord>, String> {
    if !error.to_string().contains("while parsing a string") {
        return Ok(None);
    }
    let lines: Vec<&str> = text.lines().collect();

    // 1-based error position -> 0-based line index and prefix length.
    let (line_idx, prefix_len) = if error.column() == 0 {
        let idx = error
            .line()
            .checked_sub(2)
            .ok_or("error position out of range")?;
        let len = lines
            .get(idx)
            .ok_or("error position past end of input")?
            .chars()
            .count();
        (idx, len)
    } else {
        let idx = error.line().checked_sub(1).ok_or("error line out of range")?;
        (idx, error.column().saturating_sub(1))
    };
    let line = *lines
        .get(line_idx)
        .ok_or("error position past end of input")?;

    let chars: Vec<char> = line.chars().collect();
    let prefix_len = prefix_len.min(chars.len());
    let prefix: String = chars[..prefix_len].iter().collect();
    if count_unescaped_quotes(&prefix) % 2 == 0 {
        return Err("quote count at error position is balanced".to_string());
    }

    // Close the string at the end of the value text, keeping trailing
    // whitespace and a swallowed separator comma outside of it.
    let mut insert_at = prefix_len;
    while insert_at > 0 && chars[insert_at - 1].is_whitespace() {
        insert_at -= 1;
    }
    if insert_at > 0 && chars[insert_at - 1] == ',' {
        insert_at -= 1;
    }

    let mut fixed_line = String::with_capacity(line.len() + 1);
    fixed_line.extend(&chars[..insert_at]);
    fixed_line.push('"');
    fixed_line.extend(&chars[insert_at..]);

    let repaired: String = lines
        .iter()
        .enumerate()
        .map(|(i, l)| if i == line_idx { fixed_line.as_str() } else { *l })
        .collect::<Vec<&str>>()
        .join("\n");

    match parse_strict(&repaired) {
        Ok(record) => Ok(Some(record)),
        Err(StrictFailure::Syntax(e)) => Err(format!("reparse failed: {e}")),
        Err(StrictFailure::Invalid(reason)) => Err(format!("reparse invalid: {reason}")),
    }
}

fn count_unescaped_quotes(s: &str) -> usize {
    let chars: Vec<char> = s.chars().collect();
    let mut count = 0;
    for (i, &c) in chars.iter().enumerate() {
        if c == '"' {
            let escaped = i >= 1 && chars[i - 1] == '\\' && (i < 2 || chars[i - 2] != '\\');
            if !escaped {
                count += 1;
            }
        }
    }
    count
}

/// The outermost `{ .. }` span, when both braces exist in order.
fn extract_balanced_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Regex-scrapes whatever scalar fields survive in the broken text and fills
/// the rest with placeholders.
fn salvage_record(text: &str) -> AnalysisRecord {
    AnalysisRecord {
        procedure_name: scrape_field(text, "procedure_name")
            .unwrap_or_else(|| "Unknown".to_string()),
        complexity: scrape_field(text, "complexity").unwrap_or_else(|| "Medium".to_string()),
        scope: scrape_field(text, "scope").unwrap_or_else(|| {
            "Analysis could not be fully parsed from the AI response.".to_string()
        }),
        optimizations: vec![OptimizationStep::parse_failure_placeholder()],
        summary: SummaryInfo::parse_failure_placeholder(),
    }
}

fn scrape_field(text: &str, field: &str) -> Option<String> {
    let pattern = format!(r#""{field}"\s*:\s*"([^"]+)""#);
    let re = regex::Regex::new(&pattern).ok()?;
    re.captures(text)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> String {
        r#"{
            "procedure_name": "usp_GetCustomerOrders",
            "complexity": "High",
            "scope": "Fetches orders with aggregates.",
            "optimizations": [
                {
                    "type": "Index usage optimization",
                    "line_number": "15-20",
                    "existing_logic": "SELECT * FROM Orders",
                    "optimized_logic": "SELECT OrderID FROM Orders",
                    "explanation": "Narrower reads."
                }
            ],
            "summary": {
                "original_performance_issues": "Full scans.",
                "optimization_impact": "Large.",
                "implementation_difficulty": "Low."
            }
        }"#
        .to_string()
    }

    #[test]
    fn strict_input_passes_through_without_errors() {
        let outcome = RepairPipeline::with_default_parsers().repair(&valid_json());
        assert_eq!(outcome.stage, RepairStage::Strict);
        assert!(!outcome.stage.is_degraded());
        assert!(outcome.stage_errors.is_empty());
        assert_eq!(outcome.record.procedure_name, "usp_GetCustomerOrders");
    }

    #[test]
    fn missing_terminal_quote_is_repaired() {
        let expected = RepairPipeline::with_default_parsers()
            .repair(&valid_json())
            .record;
        // Same document with the closing quote of one value dropped; the
        // member separator comma is swallowed into the broken string.
        let broken = valid_json().replace(
            r#""scope": "Fetches orders with aggregates.","#,
            r#""scope": "Fetches orders with aggregates.,"#,
        );
        assert_ne!(broken, valid_json());

        let outcome = RepairPipeline::with_default_parsers().repair(&broken);
        assert_eq!(outcome.stage, RepairStage::QuoteFix);
        assert_eq!(outcome.record, expected);
        assert_eq!(outcome.stage_errors.len(), 1);
    }

    #[test]
    fn missing_quote_on_last_member_is_repaired() {
        let expected = RepairPipeline::with_default_parsers()
            .repair(&valid_json())
            .record;
        // The broken value sits right before a closing brace, no comma.
        let broken = valid_json().replace(
            r#""implementation_difficulty": "Low.""#,
            r#""implementation_difficulty": "Low."#,
        );

        let outcome = RepairPipeline::with_default_parsers().repair(&broken);
        assert_eq!(outcome.stage, RepairStage::QuoteFix);
        assert_eq!(outcome.record, expected);
    }

    #[test]
    fn truncated_reply_falls_past_the_quote_stage() {
        // Unterminated string at end of input: inserting a quote cannot fix
        // the missing members, so the pipeline keeps degrading.
        let truncated = r#"{"procedure_name": "usp_Cut"#;
        let outcome = RepairPipeline::with_default_parsers().repair(truncated);
        assert_eq!(outcome.stage, RepairStage::Salvage);
        assert!(
            outcome
                .stage_errors
                .iter()
                .any(|e| e.starts_with("quote-fix:"))
        );
    }

    #[test]
    fn trailing_commas_are_handled_by_the_lenient_stage() {
        let broken = valid_json().replace(
            r#""implementation_difficulty": "Low.""#,
            r#""implementation_difficulty": "Low.","#,
        );
        let outcome = RepairPipeline::with_default_parsers().repair(&broken);
        assert_eq!(outcome.stage, RepairStage::TrailingComma);
        assert_eq!(outcome.record.summary.implementation_difficulty, "Low.");
    }

    #[test]
    fn prose_wrapped_json_is_extracted() {
        let wrapped = format!(
            "Here is the analysis you asked for:\n\n{}\n\nLet me know if you need more detail.",
            valid_json()
        );
        let outcome = RepairPipeline::with_default_parsers().repair(&wrapped);
        assert_eq!(outcome.stage, RepairStage::Extract);
        assert_eq!(outcome.record.complexity, "High");
    }

    #[test]
    fn single_quoted_json_falls_through_to_relaxed() {
        let single_quoted = r#"Analysis follows. {
            'procedure_name': 'usp_Single',
            'complexity': 'Low',
            'scope': 'Demo.',
            'optimizations': [],
            'summary': {
                'original_performance_issues': 'none',
                'optimization_impact': 'none',
                'implementation_difficulty': 'none'
            }
        }"#;
        let outcome = RepairPipeline::with_default_parsers().repair(single_quoted);
        assert_eq!(outcome.stage, RepairStage::Relaxed);
        assert_eq!(outcome.record.procedure_name, "usp_Single");
    }

    #[test]
    fn garbage_input_salvages_placeholders() {
        let outcome =
            RepairPipeline::with_default_parsers().repair("I could not produce the analysis.");
        assert_eq!(outcome.stage, RepairStage::Salvage);
        assert!(outcome.stage.is_degraded());
        assert_eq!(outcome.record.procedure_name, "Unknown");
        assert_eq!(outcome.record.optimizations.len(), 1);
        assert!(!outcome.record.scope.is_empty());
        assert!(!outcome.stage_errors.is_empty());
    }

    #[test]
    fn salvage_scrapes_surviving_fields() {
        let broken = r#"{"procedure_name": "usp_Broken", "complexity": "High", "scope": "Half a reply and then it just stops"#;
        let outcome = RepairPipeline::with_default_parsers().repair(broken);
        assert_eq!(outcome.stage, RepairStage::Salvage);
        assert_eq!(outcome.record.procedure_name, "usp_Broken");
        assert_eq!(outcome.record.complexity, "High");
    }

    #[test]
    fn pipeline_without_parsers_still_terminates() {
        let outcome = RepairPipeline::new().repair("not json at all");
        assert_eq!(outcome.stage, RepairStage::Salvage);
        assert!(
            outcome
                .stage_errors
                .iter()
                .any(|e| e.contains("not configured"))
        );
    }
}
