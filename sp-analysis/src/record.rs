//! Typed analysis result model.
//!
//! [`AnalysisRecord`] is the single artifact the repair pipeline produces and
//! the renderers consume. It is immutable once built and strictly
//! request-scoped: one record per analysis, discarded with the session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level fields a reply must carry to count as a valid record.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "procedure_name",
    "complexity",
    "scope",
    "optimizations",
    "summary",
];

/// Validated result of one analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Name of the analyzed routine, non-empty.
    pub procedure_name: String,
    /// Free-text severity/level label.
    pub complexity: String,
    /// Free-text description of the routine's purpose.
    pub scope: String,
    /// Suggested changes, in presentation order. May be empty.
    pub optimizations: Vec<OptimizationStep>,
    /// Overall assessment.
    pub summary: SummaryInfo,
}

/// One suggested optimization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationStep {
    /// Human-readable label of the optimization category.
    #[serde(rename = "type")]
    pub kind: String,
    /// Line-range token such as `"15-20"`, or `"N/A"` when unknown.
    #[serde(default)]
    pub line_number: String,
    /// Original code excerpt (plain text).
    #[serde(default)]
    pub existing_logic: String,
    /// Replacement code excerpt.
    #[serde(default)]
    pub optimized_logic: String,
    /// Rationale for the change.
    #[serde(default)]
    pub explanation: String,
}

/// Overall assessment attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryInfo {
    #[serde(default)]
    pub original_performance_issues: String,
    #[serde(default)]
    pub optimization_impact: String,
    #[serde(default)]
    pub implementation_difficulty: String,
}

impl AnalysisRecord {
    /// Converts an already-parsed JSON value into a record, enforcing that
    /// all five top-level fields are present.
    pub fn from_json_value(value: Value) -> Result<Self, String> {
        let Some(object) = value.as_object() else {
            return Err("top-level value is not an object".to_string());
        };
        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !object.contains_key(**field))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing required fields: {}", missing.join(", ")));
        }
        serde_json::from_value(value).map_err(|e| format!("field decode failed: {e}"))
    }

    /// Filesystem-safe stem for the report file names, derived from the
    /// procedure name.
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .procedure_name
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if stem.is_empty() {
            "procedure".to_string()
        } else {
            stem
        }
    }
}

impl OptimizationStep {
    /// Placeholder step emitted by the terminal salvage stage when no
    /// structured optimizations could be recovered.
    pub fn parse_failure_placeholder() -> Self {
        Self {
            kind: "General Optimization".to_string(),
            line_number: "N/A".to_string(),
            existing_logic: "-- Original procedure code (could not be parsed)".to_string(),
            optimized_logic: "-- See recommendations in the AI analysis text".to_string(),
            explanation: "The JSON response from the AI service could not be fully parsed. \
                          Please review the raw response in the debug output."
                .to_string(),
        }
    }
}

impl SummaryInfo {
    /// Placeholder summary emitted by the terminal salvage stage.
    pub fn parse_failure_placeholder() -> Self {
        Self {
            original_performance_issues: "The JSON response could not be fully parsed.".to_string(),
            optimization_impact: "See debug output for details.".to_string(),
            implementation_difficulty: "N/A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_value() -> Value {
        json!({
            "procedure_name": "usp_Demo",
            "complexity": "Low",
            "scope": "Does a thing.",
            "optimizations": [],
            "summary": {
                "original_performance_issues": "none",
                "optimization_impact": "none",
                "implementation_difficulty": "trivial"
            }
        })
    }

    #[test]
    fn accepts_complete_record() {
        let record = AnalysisRecord::from_json_value(full_value()).unwrap();
        assert_eq!(record.procedure_name, "usp_Demo");
        assert!(record.optimizations.is_empty());
    }

    #[test]
    fn rejects_missing_top_level_fields() {
        let mut value = full_value();
        value.as_object_mut().unwrap().remove("summary");
        value.as_object_mut().unwrap().remove("scope");
        let err = AnalysisRecord::from_json_value(value).unwrap_err();
        assert!(err.contains("scope"));
        assert!(err.contains("summary"));
    }

    #[test]
    fn rejects_non_object() {
        assert!(AnalysisRecord::from_json_value(json!([1, 2])).is_err());
    }

    #[test]
    fn step_type_field_maps_to_kind() {
        let step: OptimizationStep = serde_json::from_value(json!({
            "type": "Index usage",
            "line_number": "15-20"
        }))
        .unwrap();
        assert_eq!(step.kind, "Index usage");
        assert_eq!(step.line_number, "15-20");
        assert!(step.explanation.is_empty());
    }

    #[test]
    fn file_stem_sanitizes_awkward_names() {
        let mut record = AnalysisRecord::from_json_value(full_value()).unwrap();
        record.procedure_name = "dbo.usp GetOrders/2".to_string();
        assert_eq!(record.file_stem(), "dbo.usp_GetOrders_2");
        record.procedure_name = "   ".to_string();
        assert_eq!(record.file_stem(), "procedure");
    }
}
