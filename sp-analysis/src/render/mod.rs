//! Report rendering.
//!
//! Two deterministic renderers consume the same [`crate::record::AnalysisRecord`]:
//! [`docx`] produces the Word document, [`markdown`] the plain-text twin.
//! Shared wording lives here so the two outputs never drift apart.

pub mod docx;
pub mod markdown;

/// Title line of both reports.
pub const REPORT_TITLE: &str = "SQL Stored Procedure Analysis Report";

/// Shown in place of the steps/table when the record carries no suggestions.
pub const NO_SUGGESTIONS: &str = "No optimization suggestions were generated.";

/// Summary table column headers, in order.
pub const SUMMARY_HEADERS: [&str; 5] = [
    "Optimization Type",
    "Line Numbers",
    "Existing Logic",
    "Optimized Logic",
    "Explanation",
];

/// Empty and whitespace-only values render as `N/A`.
pub(crate) fn display_or_na(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() { "N/A" } else { trimmed }
}
