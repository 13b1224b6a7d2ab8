//! Markdown report renderer.
//!
//! Mirrors the docx layout: header block, one section per optimization step
//! with fenced SQL snippets, the summary table, then the overall assessment.
//! Output is deterministic for a given record.

use crate::record::AnalysisRecord;

use super::{NO_SUGGESTIONS, REPORT_TITLE, SUMMARY_HEADERS, display_or_na};

/// Renders the full markdown report.
pub fn render(record: &AnalysisRecord) -> String {
    let mut out = String::with_capacity(1024);

    out.push_str(&format!("# {REPORT_TITLE}\n\n"));
    out.push_str(&format!(
        "## Procedure Name: {}\n\n",
        display_or_na(&record.procedure_name)
    ));
    out.push_str(&format!(
        "## Complexity: {}\n\n",
        display_or_na(&record.complexity)
    ));
    out.push_str(&format!("## Scope: {}\n\n", display_or_na(&record.scope)));

    out.push_str("## Optimization Steps:\n\n");
    if record.optimizations.is_empty() {
        out.push_str(NO_SUGGESTIONS);
        out.push_str("\n\n");
    } else {
        for (i, step) in record.optimizations.iter().enumerate() {
            out.push_str(&format!(
                "### Step {}: {}\n\n",
                i + 1,
                display_or_na(&step.kind)
            ));
            out.push_str(&format!(
                "**Line Numbers:** {}\n\n",
                display_or_na(&step.line_number)
            ));
            out.push_str("**Existing Logic:**\n\n");
            out.push_str(&code_block(&step.existing_logic));
            out.push_str("**Optimized Logic:**\n\n");
            out.push_str(&code_block(&step.optimized_logic));
            out.push_str(&format!("*{}*\n\n", display_or_na(&step.explanation)));
            out.push_str("---\n\n");
        }
    }

    out.push_str("## Summary Table\n\n");
    if record.optimizations.is_empty() {
        out.push_str(NO_SUGGESTIONS);
        out.push_str("\n\n");
    } else {
        out.push_str(&format!("| {} |\n", SUMMARY_HEADERS.join(" | ")));
        out.push_str(&format!(
            "|{}\n",
            " --- |".repeat(SUMMARY_HEADERS.len())
        ));
        for step in &record.optimizations {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                table_cell(&step.kind),
                table_cell(&step.line_number),
                table_cell(&step.existing_logic),
                table_cell(&step.optimized_logic),
                table_cell(&step.explanation),
            ));
        }
        out.push('\n');
    }

    out.push_str("## Overall Assessment:\n\n");
    out.push_str(&format!(
        "**Original Performance Issues:** {}\n\n",
        display_or_na(&record.summary.original_performance_issues)
    ));
    out.push_str(&format!(
        "**Optimization Impact:** {}\n\n",
        display_or_na(&record.summary.optimization_impact)
    ));
    out.push_str(&format!(
        "**Implementation Difficulty:** {}\n",
        display_or_na(&record.summary.implementation_difficulty)
    ));

    out
}

fn code_block(code: &str) -> String {
    format!("```sql\n{}\n```\n\n", display_or_na(code))
}

/// Flattens a value into a single table cell: pipes escaped, newlines
/// collapsed to spaces.
fn table_cell(value: &str) -> String {
    display_or_na(value)
        .replace('|', "\\|")
        .replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{OptimizationStep, SummaryInfo};

    fn record_with_steps(n: usize) -> AnalysisRecord {
        let step = |i: usize| OptimizationStep {
            kind: format!("Optimization {i}"),
            line_number: format!("{}-{}", i * 10, i * 10 + 5),
            existing_logic: "SELECT *\nFROM Orders".to_string(),
            optimized_logic: "SELECT OrderID\nFROM Orders".to_string(),
            explanation: "Narrower | faster reads".to_string(),
        };
        AnalysisRecord {
            procedure_name: "usp_Demo".to_string(),
            complexity: "Medium".to_string(),
            scope: "Demonstration.".to_string(),
            optimizations: (1..=n).map(step).collect(),
            summary: SummaryInfo {
                original_performance_issues: "Scans.".to_string(),
                optimization_impact: "Noticeable.".to_string(),
                implementation_difficulty: "Low.".to_string(),
            },
        }
    }

    #[test]
    fn empty_record_renders_no_suggestions_twice() {
        let md = render(&record_with_steps(0));
        assert!(md.starts_with(&format!("# {REPORT_TITLE}")));
        assert_eq!(md.matches(NO_SUGGESTIONS).count(), 2);
        assert!(!md.contains("```"));
        assert!(!md.contains("| "));
        assert!(md.contains("**Implementation Difficulty:** Low."));
    }

    #[test]
    fn one_step_renders_section_and_table_row() {
        let md = render(&record_with_steps(1));
        assert!(md.contains("### Step 1: Optimization 1"));
        assert!(md.contains("**Line Numbers:** 10-15"));
        // Two fenced snippets per step, two fence markers each.
        assert_eq!(md.matches("```").count(), 4);
        // Header row, separator, one data row.
        let pipe_lines = md.lines().filter(|l| l.starts_with('|')).count();
        assert_eq!(pipe_lines, 3);
    }

    #[test]
    fn table_cells_escape_pipes_and_flatten_newlines() {
        let md = render(&record_with_steps(1));
        assert!(md.contains("Narrower \\| faster reads"));
        let row = md
            .lines()
            .find(|l| l.starts_with("| Optimization 1"))
            .unwrap();
        assert!(row.contains("SELECT * FROM Orders"));
    }

    #[test]
    fn five_steps_scale_the_sections_and_rows() {
        let md = render(&record_with_steps(5));
        assert!(md.contains("### Step 5: Optimization 5"));
        assert_eq!(md.matches("```").count(), 20);
        let pipe_lines = md.lines().filter(|l| l.starts_with('|')).count();
        assert_eq!(pipe_lines, 7);
        assert_eq!(md.matches("---\n").count(), 5);
    }
}
