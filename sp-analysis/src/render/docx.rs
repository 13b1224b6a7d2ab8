//! Word document renderer.
//!
//! Builds the report as a `docx_rs::Docx` tree first and packs it into the
//! zip container last, so tests can assert on the document structure without
//! unzipping anything. Layout: centered title, header lines, one heading
//! block per optimization step with indented monospace code, the shaded
//! summary table, then the overall assessment.

use std::io::Cursor;

use docx_rs::{
    AlignmentType, Docx, Paragraph, Run, RunFonts, Shading, ShdType, Style, StyleType, Table,
    TableCell, TableRow, WidthType,
};

use crate::errors::RenderError;
use crate::record::{AnalysisRecord, OptimizationStep};

use super::{NO_SUGGESTIONS, REPORT_TITLE, SUMMARY_HEADERS, display_or_na};

const CODE_FONT: &str = "Courier New";
/// Half-points; 20 renders as 10pt.
const CODE_SIZE: usize = 20;
/// Twentieths of a point (dxa); 360 is a quarter inch.
const CODE_INDENT: i32 = 360;
const SHADE_FILL: &str = "F2F2F2";
/// Column widths in dxa, summing to roughly the printable width.
const COLUMN_WIDTHS: [usize; 5] = [1728, 1152, 2160, 2160, 2880];
/// Horizontal rule between step sections.
const STEP_SEPARATOR: &str = "________________________________________";

/// Renders the record into the bytes of a .docx file.
pub fn render(record: &AnalysisRecord) -> Result<Vec<u8>, RenderError> {
    let mut buffer = Cursor::new(Vec::new());
    // pack surfaces the raw zip error; fold it into the docx error type.
    build_docx(record)
        .build()
        .pack(&mut buffer)
        .map_err(docx_rs::DocxError::from)?;
    Ok(buffer.into_inner())
}

/// Assembles the document tree. Split from [`render`] so the structure is
/// inspectable before packing.
pub(crate) fn build_docx(record: &AnalysisRecord) -> Docx {
    let mut docx = Docx::new()
        .add_style(
            Style::new("Title", StyleType::Paragraph)
                .name("Title")
                .size(36)
                .bold(),
        )
        .add_style(
            Style::new("Heading1", StyleType::Paragraph)
                .name("Heading 1")
                .size(28)
                .bold(),
        )
        .add_style(
            Style::new("Heading2", StyleType::Paragraph)
                .name("Heading 2")
                .size(26)
                .bold(),
        )
        .add_style(
            Style::new("Heading3", StyleType::Paragraph)
                .name("Heading 3")
                .size(24)
                .bold(),
        );

    docx = docx.add_paragraph(
        Paragraph::new()
            .style("Title")
            .align(AlignmentType::Center)
            .add_run(Run::new().add_text(REPORT_TITLE)),
    );

    docx = docx
        .add_paragraph(heading("Heading1", "Procedure Name"))
        .add_paragraph(
            Paragraph::new().add_run(
                Run::new()
                    .add_text(display_or_na(&record.procedure_name))
                    .bold(),
            ),
        )
        .add_paragraph(heading("Heading1", "Complexity"))
        .add_paragraph(plain_line(display_or_na(&record.complexity)))
        .add_paragraph(heading("Heading1", "Scope"))
        .add_paragraph(plain_line(display_or_na(&record.scope)));

    docx = docx.add_paragraph(heading("Heading1", "Optimization Steps"));
    if record.optimizations.is_empty() {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(NO_SUGGESTIONS)));
    } else {
        for (i, step) in record.optimizations.iter().enumerate() {
            docx = add_step(docx, i + 1, step);
        }
    }

    docx = docx.add_paragraph(heading("Heading1", "Summary Table"));
    if record.optimizations.is_empty() {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(NO_SUGGESTIONS)));
    } else {
        docx = docx.add_table(summary_table(&record.optimizations));
    }

    docx = docx.add_paragraph(heading("Heading1", "Overall Assessment"));
    docx = docx
        .add_paragraph(labeled_line(
            "Original Performance Issues: ",
            display_or_na(&record.summary.original_performance_issues),
        ))
        .add_paragraph(labeled_line(
            "Optimization Impact: ",
            display_or_na(&record.summary.optimization_impact),
        ))
        .add_paragraph(labeled_line(
            "Implementation Difficulty: ",
            display_or_na(&record.summary.implementation_difficulty),
        ));

    docx
}

fn add_step(docx: Docx, number: usize, step: &OptimizationStep) -> Docx {
    docx.add_paragraph(heading(
        "Heading2",
        &format!("Step {number}: {}", display_or_na(&step.kind)),
    ))
    .add_paragraph(labeled_line(
        "Line Numbers: ",
        display_or_na(&step.line_number),
    ))
    .add_paragraph(heading("Heading3", "Existing Logic"))
    .add_paragraph(code_paragraph(&step.existing_logic))
    .add_paragraph(heading("Heading3", "Optimized Logic"))
    .add_paragraph(code_paragraph(&step.optimized_logic))
    .add_paragraph(
        Paragraph::new().add_run(
            Run::new()
                .add_text(display_or_na(&step.explanation))
                .italic(),
        ),
    )
    .add_paragraph(Paragraph::new().add_run(Run::new().add_text(STEP_SEPARATOR)))
}

fn heading(style: &str, text: &str) -> Paragraph {
    Paragraph::new()
        .style(style)
        .add_run(Run::new().add_text(text))
}

fn plain_line(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn labeled_line(label: &str, value: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(label).bold())
        .add_run(Run::new().add_text(value))
}

fn code_paragraph(code: &str) -> Paragraph {
    Paragraph::new()
        .indent(Some(CODE_INDENT), None, Some(CODE_INDENT), None)
        .add_run(
            Run::new()
                .add_text(display_or_na(code))
                .fonts(RunFonts::new().ascii(CODE_FONT))
                .size(CODE_SIZE),
        )
}

fn summary_table(steps: &[OptimizationStep]) -> Table {
    let mut rows = vec![header_row()];
    for (i, step) in steps.iter().enumerate() {
        rows.push(data_row(step, i % 2 == 1));
    }
    Table::new(rows).set_grid(COLUMN_WIDTHS.to_vec())
}

fn header_row() -> TableRow {
    let cells = SUMMARY_HEADERS
        .iter()
        .zip(COLUMN_WIDTHS)
        .map(|(header, width)| {
            TableCell::new()
                .width(width, WidthType::Dxa)
                .shading(Shading::new().shd_type(ShdType::Clear).fill(SHADE_FILL))
                .add_paragraph(
                    Paragraph::new()
                        .align(AlignmentType::Center)
                        .add_run(Run::new().add_text(*header).bold()),
                )
        })
        .collect();
    TableRow::new(cells)
}

fn data_row(step: &OptimizationStep, shaded: bool) -> TableRow {
    let values = [
        display_or_na(&step.kind),
        display_or_na(&step.line_number),
        display_or_na(&step.existing_logic),
        display_or_na(&step.optimized_logic),
        display_or_na(&step.explanation),
    ];
    let cells = values
        .iter()
        .zip(COLUMN_WIDTHS)
        .map(|(value, width)| {
            let mut cell = TableCell::new().width(width, WidthType::Dxa);
            if shaded {
                cell = cell
                    .shading(Shading::new().shd_type(ShdType::Clear).fill(SHADE_FILL));
            }
            cell.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*value)))
        })
        .collect();
    TableRow::new(cells)
}
