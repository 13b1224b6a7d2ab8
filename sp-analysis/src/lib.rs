//! AI-assisted analysis of SQL stored procedures.
//!
//! Pipeline, in order:
//! - [`prompt`] — system prompt and per-procedure analysis prompt
//! - [`llm_service`] (external) — Bedrock invocation with bounded retries
//! - [`normalize`] — text-level cleanup of the raw reply
//! - [`repair`] — layered parse stages down to an infallible salvage
//! - [`record`] — the typed [`record::AnalysisRecord`] everything renders from
//! - [`render`] — deterministic docx and markdown reports
//!
//! A parse failure never aborts an analysis; it degrades through the repair
//! stages and surfaces on [`AnalysisOutcome::diagnostics`].

pub mod errors;
pub mod normalize;
pub mod prompt;
pub mod record;
pub mod render;
pub mod repair;
pub mod session;

use std::time::Instant;

use llm_service::{ModelInvoker, ModelTransport};
use tracing::{debug, warn};

pub use errors::{AnalysisResult, Error, RenderError};
pub use record::AnalysisRecord;
pub use repair::{RepairOutcome, RepairPipeline, RepairStage};
pub use session::{AnalysisContext, Diagnostics, SqlSource};

/// A completed analysis: the record plus its repair provenance.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub record: AnalysisRecord,
    pub diagnostics: Diagnostics,
}

/// Runs one full analysis: prompt, model invocation, normalization, repair.
///
/// # Errors
/// Only invocation-level failures abort (config, transport, retry
/// exhaustion, reply without a text block). Parse trouble degrades through
/// the repair pipeline instead and is reported on the diagnostics.
pub async fn analyze<T: ModelTransport>(
    ctx: &AnalysisContext,
    invoker: &ModelInvoker<T>,
) -> AnalysisResult<AnalysisOutcome> {
    let started = Instant::now();

    let analysis_prompt = prompt::build_analysis_prompt(&ctx.sql);
    let raw = invoker
        .invoke(prompt::SYSTEM_PROMPT, &analysis_prompt)
        .await?;

    let normalized = normalize::normalize(&raw);
    let outcome = RepairPipeline::with_default_parsers().repair(&normalized);

    if outcome.stage.is_degraded() {
        warn!(
            stage = outcome.stage.label(),
            errors = outcome.stage_errors.len(),
            "reply needed repair"
        );
    }
    debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        procedure = %outcome.record.procedure_name,
        "analysis complete"
    );

    Ok(AnalysisOutcome {
        record: outcome.record,
        diagnostics: Diagnostics {
            raw_response: raw,
            repair_stage: outcome.stage,
            stage_errors: outcome.stage_errors,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_service::{ContentBlock, InvokeReply, InvokeRequest};

    /// Returns a canned, well-formed analysis for any request.
    struct CannedTransport;

    const CANNED_REPLY: &str = r#"{
        "procedure_name": "usp_GetCustomerOrders",
        "complexity": "Medium",
        "scope": "Fetches and processes orders for one customer.",
        "optimizations": [
            {
                "type": "Replace Cursor with Set-Based Update",
                "line_number": "10-25",
                "existing_logic": "DECLARE order_cursor CURSOR FOR ...",
                "optimized_logic": "UPDATE Orders SET Status = 'Processed' WHERE ...",
                "explanation": "Set-based updates avoid row-by-row processing."
            }
        ],
        "summary": {
            "original_performance_issues": "Cursor-driven row-by-row updates.",
            "optimization_impact": "Significant on large order sets.",
            "implementation_difficulty": "Low"
        }
    }"#;

    impl ModelTransport for CannedTransport {
        async fn send(&self, _request: &InvokeRequest) -> llm_service::Result<InvokeReply> {
            Ok(InvokeReply {
                content: vec![ContentBlock::text(CANNED_REPLY)],
            })
        }
    }

    #[tokio::test]
    async fn sample_analysis_end_to_end() {
        let ctx = AnalysisContext::sample();
        let invoker = ModelInvoker::new(CannedTransport);

        let outcome = analyze(&ctx, &invoker).await.unwrap();

        assert_eq!(outcome.record.procedure_name, "usp_GetCustomerOrders");
        assert_eq!(outcome.record.complexity, "Medium");
        assert_eq!(outcome.record.optimizations.len(), 1);
        assert_eq!(
            outcome.record.optimizations[0].kind,
            "Replace Cursor with Set-Based Update"
        );
        assert_eq!(outcome.diagnostics.repair_stage, RepairStage::Strict);
        assert!(!outcome.diagnostics.is_degraded());

        // The same record drives both renderers.
        let docx = render::docx::build_docx(&outcome.record);
        let rows = docx
            .document
            .children
            .iter()
            .find_map(|child| match child {
                docx_rs::DocumentChild::Table(t) => Some(t.rows.len()),
                _ => None,
            })
            .unwrap();
        assert_eq!(rows, 2);

        let md = render::markdown::render(&outcome.record);
        assert!(md.contains("## Procedure Name: usp_GetCustomerOrders"));
    }

    /// Replies with a fenced, trailing-comma reply that needs repair.
    struct SloppyTransport;

    impl ModelTransport for SloppyTransport {
        async fn send(&self, _request: &InvokeRequest) -> llm_service::Result<InvokeReply> {
            let body = CANNED_REPLY.replace(
                r#""implementation_difficulty": "Low""#,
                r#""implementation_difficulty": "Low","#,
            );
            Ok(InvokeReply {
                content: vec![ContentBlock::text(&format!("```json\n{body}\n```"))],
            })
        }
    }

    #[tokio::test]
    async fn degraded_reply_is_repaired_and_flagged() {
        let ctx = AnalysisContext::sample();
        let invoker = ModelInvoker::new(SloppyTransport);

        let outcome = analyze(&ctx, &invoker).await.unwrap();

        assert_eq!(
            outcome.diagnostics.repair_stage,
            RepairStage::TrailingComma
        );
        assert!(outcome.diagnostics.is_degraded());
        assert_eq!(outcome.record.summary.implementation_difficulty, "Low");
        assert!(outcome.diagnostics.raw_response.starts_with("```json"));
    }
}
