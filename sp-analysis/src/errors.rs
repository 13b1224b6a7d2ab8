//! Crate-wide error hierarchy for sp-analysis.
//!
//! Transport/config failures abort an analysis and surface here; parse
//! failures never do — they degrade through the repair pipeline and are
//! reported on the outcome's diagnostics instead.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type AnalysisResult<T> = Result<T, Error>;

/// Root error type for the sp-analysis crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Remote model invocation failure (config, transport, retry exhaustion,
    /// malformed reply shape).
    #[error(transparent)]
    Llm(#[from] llm_service::LlmServiceError),

    /// Report rendering failure.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Document rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The docx archive could not be assembled.
    #[error("docx packing failed: {0}")]
    Docx(#[from] docx_rs::DocxError),
}
