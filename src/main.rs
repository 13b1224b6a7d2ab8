use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use llm_service::{BedrockService, ModelConfig, ModelInvoker};
use sp_analysis::{AnalysisContext, analyze, render};

/// AI-assisted SQL stored procedure analyzer.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the stored procedure .sql file to analyze.
    input: Option<PathBuf>,

    /// Analyze the bundled sample procedure instead of a file.
    #[arg(long, conflicts_with = "input")]
    sample: bool,

    /// Directory the report files are written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; real environments set variables directly.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let ctx = match (&cli.input, cli.sample) {
        (Some(path), _) => {
            let sql = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "procedure.sql".to_string());
            AnalysisContext::from_upload(name, sql)
        }
        (None, true) => AnalysisContext::sample(),
        (None, false) => anyhow::bail!("pass a .sql file or --sample"),
    };

    let config = ModelConfig::from_secrets().context("loading model configuration")?;
    let transport = BedrockService::new(config).context("building Bedrock client")?;
    let invoker = ModelInvoker::new(transport);

    let outcome = analyze(&ctx, &invoker).await?;
    let stem = outcome.record.file_stem();

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    let docx_path = cli.out_dir.join(format!("{stem}_analysis.docx"));
    let docx_bytes = render::docx::render(&outcome.record).context("rendering docx report")?;
    fs::write(&docx_path, docx_bytes)
        .with_context(|| format!("writing {}", docx_path.display()))?;

    let md_path = cli.out_dir.join(format!("{stem}_analysis.md"));
    fs::write(&md_path, render::markdown::render(&outcome.record))
        .with_context(|| format!("writing {}", md_path.display()))?;

    println!("Procedure:  {}", outcome.record.procedure_name);
    println!("Complexity: {}", outcome.record.complexity);
    println!("Steps:      {}", outcome.record.optimizations.len());
    println!("Reports:    {}", docx_path.display());
    println!("            {}", md_path.display());

    if outcome.diagnostics.is_degraded() {
        let debug_path = cli.out_dir.join(format!("{stem}_analysis.debug.txt"));
        fs::write(&debug_path, outcome.diagnostics.render_debug())
            .with_context(|| format!("writing {}", debug_path.display()))?;
        eprintln!(
            "warning: model reply needed repair (stage: {}), details in {}",
            outcome.diagnostics.repair_stage.label(),
            debug_path.display()
        );
    }

    Ok(())
}
