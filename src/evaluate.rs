//! Offline accuracy harness.
//!
//! Usage:
//!   evaluate --cases data/test_queries.json
//!   evaluate --cases data/test_queries.json --output report.json --concurrency 8

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use support_agent::application::{evaluate, EvalCase};
use support_agent::infrastructure::{build_stack, AppConfig};
use support_agent::telemetry::init_tracing;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "evaluate",
    version,
    about = "Runs labelled queries through the support pipeline and reports accuracy"
)]
struct Cli {
    /// JSON array of {query, expected_category, expected_answer_contains}
    #[arg(long, default_value = "data/test_queries.json")]
    cases: PathBuf,

    /// Also write the full report as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Queries in flight at once
    #[arg(long, default_value = "4")]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("evaluate=info,support_agent=warn");
    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.cases)
        .with_context(|| format!("reading {}", cli.cases.display()))?;
    let cases: Vec<EvalCase> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", cli.cases.display()))?;

    let config = AppConfig::load()?;
    let stack = build_stack(&config).await?;
    info!(cases = cases.len(), concurrency = cli.concurrency, "evaluating");

    let report = evaluate(&stack.orchestrator, &cases, cli.concurrency).await;
    println!("{}", report.render_markdown());

    if let Some(path) = cli.output {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    Ok(())
}
