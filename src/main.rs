use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use tracelens::cli::{Cli, OutputFormat};
use tracelens::{report, AnalysisConfig, Analyzer};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_toml(path)?,
        None => AnalysisConfig::default(),
    };
    if cli.modules {
        config.include_modules = true;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    let raw = std::fs::read(&cli.trace)
        .with_context(|| format!("Failed to read trace file: {}", cli.trace.display()))?;

    let result = Analyzer::new(config)
        .analyze_slice(&raw)
        .with_context(|| format!("Failed to analyze trace: {}", cli.trace.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Text => report::write_report(&mut out, &result, cli.top)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &result)
                .context("Failed to serialize analysis result")?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    Ok(())
}
