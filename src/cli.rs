//! CLI argument parsing for tracelens

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report (default)
    Text,
    /// Pretty-printed JSON of the full analysis result
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "tracelens")]
#[command(version)]
#[command(about = "Analyze deep-learning profiler traces (Chrome Trace Event Format)", long_about = None)]
pub struct Cli {
    /// Trace file to analyze (JSON)
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Rows per table in the text report
    #[arg(long = "top", value_name = "N", default_value = "10")]
    pub top: usize,

    /// Attribute time to PyTorch modules from event args
    #[arg(long = "modules")]
    pub modules: bool,

    /// Load analysis settings from a TOML file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
