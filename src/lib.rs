//! tracelens - Trace analytics for deep-learning profiler output
//!
//! Ingests a Chrome Trace Event Format trace (as written by the PyTorch
//! profiler) and derives per-thread call hierarchies, self/total time per
//! operator and GPU kernel, a step-time category breakdown, a GPU
//! utilization estimate and rule-based performance recommendations.
//!
//! ```
//! let trace = r#"[
//!     {"ph":"B","name":"f","pid":1,"tid":1,"ts":0},
//!     {"ph":"E","name":"f","pid":1,"tid":1,"ts":100}
//! ]"#;
//! let result = tracelens::analyze(trace)?;
//! assert_eq!(result.events[0].self_time, 100.0);
//! # Ok::<(), tracelens::AnalysisError>(())
//! ```

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod format;
pub mod hierarchy;
pub mod memory;
pub mod metadata;
pub mod modules;
pub mod normalize;
pub mod payload;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod step_time;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use pipeline::{analyze, analyze_value, AnalysisResult, Analyzer, TraceSummary};
