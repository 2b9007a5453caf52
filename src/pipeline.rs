//! End-to-end trace analysis
//!
//! Stages run in a fixed order over owned intermediate values:
//!
//! ```text
//! payload → normalize → metadata / device info
//!         → hierarchy → self time → operators / kernels
//!         → summary → step-time breakdown → GPU utilization
//!         → memory → modules (opt-in) → recommendations
//! ```

use crate::aggregate::{aggregate_kernels, aggregate_operators, KernelSummary, OperatorSummary};
use crate::config::AnalysisConfig;
use crate::device::{extract_gpu_info, GpuInfo};
use crate::error::{AnalysisError, Result};
use crate::hierarchy::{build_hierarchy, compute_self_times, TimedEvent};
use crate::memory::{extract_memory_events, track_memory, MemoryEvent, MemoryProfile};
use crate::metadata::{extract_metadata, TraceMetadata};
use crate::modules::{parse_modules, ModuleSummary};
use crate::normalize::normalize_events;
use crate::payload::TracePayload;
use crate::recommend::{generate_recommendations, Recommendation, RecommendationInput};
use crate::step_time::{estimate_gpu_utilization, step_time_breakdown, StepTimeBucket};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Trace-wide totals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSummary {
    /// `end_time - start_time`, in microseconds
    pub total_duration: f64,
    /// Entries in the source event array, including undecodable ones
    pub event_count: usize,
    pub operator_count: usize,
    pub kernel_count: usize,
    /// Earliest timed event start
    pub start_time: f64,
    /// Latest timed event end
    pub end_time: f64,
}

impl TraceSummary {
    fn from_events(events: &[TimedEvent], event_count: usize, operators: usize, kernels: usize) -> Self {
        let start_time = events
            .iter()
            .map(|t| t.event().ts)
            .fold(f64::INFINITY, f64::min);
        let end_time = events
            .iter()
            .map(|t| t.event().end())
            .fold(f64::NEG_INFINITY, f64::max);

        Self {
            total_duration: end_time - start_time,
            event_count,
            operator_count: operators,
            kernel_count: kernels,
            start_time,
            end_time,
        }
    }
}

/// Everything derived from one trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub events: Vec<TimedEvent>,
    pub metadata: TraceMetadata,
    pub operators: Vec<OperatorSummary>,
    pub kernels: Vec<KernelSummary>,
    pub memory_events: Vec<MemoryEvent>,
    /// Empty unless module attribution is enabled
    pub modules: Vec<ModuleSummary>,
    pub step_time_breakdown: Vec<StepTimeBucket>,
    pub gpu_utilization: f64,
    pub gpu_info: GpuInfo,
    pub recommendations: Vec<Recommendation>,
    pub summary: TraceSummary,
    pub memory_profile: MemoryProfile,
}

impl AnalysisResult {
    /// Look up the timed event an operator invocation points at
    pub fn event(&self, id: usize) -> Option<&TimedEvent> {
        self.events.get(id)
    }
}

/// Trace analyzer
///
/// # Example
///
/// ```
/// use tracelens::{AnalysisConfig, Analyzer};
///
/// let trace = r#"[{"ph":"X","name":"aten::add","cat":"cpu_op","pid":1,"tid":1,"ts":0,"dur":10}]"#;
/// let result = Analyzer::new(AnalysisConfig::default()).analyze(trace)?;
/// assert_eq!(result.operators[0].name, "aten::add");
/// # Ok::<(), tracelens::AnalysisError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a JSON trace string
    pub fn analyze(&self, raw: &str) -> Result<AnalysisResult> {
        self.run(TracePayload::parse(raw)?)
    }

    /// Analyze raw JSON bytes
    pub fn analyze_slice(&self, raw: &[u8]) -> Result<AnalysisResult> {
        self.run(TracePayload::parse_slice(raw)?)
    }

    /// Analyze an already-parsed JSON value
    pub fn analyze_value(&self, value: &Value) -> Result<AnalysisResult> {
        self.run(TracePayload::from_value(value.clone())?)
    }

    /// Run every stage over a decoded payload
    pub fn run(&self, payload: TracePayload) -> Result<AnalysisResult> {
        let normalized = normalize_events(&payload.events);
        let metadata = extract_metadata(&normalized);
        let gpu_info = extract_gpu_info(payload.device_properties.as_ref(), &normalized);

        let hierarchy = build_hierarchy(&normalized);
        if hierarchy.is_empty() {
            return Err(AnalysisError::no_complete_events());
        }
        let events = compute_self_times(hierarchy);

        let operators = aggregate_operators(&events);
        let kernels = aggregate_kernels(&events);
        let summary = TraceSummary::from_events(
            &events,
            payload.raw_event_count,
            operators.len(),
            kernels.len(),
        );

        let step_time_breakdown = step_time_breakdown(&events);
        let gpu_utilization = estimate_gpu_utilization(&events, summary.total_duration);

        let memory_events = extract_memory_events(&normalized);
        let memory_profile = track_memory(&normalized);

        let modules = if self.config.include_modules {
            parse_modules(&events)
        } else {
            Vec::new()
        };

        let recommendations = generate_recommendations(
            &RecommendationInput {
                step_time_breakdown: &step_time_breakdown,
                gpu_utilization,
                kernels: &kernels,
                operators: &operators,
                summary: &summary,
            },
            &self.config.thresholds,
        );

        debug!(
            events = events.len(),
            total_duration = summary.total_duration,
            gpu_utilization,
            "Trace analysis complete"
        );

        Ok(AnalysisResult {
            events,
            metadata,
            operators,
            kernels,
            memory_events,
            modules,
            step_time_breakdown,
            gpu_utilization,
            gpu_info,
            recommendations,
            summary,
            memory_profile,
        })
    }
}

/// Analyze a JSON trace string with the default configuration
pub fn analyze(raw: &str) -> Result<AnalysisResult> {
    Analyzer::default().analyze(raw)
}

/// Analyze a parsed JSON value with the default configuration
pub fn analyze_value(value: &Value) -> Result<AnalysisResult> {
    Analyzer::default().analyze_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::StepCategory;
    use serde_json::json;

    #[test]
    fn test_begin_end_pair() {
        let result = analyze(
            r#"[{"ph":"B","name":"f","pid":1,"tid":1,"ts":0},
                {"ph":"E","name":"f","pid":1,"tid":1,"ts":100}]"#,
        )
        .unwrap();

        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].event().dur, 100.0);
        assert_eq!(result.events[0].self_time, 100.0);
        assert_eq!(result.operators.len(), 1);
        assert_eq!(result.operators[0].name, "f");
        assert_eq!(result.operators[0].calls, 1);
    }

    #[test]
    fn test_summary() {
        let result = analyze_value(&json!({
            "traceEvents": [
                {"ph": "M", "name": "process_name", "pid": 1, "args": {"name": "python"}},
                {"ph": "X", "name": "step", "cat": "cpu_op", "pid": 1, "tid": 1, "ts": 50, "dur": 100},
                {"ph": "X", "name": "sgemm", "cat": "kernel", "pid": 1, "tid": 7, "ts": 80, "dur": 120},
            ]
        }))
        .unwrap();

        assert_eq!(result.summary.start_time, 50.0);
        assert_eq!(result.summary.end_time, 200.0);
        assert_eq!(result.summary.total_duration, 150.0);
        assert_eq!(result.summary.event_count, 3);
        assert_eq!(result.summary.operator_count, 2);
        assert_eq!(result.summary.kernel_count, 1);
        assert_eq!(result.gpu_utilization, 80.0);
        assert_eq!(result.metadata.process_name(&1.into()), Some("python"));
    }

    #[test]
    fn test_no_complete_events() {
        let err = analyze(r#"[{"ph":"M","name":"process_name","pid":1,"args":{"name":"x"}}]"#)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyTrace(_)));
        assert_eq!(err.to_string(), "Empty trace: no complete events found in trace");
    }

    #[test]
    fn test_errors_propagate() {
        assert!(matches!(analyze("{"), Err(AnalysisError::Parse(_))));
        assert!(matches!(analyze(r#"{"foo":1}"#), Err(AnalysisError::Format)));
        assert!(matches!(analyze("[]"), Err(AnalysisError::EmptyTrace(_))));
    }

    #[test]
    fn test_modules_opt_in() {
        let trace = r#"[{"ph":"X","name":"aten::linear","pid":1,"tid":1,"ts":0,"dur":5,"args":{"module":"model.fc"}}]"#;

        assert!(analyze(trace).unwrap().modules.is_empty());

        let config = AnalysisConfig {
            include_modules: true,
            ..Default::default()
        };
        let result = Analyzer::new(config).analyze(trace).unwrap();
        assert_eq!(result.modules.len(), 1);
        assert_eq!(result.modules[0].name, "model.fc");
    }

    #[test]
    fn test_dataloader_recommendation() {
        let result = analyze_value(&json!([
            {"ph": "X", "name": "enumerate(DataLoader)", "cat": "user_annotation", "pid": 1, "tid": 1, "ts": 0, "dur": 30},
            {"ph": "X", "name": "elementwise_kernel", "cat": "kernel", "pid": 1, "tid": 7, "ts": 0, "dur": 100},
        ]))
        .unwrap();

        let dl = result
            .step_time_breakdown
            .iter()
            .find(|b| b.name == StepCategory::DataLoader)
            .unwrap();
        assert!(dl.percentage > 10.0);
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].category, "DataLoader");
    }

    #[test]
    fn test_invocation_lookup() {
        let result = analyze(
            r#"[{"ph":"X","name":"aten::mm","pid":1,"tid":1,"ts":0,"dur":5,"args":{"Input Dims":[[2,2]]}}]"#,
        )
        .unwrap();
        let id = result.operators[0].invocations[0].event_id;
        let event = result.event(id).unwrap();
        assert!(event.event().arg("Input Dims").is_some());
    }

    #[test]
    fn test_serialization_is_stable() {
        let trace = r#"[
            {"ph":"X","name":"b","cat":"cpu_op","pid":1,"tid":2,"ts":5,"dur":5},
            {"ph":"X","name":"a","cat":"kernel","pid":1,"tid":1,"ts":0,"dur":10},
            {"ph":"C","name":"GPU Memory","pid":1,"ts":1,"args":{"allocated":10}}
        ]"#;
        let first = serde_json::to_string(&analyze(trace).unwrap()).unwrap();
        let second = serde_json::to_string(&analyze(trace).unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"stepTimeBreakdown\""));
        assert!(first.contains("\"memoryProfile\""));
    }
}
