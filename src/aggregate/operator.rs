//! Operator aggregation (device vs. host time split)

use crate::classify::is_gpu_event;
use crate::hierarchy::TimedEvent;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One call of an operator, linked back to its timed event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    /// Id of the `TimedEvent` (args live there)
    pub event_id: usize,
    pub timestamp: f64,
    pub duration: f64,
    pub self_time: f64,
}

/// Summary statistics for all events sharing a name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSummary {
    pub name: String,
    /// Category of the first call, `"unknown"` if absent
    pub category: String,
    pub calls: u64,
    pub device_self_duration: f64,
    pub device_total_duration: f64,
    pub host_self_duration: f64,
    pub host_total_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    /// `(device_total + host_total) / calls`
    pub avg_duration: f64,
    /// Share of all operators' device self time
    ///
    /// The denominator only counts device time, so host-only operators are
    /// always 0 here.
    pub self_cuda_time_percent: f64,
    /// Distinct `Input Dims` signatures, compact JSON, first-seen order
    pub input_shapes: Vec<String>,
    pub invocations: Vec<Invocation>,
}

impl OperatorSummary {
    fn new(name: &str, category: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            category: category.unwrap_or("unknown").to_string(),
            calls: 0,
            device_self_duration: 0.0,
            device_total_duration: 0.0,
            host_self_duration: 0.0,
            host_total_duration: 0.0,
            min_duration: f64::INFINITY,
            max_duration: 0.0,
            avg_duration: 0.0,
            self_cuda_time_percent: 0.0,
            input_shapes: Vec::new(),
            invocations: Vec::new(),
        }
    }

    /// Device plus host total time
    pub fn total_duration(&self) -> f64 {
        self.device_total_duration + self.host_total_duration
    }
}

/// Group timed events by name into operator summaries
///
/// Output is sorted by device self time, descending.
pub fn aggregate_operators(events: &[TimedEvent]) -> Vec<OperatorSummary> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<OperatorSummary> = Vec::new();
    let mut seen_shapes: Vec<HashSet<String>> = Vec::new();

    for timed in events {
        let event = timed.event();
        let slot = *slots.entry(event.name.as_str()).or_insert_with(|| {
            summaries.push(OperatorSummary::new(&event.name, event.category.as_deref()));
            seen_shapes.push(HashSet::new());
            summaries.len() - 1
        });
        let op = &mut summaries[slot];

        op.calls += 1;
        if is_gpu_event(event) {
            op.device_self_duration += timed.self_time;
            op.device_total_duration += event.dur;
        } else {
            op.host_self_duration += timed.self_time;
            op.host_total_duration += event.dur;
        }
        op.min_duration = op.min_duration.min(event.dur);
        op.max_duration = op.max_duration.max(event.dur);

        if let Some(dims) = event.arg("Input Dims") {
            let signature = dims.to_string();
            if seen_shapes[slot].insert(signature.clone()) {
                op.input_shapes.push(signature);
            }
        }

        op.invocations.push(Invocation {
            event_id: timed.id(),
            timestamp: event.ts,
            duration: event.dur,
            self_time: timed.self_time,
        });
    }

    let total_device_self: f64 = summaries.iter().map(|op| op.device_self_duration).sum();
    for op in &mut summaries {
        op.self_cuda_time_percent = if total_device_self > 0.0 {
            op.device_self_duration / total_device_self * 100.0
        } else {
            0.0
        };
        op.avg_duration = op.total_duration() / op.calls as f64;
    }

    summaries.sort_by(|a, b| b.device_self_duration.total_cmp(&a.device_self_duration));
    tracing::debug!(operators = summaries.len(), "Aggregated operators");
    summaries
}
