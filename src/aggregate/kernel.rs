//! GPU kernel aggregation
//!
//! Launch metrics (`Blocks Per SM`, `Est. Achieved Occupancy`) are optional
//! per call. Means start from Trueno's SIMD reduction over the observed
//! samples and are refined in f64, so reported values carry no f32 rounding.

use crate::classify::{has_tensor_core_support, is_kernel_event};
use crate::hierarchy::TimedEvent;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Summary statistics for one kernel name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelSummary {
    pub name: String,
    pub calls: u64,
    pub total_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub mean_duration: f64,
    /// Name matches a tensor-core instruction pattern
    pub tensor_cores_used: bool,
    /// `None` when no call reported the metric
    pub mean_blocks_per_sm: Option<f64>,
    pub mean_occupancy: Option<f64>,
}

#[derive(Debug, Default)]
struct KernelSamples {
    blocks_per_sm: Vec<f64>,
    occupancy: Vec<f64>,
}

/// Group kernel-category events by name
///
/// Output is sorted by total duration, descending.
pub fn aggregate_kernels(events: &[TimedEvent]) -> Vec<KernelSummary> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<KernelSummary> = Vec::new();
    let mut samples: Vec<KernelSamples> = Vec::new();

    for event in events.iter().map(TimedEvent::event).filter(|e| is_kernel_event(e)) {
        let slot = *slots.entry(event.name.as_str()).or_insert_with(|| {
            summaries.push(KernelSummary {
                name: event.name.clone(),
                calls: 0,
                total_duration: 0.0,
                min_duration: f64::INFINITY,
                max_duration: 0.0,
                mean_duration: 0.0,
                tensor_cores_used: has_tensor_core_support(&event.name),
                mean_blocks_per_sm: None,
                mean_occupancy: None,
            });
            samples.push(KernelSamples::default());
            summaries.len() - 1
        });

        let kernel = &mut summaries[slot];
        kernel.calls += 1;
        kernel.total_duration += event.dur;
        kernel.min_duration = kernel.min_duration.min(event.dur);
        kernel.max_duration = kernel.max_duration.max(event.dur);

        if let Some(blocks) = event.arg("Blocks Per SM").and_then(Value::as_f64) {
            samples[slot].blocks_per_sm.push(blocks);
        }
        if let Some(occupancy) = event.arg("Est. Achieved Occupancy").and_then(Value::as_f64) {
            samples[slot].occupancy.push(occupancy);
        }
    }

    for (kernel, samples) in summaries.iter_mut().zip(&samples) {
        kernel.mean_duration = kernel.total_duration / kernel.calls as f64;
        kernel.mean_blocks_per_sm = sample_mean(&samples.blocks_per_sm);
        kernel.mean_occupancy = sample_mean(&samples.occupancy);
    }

    summaries.sort_by(|a, b| b.total_duration.total_cmp(&a.total_duration));
    tracing::debug!(kernels = summaries.len(), "Aggregated kernels");
    summaries
}

/// Mean of `samples`, `None` when empty
///
/// The f32 SIMD mean is only a shift; the residual pass runs in f64.
fn sample_mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let narrow: Vec<f32> = samples.iter().map(|&s| s as f32).collect();
    let shift = trueno::Vector::from_slice(&narrow)
        .mean()
        .map(f64::from)
        .ok()
        .filter(|m| m.is_finite())
        .unwrap_or(0.0);
    let residual: f64 = samples.iter().map(|&s| s - shift).sum();
    Some(shift + residual / samples.len() as f64)
}
