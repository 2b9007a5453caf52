//! Step-time breakdown and GPU utilization estimate

use crate::classify::{classify_event, is_gpu_event, CategoryTotals, StepCategory};
use crate::hierarchy::TimedEvent;
use serde::Serialize;

/// Self time attributed to one step-time category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepTimeBucket {
    pub name: StepCategory,
    /// Summed self time in microseconds
    pub time: f64,
    /// Share of the summed self time across all categories
    pub percentage: f64,
}

/// Partition self time into the eight fixed categories
///
/// Only events with positive duration count. All eight buckets are always
/// returned, in `StepCategory::ALL` order; percentages are 0 when nothing
/// qualified.
pub fn step_time_breakdown(events: &[TimedEvent]) -> Vec<StepTimeBucket> {
    let mut totals = CategoryTotals::default();

    for timed in events.iter().filter(|t| t.event().dur > 0.0) {
        totals.add(classify_event(timed.event()), timed.self_time);
    }

    let grand_total = totals.total();
    StepCategory::ALL
        .iter()
        .map(|&category| {
            let time = totals.get(category);
            StepTimeBucket {
                name: category,
                time,
                percentage: if grand_total > 0.0 {
                    time / grand_total * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect()
}

/// Estimate GPU utilization as a percentage of wall-clock time
///
/// This is an approximation: it sums the self time of GPU-classified events
/// and divides by the trace duration. Overlapping streams can push the raw
/// ratio above 100 (clamped), and idle SMs inside a running kernel are not
/// visible, so it is not a measure of true device occupancy.
pub fn estimate_gpu_utilization(events: &[TimedEvent], total_duration: f64) -> f64 {
    if total_duration <= 0.0 {
        return 0.0;
    }

    let mut gpu_events = events.iter().filter(|t| is_gpu_event(t.event())).peekable();
    if gpu_events.peek().is_none() {
        return 0.0;
    }

    let gpu_time: f64 = gpu_events.map(|t| t.self_time).sum();
    (gpu_time / total_duration * 100.0).min(100.0)
}

/// Look up a bucket's percentage by category
pub fn bucket_percentage(breakdown: &[StepTimeBucket], category: StepCategory) -> Option<f64> {
    breakdown
        .iter()
        .find(|b| b.name == category)
        .map(|b| b.percentage)
}
