//! Memory event extraction and allocation tracking
//!
//! Two views over the same raw stream:
//! - `extract_memory_events`: a flat projection of memory counter events
//! - `track_memory`: a running allocated/reserved timeline, per-operator
//!   allocation stats and peaks, also folding in `[memory]` allocation records

use crate::event::{Args, Phase, RawEvent};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// One memory counter sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEvent {
    pub timestamp: f64,
    pub name: String,
    /// First argument value, 0 if the event had no args
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,
}

/// Project counter events whose name mentions memory
pub fn extract_memory_events(events: &[RawEvent]) -> Vec<MemoryEvent> {
    events
        .iter()
        .filter(|e| is_memory_counter(e))
        .map(|e| MemoryEvent {
            timestamp: e.ts,
            name: e.name.clone(),
            value: e
                .args
                .as_ref()
                .and_then(|args| args.values().next().cloned())
                .unwrap_or_else(|| Value::from(0)),
            args: e.args.clone(),
        })
        .collect()
}

fn is_memory_counter(event: &RawEvent) -> bool {
    event.phase == Phase::Counter && event.name.to_lowercase().contains("memory")
}

fn is_allocation_record(event: &RawEvent) -> bool {
    event.name.contains("[memory]")
}

/// Allocation or free
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AllocationKind {
    Allocation,
    Free,
}

/// A point on the memory timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum MemoryPoint {
    /// Sample from a memory counter event
    #[serde(rename_all = "camelCase")]
    Counter {
        timestamp: f64,
        allocated: f64,
        reserved: f64,
    },
    /// Individual allocation record
    #[serde(rename_all = "camelCase")]
    Record {
        timestamp: f64,
        kind: AllocationKind,
        address: Option<Value>,
        size: f64,
        operator: String,
        total_allocated: f64,
        total_reserved: f64,
    },
}

impl MemoryPoint {
    pub fn timestamp(&self) -> f64 {
        match self {
            MemoryPoint::Counter { timestamp, .. } | MemoryPoint::Record { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// Allocation activity attributed to one operator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorMemoryStats {
    pub operator: String,
    /// Total bytes allocated
    pub size: f64,
    pub allocation_count: u64,
    pub free_count: u64,
    /// Bytes allocated minus bytes freed
    pub net_increase: f64,
}

/// Peak memory observed over the trace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryPeak {
    pub allocated: f64,
    pub reserved: f64,
}

/// Memory timeline with per-operator statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryProfile {
    pub timeline: Vec<MemoryPoint>,
    /// Sorted by allocated size, descending
    pub stats: Vec<OperatorMemoryStats>,
    pub peak: MemoryPeak,
}

impl MemoryProfile {
    /// Allocated/reserved curve for charting: `(timestamp, allocated, reserved)`
    pub fn curve(&self) -> Vec<(f64, f64, f64)> {
        self.timeline
            .iter()
            .map(|point| match point {
                MemoryPoint::Counter {
                    timestamp,
                    allocated,
                    reserved,
                } => (*timestamp, *allocated, *reserved),
                MemoryPoint::Record {
                    timestamp,
                    total_allocated,
                    total_reserved,
                    ..
                } => (*timestamp, *total_allocated, *total_reserved),
            })
            .collect()
    }
}

/// Build the memory timeline and per-operator allocation stats
pub fn track_memory(events: &[RawEvent]) -> MemoryProfile {
    let mut profile = MemoryProfile::default();
    let mut allocated = 0.0_f64;
    let mut reserved = 0.0_f64;
    let mut slots: HashMap<String, usize> = HashMap::new();

    for event in events {
        if is_memory_counter(event) {
            if let Some(value) = numeric_arg(event, &["allocated", "Allocated"]) {
                allocated = value;
                profile.peak.allocated = profile.peak.allocated.max(allocated);
            }
            if let Some(value) = numeric_arg(event, &["reserved", "Reserved"]) {
                reserved = value;
                profile.peak.reserved = profile.peak.reserved.max(reserved);
            }
            profile.timeline.push(MemoryPoint::Counter {
                timestamp: event.ts,
                allocated,
                reserved,
            });
        } else if is_allocation_record(event) {
            let bytes = numeric_arg(event, &["Bytes", "bytes"]).unwrap_or(0.0);
            let kind = if event.name.contains("alloc") || bytes > 0.0 {
                AllocationKind::Allocation
            } else {
                AllocationKind::Free
            };
            let size = bytes.abs();
            let operator = event
                .arg("operator")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string();

            match kind {
                AllocationKind::Allocation => {
                    allocated += size;
                    profile.peak.allocated = profile.peak.allocated.max(allocated);
                }
                AllocationKind::Free => allocated = (allocated - size).max(0.0),
            }

            let slot = *slots.entry(operator.clone()).or_insert_with(|| {
                profile.stats.push(OperatorMemoryStats {
                    operator: operator.clone(),
                    size: 0.0,
                    allocation_count: 0,
                    free_count: 0,
                    net_increase: 0.0,
                });
                profile.stats.len() - 1
            });
            let stats = &mut profile.stats[slot];
            match kind {
                AllocationKind::Allocation => {
                    stats.size += size;
                    stats.allocation_count += 1;
                    stats.net_increase += size;
                }
                AllocationKind::Free => {
                    stats.free_count += 1;
                    stats.net_increase -= size;
                }
            }

            profile.timeline.push(MemoryPoint::Record {
                timestamp: event.ts,
                kind,
                address: event.arg("Addr").or_else(|| event.arg("addr")).cloned(),
                size,
                operator,
                total_allocated: allocated,
                total_reserved: reserved,
            });
        }
    }

    profile.stats.sort_by(|a, b| b.size.total_cmp(&a.size));
    profile
}

/// First non-zero numeric value among `keys`
fn numeric_arg(event: &RawEvent, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| event.arg(key).and_then(Value::as_f64))
        .find(|v| *v != 0.0)
}
