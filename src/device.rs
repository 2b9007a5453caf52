//! GPU identity extraction
//!
//! Priority: the trace's `deviceProperties[0]` first, then metadata events
//! carrying `device_name` / `device_memory` / `compute_capability`, later
//! events overriding earlier ones.

use crate::event::{Phase, RawEvent};
use crate::payload::{byte_count, DeviceProperties};
use serde::Serialize;
use serde_json::Value;

/// Resolved GPU description
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuInfo {
    pub name: String,
    /// Total device memory in bytes
    pub memory: u64,
    /// `major.minor`
    pub compute_capability: String,
}

impl Default for GpuInfo {
    fn default() -> Self {
        Self {
            name: "Unknown GPU".to_string(),
            memory: 0,
            compute_capability: "Unknown".to_string(),
        }
    }
}

/// Resolve GPU info from device properties and metadata events
pub fn extract_gpu_info(device: Option<&DeviceProperties>, events: &[RawEvent]) -> GpuInfo {
    let mut info = GpuInfo::default();

    if let Some(device) = device {
        if let Some(name) = device.name.as_ref().filter(|n| !n.is_empty()) {
            info.name = name.clone();
        }
        if let Some(memory) = device.total_global_mem.filter(|&m| m > 0) {
            info.memory = memory;
        }
        if let (Some(major), Some(minor)) = (device.compute_major, device.compute_minor) {
            info.compute_capability = format!("{}.{}", major, minor);
        }
    }

    for event in events.iter().filter(|e| e.phase == Phase::Metadata) {
        if let Some(name) = event.arg("device_name").and_then(non_empty_string) {
            info.name = name;
        }
        if let Some(memory) = event
            .arg("device_memory")
            .and_then(byte_count)
            .filter(|&m| m > 0)
        {
            info.memory = memory;
        }
        if let Some(cc) = event.arg("compute_capability").and_then(non_empty_string) {
            info.compute_capability = cc;
        }
    }

    info
}

fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
