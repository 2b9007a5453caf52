//! Trace payload decoding
//!
//! Accepts the two shapes profilers emit: a bare event array, or an object
//! with a `traceEvents` array and optional `deviceProperties`.

use crate::error::{AnalysisError, Result};
use crate::event::RawEvent;
use serde_json::Value;

/// First entry of the top-level `deviceProperties` array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceProperties {
    pub name: Option<String>,
    pub total_global_mem: Option<u64>,
    pub compute_major: Option<i64>,
    pub compute_minor: Option<i64>,
}

impl DeviceProperties {
    /// Read each field independently; a malformed field is left unset
    pub fn from_value(device: &Value) -> Self {
        Self {
            name: device.get("name").and_then(Value::as_str).map(str::to_string),
            total_global_mem: device.get("totalGlobalMem").and_then(byte_count),
            compute_major: device.get("computeMajor").and_then(integer),
            compute_minor: device.get("computeMinor").and_then(integer),
        }
    }
}

/// Byte count from an integer or integral float (`42298834944.0`)
pub(crate) fn byte_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A decoded trace, ready for the pipeline
#[derive(Debug, Clone)]
pub struct TracePayload {
    /// Decoded events in file order
    pub events: Vec<RawEvent>,
    /// Number of entries in the source event array, decodable or not
    pub raw_event_count: usize,
    pub device_properties: Option<DeviceProperties>,
}

impl TracePayload {
    /// Parse a JSON string
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    /// Parse JSON bytes
    pub fn parse_slice(raw: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(raw)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let (items, device_properties) = match value {
            Value::Array(items) => (items, None),
            Value::Object(mut map) => {
                let device_properties = map
                    .get("deviceProperties")
                    .and_then(Value::as_array)
                    .and_then(|devices| devices.first())
                    .filter(|device| device.is_object())
                    .map(DeviceProperties::from_value);
                match map.remove("traceEvents") {
                    Some(Value::Array(items)) => (items, device_properties),
                    _ => return Err(AnalysisError::Format),
                }
            }
            _ => return Err(AnalysisError::Format),
        };

        if items.is_empty() {
            return Err(AnalysisError::no_events());
        }

        let raw_event_count = items.len();
        let mut events = Vec::with_capacity(raw_event_count);
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<RawEvent>(item) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(index, error = %e, "Skipping undecodable trace event"),
            }
        }

        Ok(Self {
            events,
            raw_event_count,
            device_properties,
        })
    }
}
