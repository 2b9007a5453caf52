//! Process/thread metadata extraction
//!
//! Reads `process_name`, `thread_name` and `process_sort_index` metadata
//! events into lookup tables. Missing fields default rather than fail.

use crate::event::{Phase, RawEvent, TraceId};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

const UNKNOWN_NAME: &str = "Unknown";

/// Name and ordering tables built from metadata events
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceMetadata {
    /// pid → process name
    pub process_names: BTreeMap<TraceId, String>,
    /// (pid, tid) → thread name, serialized with `pid_tid` keys
    #[serde(serialize_with = "serialize_thread_names")]
    pub thread_names: BTreeMap<(TraceId, TraceId), String>,
    /// pid → display sort index
    pub sort_index: BTreeMap<TraceId, i64>,
}

impl TraceMetadata {
    pub fn process_name(&self, pid: &TraceId) -> Option<&str> {
        self.process_names.get(pid).map(String::as_str)
    }

    pub fn thread_name(&self, pid: &TraceId, tid: &TraceId) -> Option<&str> {
        self.thread_names
            .get(&(pid.clone(), tid.clone()))
            .map(String::as_str)
    }
}

fn serialize_thread_names<S>(
    names: &BTreeMap<(TraceId, TraceId), String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(
        names
            .iter()
            .map(|((pid, tid), name)| (format!("{}_{}", pid, tid), name)),
    )
}

/// Build metadata lookup tables from metadata-phase events
pub fn extract_metadata(events: &[RawEvent]) -> TraceMetadata {
    let mut metadata = TraceMetadata::default();

    for event in events.iter().filter(|e| e.phase == Phase::Metadata) {
        match event.name.as_str() {
            "process_name" => {
                metadata
                    .process_names
                    .insert(event.pid.clone(), name_arg(event));
            }
            "thread_name" => {
                metadata
                    .thread_names
                    .insert((event.pid.clone(), event.tid.clone()), name_arg(event));
            }
            "process_sort_index" => {
                let index = event
                    .arg("sort_index")
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0);
                metadata.sort_index.insert(event.pid.clone(), index);
            }
            _ => {}
        }
    }

    metadata
}

fn name_arg(event: &RawEvent) -> String {
    event
        .arg("name")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_NAME)
        .to_string()
}
