//! Begin/End → Complete event normalization
//!
//! Begin events are stacked per `(pid, tid, name)` and resolved LIFO, so
//! recursive calls of the same function pair innermost-first. End events with
//! no open Begin are dropped: truncated traces are expected input.

use crate::event::{Phase, RawEvent, TraceId};
use std::collections::HashMap;

type PairKey = (TraceId, TraceId, String);

/// Convert paired Begin/End events into Complete events
///
/// Complete and non-interval events (metadata, counters, instants, ...) pass
/// through unchanged and keep their relative order. A synthesized event takes
/// every field from its Begin and is emitted at the position of its End.
pub fn normalize_events(events: &[RawEvent]) -> Vec<RawEvent> {
    let mut normalized = Vec::with_capacity(events.len());
    let mut open: HashMap<PairKey, Vec<&RawEvent>> = HashMap::new();
    let mut unmatched_ends = 0usize;

    for event in events {
        match event.phase {
            Phase::Begin => {
                open.entry(pair_key(event)).or_default().push(event);
            }
            Phase::End => match open.get_mut(&pair_key(event)).and_then(Vec::pop) {
                Some(begin) => {
                    let mut complete = begin.clone();
                    complete.phase = Phase::Complete;
                    complete.dur = Some((event.ts - begin.ts).max(0.0));
                    normalized.push(complete);
                }
                None => unmatched_ends += 1,
            },
            _ => normalized.push(event.clone()),
        }
    }

    let unclosed: usize = open.values().map(Vec::len).sum();
    tracing::debug!(
        input = events.len(),
        output = normalized.len(),
        unmatched_ends,
        unclosed,
        "Normalized trace events"
    );

    normalized
}

fn pair_key(event: &RawEvent) -> PairKey {
    (event.pid.clone(), event.tid.clone(), event.name.clone())
}
