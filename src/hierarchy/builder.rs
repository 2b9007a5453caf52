// Stack-based hierarchy builder
//
// Events are stably sorted by start time and partitioned by (pid, tid). Each
// thread keeps a stack of open intervals; before an event is placed, every
// interval that ended at or before its start is popped. Partially overlapping
// siblings are therefore treated as sequential once the earlier one has ended.

use crate::event::{CompleteEvent, RawEvent, TraceId};
use serde::Serialize;
use std::collections::HashMap;

/// A complete event placed in its thread's call hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEvent {
    /// Position of this event in the hierarchy output
    pub id: usize,
    /// Innermost enclosing event on the same thread
    pub parent_id: Option<usize>,
    /// Nesting level within the thread, 0 for roots
    pub depth: usize,
    #[serde(flatten)]
    pub event: CompleteEvent,
}

/// Reconstruct per-thread nesting from interval events
///
/// Only Complete events with a duration take part. Output is grouped by
/// thread (groups in order of first appearance, events by start time), and
/// each event's `id` equals its index in the returned vector.
pub fn build_hierarchy(events: &[RawEvent]) -> Vec<HierarchyEvent> {
    let mut complete: Vec<CompleteEvent> = events.iter().filter_map(RawEvent::as_complete).collect();
    complete.sort_by(|a, b| a.ts.total_cmp(&b.ts));

    let groups = group_by_thread(complete);
    tracing::debug!(threads = groups.len(), "Building call hierarchy");

    let mut hierarchy = Vec::with_capacity(groups.iter().map(Vec::len).sum());
    for group in groups {
        let nested = build_thread(group, hierarchy.len());
        hierarchy.extend(nested);
    }
    hierarchy
}

fn group_by_thread(events: Vec<CompleteEvent>) -> Vec<Vec<CompleteEvent>> {
    let mut index: HashMap<(TraceId, TraceId), usize> = HashMap::new();
    let mut groups: Vec<Vec<CompleteEvent>> = Vec::new();

    for event in events {
        let slot = *index.entry(event.thread_key()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(event);
    }
    groups
}

/// Nest one thread's events; ids start at `first_id`
///
/// Independent of every other thread, so groups may be processed in any order
/// as long as id offsets are assigned consistently.
fn build_thread(events: Vec<CompleteEvent>, first_id: usize) -> Vec<HierarchyEvent> {
    // (id, end) of currently open intervals
    let mut stack: Vec<(usize, f64)> = Vec::new();
    let mut nested = Vec::with_capacity(events.len());

    for (offset, event) in events.into_iter().enumerate() {
        while let Some(&(_, end)) = stack.last() {
            if end <= event.ts {
                stack.pop();
            } else {
                break;
            }
        }

        let id = first_id + offset;
        let parent_id = stack.last().map(|&(parent, _)| parent);
        let depth = stack.len();

        stack.push((id, event.end()));
        nested.push(HierarchyEvent {
            id,
            parent_id,
            depth,
            event,
        });
    }
    nested
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Phase;

    fn x(name: &str, tid: i64, ts: f64, dur: f64) -> RawEvent {
        let mut event = RawEvent::new(Phase::Complete, name, 1.into(), tid.into(), ts);
        event.dur = Some(dur);
        event
    }

    #[test]
    fn test_simple_nesting() {
        let events = vec![x("outer", 1, 0.0, 100.0), x("inner", 1, 10.0, 20.0)];
        let h = build_hierarchy(&events);

        assert_eq!(h.len(), 2);
        assert_eq!(h[0].parent_id, None);
        assert_eq!(h[0].depth, 0);
        assert_eq!(h[1].parent_id, Some(0));
        assert_eq!(h[1].depth, 1);
    }

    #[test]
    fn test_adjacent_events_are_siblings() {
        // Second event starts exactly when the first ends
        let events = vec![x("a", 1, 0.0, 10.0), x("b", 1, 10.0, 5.0)];
        let h = build_hierarchy(&events);

        assert_eq!(h[1].parent_id, None);
        assert_eq!(h[1].depth, 0);
    }

    #[test]
    fn test_sorted_by_timestamp_before_nesting() {
        let events = vec![x("inner", 1, 5.0, 1.0), x("outer", 1, 0.0, 10.0)];
        let h = build_hierarchy(&events);

        assert_eq!(h[0].event.name, "outer");
        assert_eq!(h[1].event.name, "inner");
        assert_eq!(h[1].parent_id, Some(0));
    }

    #[test]
    fn test_ignores_non_complete_events() {
        let mut counter = RawEvent::new(Phase::Counter, "Memory", 1.into(), 1.into(), 1.0);
        counter.dur = Some(3.0);
        let no_dur = RawEvent::new(Phase::Complete, "x", 1.into(), 1.into(), 1.0);
        assert!(build_hierarchy(&[counter, no_dur]).is_empty());
    }

    #[test]
    fn test_ids_match_positions_across_threads() {
        let events = vec![
            x("t1_root", 1, 0.0, 50.0),
            x("t2_root", 2, 1.0, 50.0),
            x("t1_child", 1, 2.0, 5.0),
            x("t2_child", 2, 3.0, 5.0),
        ];
        let h = build_hierarchy(&events);

        for (i, e) in h.iter().enumerate() {
            assert_eq!(e.id, i);
        }
        // Thread 1 group comes first (first appearance)
        assert_eq!(h[0].event.name, "t1_root");
        assert_eq!(h[1].event.name, "t1_child");
        assert_eq!(h[1].parent_id, Some(0));
        assert_eq!(h[2].event.name, "t2_root");
        assert_eq!(h[3].parent_id, Some(2));
    }
}
