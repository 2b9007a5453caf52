// Self-time calculation
//
// Children are indexed by parent id in one linear pass (arena + index), so the
// whole computation is O(n) rather than a per-event rescan of the trace.

use crate::event::CompleteEvent;
use crate::hierarchy::builder::HierarchyEvent;
use serde::Serialize;

/// A hierarchy event with its exclusive (self) duration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedEvent {
    #[serde(flatten)]
    pub node: HierarchyEvent,
    /// `max(0, dur - Σ dur of direct children)`
    pub self_time: f64,
}

impl TimedEvent {
    pub fn id(&self) -> usize {
        self.node.id
    }

    pub fn parent_id(&self) -> Option<usize> {
        self.node.parent_id
    }

    pub fn depth(&self) -> usize {
        self.node.depth
    }

    /// The underlying interval event
    pub fn event(&self) -> &CompleteEvent {
        &self.node.event
    }
}

/// Direct-children lists keyed by parent id
#[derive(Debug, Clone, Default)]
pub struct ChildIndex {
    children: Vec<Vec<usize>>,
}

impl ChildIndex {
    /// Index children of hierarchy events whose ids equal their positions
    pub fn build(events: &[HierarchyEvent]) -> Self {
        let mut children = vec![Vec::new(); events.len()];
        for event in events {
            if let Some(parent) = event.parent_id {
                if let Some(list) = children.get_mut(parent) {
                    list.push(event.id);
                }
            }
        }
        Self { children }
    }

    /// Direct children of `id` (empty for leaves or unknown ids)
    pub fn children_of(&self, id: usize) -> &[usize] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Derive self time for every hierarchy event
pub fn compute_self_times(events: Vec<HierarchyEvent>) -> Vec<TimedEvent> {
    let index = ChildIndex::build(&events);

    let self_times: Vec<f64> = events
        .iter()
        .map(|event| {
            let children_total: f64 = index
                .children_of(event.id)
                .iter()
                .filter_map(|&child| events.get(child))
                .map(|child| child.event.dur)
                .sum();
            (event.event.dur - children_total).max(0.0)
        })
        .collect();

    events
        .into_iter()
        .zip(self_times)
        .map(|(node, self_time)| TimedEvent { node, self_time })
        .collect()
}
