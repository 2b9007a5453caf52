// Call-hierarchy reconstruction and self-time computation
//
// Interval events carry no explicit parent links, so nesting is recovered per
// thread from timestamps alone: an event's parent is the innermost interval
// still open when it starts. Self time then subtracts each event's direct
// children from its own duration.

mod builder;
mod self_time;

pub use builder::{build_hierarchy, HierarchyEvent};
pub use self_time::{compute_self_times, ChildIndex, TimedEvent};
