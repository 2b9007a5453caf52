//! Per-name aggregation of timed events
//!
//! Both aggregators build an arena of summaries with a name → slot index in a
//! single pass, then finalize with a stable sort. Ties keep first-seen order,
//! which makes the output independent of hash iteration order.

mod kernel;
mod operator;

pub use kernel::{aggregate_kernels, KernelSummary};
pub use operator::{aggregate_operators, Invocation, OperatorSummary};
