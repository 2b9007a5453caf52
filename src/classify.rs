//! Event classification heuristics
//!
//! All tests are case-insensitive substring matches on the event category
//! (`cat`) and name. Step-time categories come from an ordered rule table
//! evaluated top to bottom, first match wins. Reordering the table changes
//! which bucket overlapping markers land in (e.g. a `gpu_memcpy` category is
//! Memcpy only because no Kernel marker precedes it).

use crate::event::CompleteEvent;
use serde::Serialize;
use std::fmt;

/// Fixed operational categories for the step-time breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StepCategory {
    Kernel,
    Memcpy,
    Memset,
    Communication,
    Runtime,
    DataLoader,
    #[serde(rename = "CPU Exec")]
    CpuExec,
    Other,
}

impl StepCategory {
    /// Every category, in breakdown order
    pub const ALL: [StepCategory; 8] = [
        StepCategory::Kernel,
        StepCategory::Memcpy,
        StepCategory::Memset,
        StepCategory::Communication,
        StepCategory::Runtime,
        StepCategory::DataLoader,
        StepCategory::CpuExec,
        StepCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StepCategory::Kernel => "Kernel",
            StepCategory::Memcpy => "Memcpy",
            StepCategory::Memset => "Memset",
            StepCategory::Communication => "Communication",
            StepCategory::Runtime => "Runtime",
            StepCategory::DataLoader => "DataLoader",
            StepCategory::CpuExec => "CPU Exec",
            StepCategory::Other => "Other",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for StepCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lowercased category and name of one event
struct Markers {
    cat: String,
    name: String,
}

impl Markers {
    fn of(event: &CompleteEvent) -> Self {
        Self {
            cat: event.category.as_deref().unwrap_or("").to_lowercase(),
            name: event.name.to_lowercase(),
        }
    }

    fn cat_has(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.cat.contains(n))
    }

    fn name_has(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.name.contains(n))
    }
}

type Rule = (fn(&Markers) -> bool, StepCategory);

const STEP_RULES: &[Rule] = &[
    (kernel_marker, StepCategory::Kernel),
    (memcpy_marker, StepCategory::Memcpy),
    (memset_marker, StepCategory::Memset),
    (communication_marker, StepCategory::Communication),
    (runtime_marker, StepCategory::Runtime),
    (dataloader_marker, StepCategory::DataLoader),
    (cpu_marker, StepCategory::CpuExec),
];

fn kernel_marker(m: &Markers) -> bool {
    m.cat_has(&["kernel", "gpu_op"])
}

fn memcpy_marker(m: &Markers) -> bool {
    m.cat_has(&["memcpy"]) || m.name_has(&["memcpy"])
}

fn memset_marker(m: &Markers) -> bool {
    m.cat_has(&["memset"]) || m.name_has(&["memset"])
}

// NCCL collectives and torch.distributed ops
fn communication_marker(m: &Markers) -> bool {
    m.cat_has(&["nccl", "communication"])
        || m.name_has(&["all_reduce", "allreduce", "broadcast", "allgather"])
}

fn runtime_marker(m: &Markers) -> bool {
    m.cat_has(&["runtime"])
}

fn dataloader_marker(m: &Markers) -> bool {
    m.name_has(&["dataloader"])
}

fn cpu_marker(m: &Markers) -> bool {
    m.cat_has(&["cpu"])
}

/// Assign exactly one step-time category to an event
pub fn classify_event(event: &CompleteEvent) -> StepCategory {
    let markers = Markers::of(event);
    STEP_RULES
        .iter()
        .find(|(matches, _)| matches(&markers))
        .map(|&(_, category)| category)
        .unwrap_or(StepCategory::Other)
}

/// Category or name carries a kernel/GPU/CUDA marker
pub fn is_gpu_event(event: &CompleteEvent) -> bool {
    let m = Markers::of(event);
    m.cat_has(&["kernel", "gpu", "cuda"]) || m.name_has(&["cuda", "gpu"])
}

/// Category marks a device kernel launch
pub fn is_kernel_event(event: &CompleteEvent) -> bool {
    Markers::of(event).cat_has(&["kernel"])
}

/// Raw category string names a device-side event (`gpu` or `kernel`)
pub fn is_device_category(category: &str) -> bool {
    let cat = category.to_lowercase();
    cat.contains("gpu") || cat.contains("kernel")
}

/// Kernel name matches a hardware matrix-multiply-accumulate pattern
pub fn has_tensor_core_support(kernel_name: &str) -> bool {
    let name = kernel_name.to_lowercase();
    ["hmma", "imma", "wmma", "tensor_op", "tensorop"]
        .iter()
        .any(|p| name.contains(p))
}

/// Kernel performs work that tensor cores could accelerate
pub fn is_tensor_core_eligible(kernel_name: &str) -> bool {
    let name = kernel_name.to_lowercase();
    ["gemm", "conv", "matmul"].iter().any(|p| name.contains(p))
}

/// Per-category accumulator indexed by `StepCategory`
#[derive(Debug, Clone, Default)]
pub(crate) struct CategoryTotals([f64; 8]);

impl CategoryTotals {
    pub(crate) fn add(&mut self, category: StepCategory, value: f64) {
        self.0[category.index()] += value;
    }

    pub(crate) fn get(&self, category: StepCategory) -> f64 {
        self.0[category.index()]
    }

    pub(crate) fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}
