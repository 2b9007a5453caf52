//! Rule-based performance recommendations
//!
//! Six fixed rules over the derived metrics, evaluated in order. Every rule
//! is checked; when none fires a single success entry is returned.
//!
//! | Rule | Severity | Fires when |
//! |------|----------|------------|
//! | DataLoader | warning | DataLoader share > 10% |
//! | GPU Utilization | warning | utilization < 50% |
//! | Communication | warning | Communication share > 20% |
//! | Tensor Cores | info | < 50% of gemm/conv/matmul kernels use tensor cores |
//! | Runtime | info | Runtime share > 15% |
//! | Memory Copy | warning | Memcpy share > 10% |

use crate::aggregate::{KernelSummary, OperatorSummary};
use crate::classify::{is_tensor_core_eligible, StepCategory};
use crate::pipeline::TraceSummary;
use crate::step_time::{bucket_percentage, StepTimeBucket};
use serde::{Deserialize, Serialize};

/// Recommendation severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Success,
}

/// Report view a recommendation points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Overview,
    Operators,
    Kernels,
}

/// One finding with a suggested fix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub description: String,
    pub suggestion: String,
    pub link: Option<View>,
}

impl Recommendation {
    fn new(
        severity: Severity,
        category: &str,
        title: &str,
        description: String,
        suggestion: &str,
        link: Option<View>,
    ) -> Self {
        Self {
            severity,
            category: category.to_string(),
            title: title.to_string(),
            description,
            suggestion: suggestion.to_string(),
            link,
        }
    }
}

/// Rule thresholds, all in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    /// DataLoader share above which loading is a bottleneck
    /// Default: 10.0
    pub dataloader_percent: f64,

    /// Utilization below which the GPU counts as underused
    /// Default: 50.0
    pub gpu_utilization_percent: f64,

    /// Default: 20.0
    pub communication_percent: f64,

    /// Tensor-core share of eligible kernels below which to suggest AMP
    /// Default: 50.0
    pub tensor_core_percent: f64,

    /// Default: 15.0
    pub runtime_percent: f64,

    /// Default: 10.0
    pub memcpy_percent: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            dataloader_percent: 10.0,
            gpu_utilization_percent: 50.0,
            communication_percent: 20.0,
            tensor_core_percent: 50.0,
            runtime_percent: 15.0,
            memcpy_percent: 10.0,
        }
    }
}

/// Derived metrics the rules read
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInput<'a> {
    pub step_time_breakdown: &'a [StepTimeBucket],
    pub gpu_utilization: f64,
    pub kernels: &'a [KernelSummary],
    pub operators: &'a [OperatorSummary],
    pub summary: &'a TraceSummary,
}

/// Evaluate every rule in order
pub fn generate_recommendations(
    input: &RecommendationInput<'_>,
    thresholds: &RecommendationThresholds,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    let share = |category| bucket_percentage(input.step_time_breakdown, category);

    if let Some(pct) = share(StepCategory::DataLoader).filter(|&p| p > thresholds.dataloader_percent) {
        recommendations.push(Recommendation::new(
            Severity::Warning,
            "DataLoader",
            "DataLoader Bottleneck Detected",
            format!(
                "DataLoader operations consume {:.1}% of total time. This suggests data loading is a bottleneck.",
                pct
            ),
            "Increase num_workers in DataLoader, enable pin_memory=True, or use persistent_workers=True for better performance.",
            Some(View::Operators),
        ));
    }

    if input.gpu_utilization < thresholds.gpu_utilization_percent {
        recommendations.push(Recommendation::new(
            Severity::Warning,
            "GPU Utilization",
            "Low GPU Utilization",
            format!(
                "GPU utilization is {:.1}%, which is below optimal levels.",
                input.gpu_utilization
            ),
            "Consider increasing batch size, using mixed precision training (torch.cuda.amp), or optimizing data loading to keep the GPU busy.",
            Some(View::Overview),
        ));
    }

    if let Some(pct) =
        share(StepCategory::Communication).filter(|&p| p > thresholds.communication_percent)
    {
        recommendations.push(Recommendation::new(
            Severity::Warning,
            "Communication",
            "High Communication Overhead",
            format!(
                "Communication operations consume {:.1}% of total time in distributed training.",
                pct
            ),
            "Consider using gradient accumulation to reduce communication frequency, or optimize network bandwidth. Check for all-reduce bottlenecks.",
            Some(View::Overview),
        ));
    }

    if let Some(pct) = tensor_core_share(input.kernels).filter(|&p| p < thresholds.tensor_core_percent) {
        recommendations.push(Recommendation::new(
            Severity::Info,
            "Tensor Cores",
            "Tensor Core Underutilization",
            format!(
                "Only {:.1}% of eligible kernels are using Tensor Cores. Tensor Cores can significantly accelerate matrix operations.",
                pct
            ),
            "Use mixed precision training with torch.cuda.amp.autocast() to enable Tensor Core acceleration. Ensure input dimensions are multiples of 8 for FP16.",
            Some(View::Kernels),
        ));
    }

    if let Some(pct) = share(StepCategory::Runtime).filter(|&p| p > thresholds.runtime_percent) {
        recommendations.push(Recommendation::new(
            Severity::Info,
            "Runtime",
            "High CUDA Runtime Overhead",
            format!("CUDA runtime operations consume {:.1}% of total time.", pct),
            "This may indicate frequent small kernel launches. Consider using torch.jit.script or torch.compile to fuse operations and reduce runtime overhead.",
            Some(View::Overview),
        ));
    }

    if let Some(pct) = share(StepCategory::Memcpy).filter(|&p| p > thresholds.memcpy_percent) {
        recommendations.push(Recommendation::new(
            Severity::Warning,
            "Memory Copy",
            "Excessive Memory Copy Operations",
            format!("Memory copy operations consume {:.1}% of total time.", pct),
            "Reduce CPU-GPU data transfers. Keep data on GPU when possible, use pin_memory for faster transfers, and avoid unnecessary .cpu() / .cuda() calls.",
            Some(View::Overview),
        ));
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation::new(
            Severity::Success,
            "Performance",
            "Good Performance Profile",
            "No major performance issues detected. Your training loop appears to be well optimized."
                .to_string(),
            "Continue monitoring performance as your model evolves. Consider profiling with different batch sizes or input shapes.",
            None,
        ));
    }

    tracing::debug!(
        recommendations = recommendations.len(),
        operators = input.operators.len(),
        "Generated recommendations"
    );
    recommendations
}

/// Tensor-core kernels as a percentage of eligible kernels
///
/// Counts distinct kernel names, not calls. The numerator counts every
/// tensor-core kernel, eligible or not. `None` when no kernel is eligible.
fn tensor_core_share(kernels: &[KernelSummary]) -> Option<f64> {
    let eligible = kernels
        .iter()
        .filter(|k| is_tensor_core_eligible(&k.name))
        .count();
    if eligible == 0 {
        return None;
    }
    let tensor_core = kernels.iter().filter(|k| k.tensor_cores_used).count();
    Some(tensor_core as f64 / eligible as f64 * 100.0)
}
