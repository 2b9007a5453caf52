//! Human-readable text report

use crate::format::{format_bytes, format_duration, format_percentage, truncate};
use crate::pipeline::AnalysisResult;
use crate::recommend::Severity;
use std::io::{self, Write};

const NAME_WIDTH: usize = 48;
const RULE_WIDTH: usize = 96;

fn section<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "╔{}╗", "═".repeat(RULE_WIDTH - 2))?;
    writeln!(out, "║  {:<width$}║", title, width = RULE_WIDTH - 4)?;
    writeln!(out, "╚{}╝", "═".repeat(RULE_WIDTH - 2))?;
    Ok(())
}

fn rule<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "─".repeat(RULE_WIDTH))
}

/// Write the full report, showing at most `top` rows per table
pub fn write_report<W: Write>(out: &mut W, result: &AnalysisResult, top: usize) -> io::Result<()> {
    write_summary(out, result)?;
    write_breakdown(out, result)?;
    write_operators(out, result, top)?;
    write_kernels(out, result, top)?;
    write_memory(out, result)?;
    write_modules(out, result, top)?;
    write_recommendations(out, result)?;
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, result: &AnalysisResult) -> io::Result<()> {
    let summary = &result.summary;
    let gpu = &result.gpu_info;

    section(out, "Trace Summary")?;
    writeln!(out, "{:<24} {}", "Total duration:", format_duration(summary.total_duration))?;
    writeln!(out, "{:<24} {}", "Events:", summary.event_count)?;
    writeln!(out, "{:<24} {}", "Operators:", summary.operator_count)?;
    writeln!(out, "{:<24} {}", "Kernels:", summary.kernel_count)?;
    writeln!(out, "{:<24} {:.1}%", "GPU utilization:", result.gpu_utilization)?;
    writeln!(out)?;
    writeln!(out, "{:<24} {}", "GPU:", gpu.name)?;
    writeln!(out, "{:<24} {}", "Memory:", format_bytes(gpu.memory as f64))?;
    writeln!(out, "{:<24} {}", "Compute capability:", gpu.compute_capability)?;
    Ok(())
}

fn write_breakdown<W: Write>(out: &mut W, result: &AnalysisResult) -> io::Result<()> {
    section(out, "Step Time Breakdown")?;
    writeln!(out, "{:<20} {:>14} {:>10}", "Category", "Time", "Share")?;
    rule(out)?;
    for bucket in &result.step_time_breakdown {
        writeln!(
            out,
            "{:<20} {:>14} {:>9.1}%",
            bucket.name.label(),
            format_duration(bucket.time),
            bucket.percentage
        )?;
    }
    Ok(())
}

fn write_operators<W: Write>(out: &mut W, result: &AnalysisResult, top: usize) -> io::Result<()> {
    section(out, "Top Operators (sorted by device self time)")?;
    writeln!(
        out,
        "{:<width$} {:>7} {:>13} {:>13} {:>8}",
        "Operator",
        "Calls",
        "Device Self",
        "Host Self",
        "CUDA %",
        width = NAME_WIDTH
    )?;
    rule(out)?;
    for op in result.operators.iter().take(top) {
        writeln!(
            out,
            "{:<width$} {:>7} {:>13} {:>13} {:>7.1}%",
            truncate(&op.name, NAME_WIDTH),
            op.calls,
            format_duration(op.device_self_duration),
            format_duration(op.host_self_duration),
            op.self_cuda_time_percent,
            width = NAME_WIDTH
        )?;
    }
    Ok(())
}

fn write_kernels<W: Write>(out: &mut W, result: &AnalysisResult, top: usize) -> io::Result<()> {
    if result.kernels.is_empty() {
        return Ok(());
    }

    let total: f64 = result.kernels.iter().map(|k| k.total_duration).sum();
    section(out, "Top Kernels (sorted by total time)")?;
    writeln!(
        out,
        "{:<width$} {:>7} {:>13} {:>13} {:>7} {:>4}",
        "Kernel",
        "Calls",
        "Total",
        "Mean",
        "Share",
        "TC",
        width = NAME_WIDTH
    )?;
    rule(out)?;
    for kernel in result.kernels.iter().take(top) {
        writeln!(
            out,
            "{:<width$} {:>7} {:>13} {:>13} {:>7} {:>4}",
            truncate(&kernel.name, NAME_WIDTH),
            kernel.calls,
            format_duration(kernel.total_duration),
            format_duration(kernel.mean_duration),
            format_percentage(kernel.total_duration, total),
            if kernel.tensor_cores_used { "yes" } else { "no" },
            width = NAME_WIDTH
        )?;
    }
    Ok(())
}

fn write_memory<W: Write>(out: &mut W, result: &AnalysisResult) -> io::Result<()> {
    let profile = &result.memory_profile;
    if profile.timeline.is_empty() {
        return Ok(());
    }

    section(out, "Memory")?;
    writeln!(out, "{:<24} {}", "Peak allocated:", format_bytes(profile.peak.allocated))?;
    writeln!(out, "{:<24} {}", "Peak reserved:", format_bytes(profile.peak.reserved))?;
    if !profile.stats.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "{:<width$} {:>8} {:>8} {:>14}",
            "Operator",
            "Allocs",
            "Frees",
            "Allocated",
            width = NAME_WIDTH
        )?;
        rule(out)?;
        for stats in &profile.stats {
            writeln!(
                out,
                "{:<width$} {:>8} {:>8} {:>14}",
                truncate(&stats.operator, NAME_WIDTH),
                stats.allocation_count,
                stats.free_count,
                format_bytes(stats.size),
                width = NAME_WIDTH
            )?;
        }
    }
    Ok(())
}

fn write_modules<W: Write>(out: &mut W, result: &AnalysisResult, top: usize) -> io::Result<()> {
    if result.modules.is_empty() {
        return Ok(());
    }

    section(out, "Modules (sorted by device time)")?;
    writeln!(
        out,
        "{:<width$} {:>12} {:>13} {:>13}",
        "Module",
        "Operators",
        "Device",
        "Host",
        width = NAME_WIDTH
    )?;
    rule(out)?;
    for module in result.modules.iter().take(top) {
        writeln!(
            out,
            "{:<width$} {:>12} {:>13} {:>13}",
            truncate(&module.name, NAME_WIDTH),
            module.operator_count,
            format_duration(module.device_duration),
            format_duration(module.host_duration),
            width = NAME_WIDTH
        )?;
    }
    Ok(())
}

fn write_recommendations<W: Write>(out: &mut W, result: &AnalysisResult) -> io::Result<()> {
    section(out, "Recommendations")?;
    for rec in &result.recommendations {
        let tag = match rec.severity {
            Severity::Error => "[ERROR]",
            Severity::Warning => "[WARN]",
            Severity::Info => "[INFO]",
            Severity::Success => "[OK]",
        };
        writeln!(out, "{} {} ({})", tag, rec.title, rec.category)?;
        writeln!(out, "    {}", rec.description)?;
        writeln!(out, "    → {}", rec.suggestion)?;
    }
    Ok(())
}
