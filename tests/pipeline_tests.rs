//! End-to-end tests for the analysis pipeline

use serde_json::json;
use tracelens::classify::StepCategory;
use tracelens::event::TraceId;
use tracelens::recommend::Severity;
use tracelens::{analyze, analyze_value, AnalysisConfig, AnalysisError, Analyzer};

const FIXTURE: &str = include_str!("fixtures/training_step.json");

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_training_step_hierarchy() {
    let result = analyze(FIXTURE).unwrap();

    let by_name = |name: &str| {
        result
            .events
            .iter()
            .find(|e| e.event().name == name)
            .unwrap()
    };

    let step = by_name("ProfilerStep#1");
    let linear = by_name("aten::linear");
    let addmm = by_name("aten::addmm");
    let launch = by_name("cudaLaunchKernel");

    assert_eq!(step.depth(), 0);
    assert_eq!(step.parent_id(), None);
    assert_eq!(linear.parent_id(), Some(step.id()));
    assert_eq!(addmm.parent_id(), Some(linear.id()));
    assert_eq!(launch.parent_id(), Some(addmm.id()));
    assert_eq!(launch.depth(), 3);

    assert_eq!(step.self_time, 500.0);
    assert_eq!(linear.self_time, 50.0);
    assert_eq!(addmm.self_time, 230.0);

    // Device stream is its own hierarchy
    let sgemm = by_name("volta_sgemm_128x64_nn");
    assert_eq!(sgemm.depth(), 0);
    assert_eq!(sgemm.self_time, 400.0);
}

#[test]
fn test_training_step_summary() {
    let result = analyze(FIXTURE).unwrap();

    assert_eq!(result.summary.start_time, 0.0);
    assert_eq!(result.summary.end_time, 1000.0);
    assert_eq!(result.summary.total_duration, 1000.0);
    assert_eq!(result.summary.event_count, 11);
    assert_eq!(result.summary.operator_count, 7);
    assert_eq!(result.summary.kernel_count, 1);
    // cudaLaunchKernel 20 + sgemm 400 + memcpy 50
    assert!(close(result.gpu_utilization, 47.0));
}

#[test]
fn test_training_step_operators_and_kernels() {
    let result = analyze(FIXTURE).unwrap();

    let names: Vec<&str> = result.operators.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(
        &names[..3],
        &["volta_sgemm_128x64_nn", "Memcpy HtoD (Pageable -> Device)", "cudaLaunchKernel"]
    );
    assert!(close(result.operators[0].self_cuda_time_percent, 400.0 / 470.0 * 100.0));

    let linear = result.operators.iter().find(|o| o.name == "aten::linear").unwrap();
    assert_eq!(linear.input_shapes, vec!["[[32,128],[64,128],[64]]"]);
    assert_eq!(linear.host_total_duration, 300.0);
    assert_eq!(linear.device_total_duration, 0.0);

    let kernel = &result.kernels[0];
    assert_eq!(kernel.name, "volta_sgemm_128x64_nn");
    assert_eq!(kernel.mean_blocks_per_sm, Some(2.5));
    assert_eq!(kernel.mean_occupancy, Some(25.0));
    assert!(!kernel.tensor_cores_used);
}

#[test]
fn test_training_step_breakdown_and_recommendations() {
    let result = analyze(FIXTURE).unwrap();

    let pct = |category: StepCategory| {
        result
            .step_time_breakdown
            .iter()
            .find(|b| b.name == category)
            .unwrap()
            .percentage
    };
    assert!(close(pct(StepCategory::DataLoader), 200.0 / 1450.0 * 100.0));
    assert!(close(pct(StepCategory::Kernel), 400.0 / 1450.0 * 100.0));
    assert!(close(pct(StepCategory::Memcpy), 50.0 / 1450.0 * 100.0));
    assert!(close(pct(StepCategory::Other), 500.0 / 1450.0 * 100.0));

    let categories: Vec<&str> = result
        .recommendations
        .iter()
        .map(|r| r.category.as_str())
        .collect();
    assert_eq!(categories, vec!["DataLoader", "GPU Utilization", "Tensor Cores"]);
    assert_eq!(result.recommendations[2].severity, Severity::Info);
}

#[test]
fn test_training_step_device_and_metadata() {
    let result = analyze(FIXTURE).unwrap();

    assert_eq!(result.gpu_info.name, "NVIDIA A100-SXM4-40GB");
    assert_eq!(result.gpu_info.memory, 42_505_273_344);
    assert_eq!(result.gpu_info.compute_capability, "8.0");
    assert_eq!(result.metadata.process_name(&TraceId::Num(1)), Some("python"));
    assert_eq!(
        result.metadata.thread_name(&TraceId::Num(1), &TraceId::Num(1)),
        Some("main thread")
    );
}

#[test]
fn test_training_step_memory() {
    let result = analyze(FIXTURE).unwrap();

    assert_eq!(result.memory_events.len(), 1);
    assert_eq!(result.memory_events[0].value, json!(1048576));

    let profile = &result.memory_profile;
    assert_eq!(profile.timeline.len(), 2);
    assert_eq!(profile.peak.allocated, 1_052_672.0);
    assert_eq!(profile.peak.reserved, 2_097_152.0);
    assert_eq!(profile.stats[0].operator, "aten::empty");
}

#[test]
fn test_modules_with_config() {
    assert!(analyze(FIXTURE).unwrap().modules.is_empty());

    let config = AnalysisConfig {
        include_modules: true,
        ..Default::default()
    };
    let result = Analyzer::new(config).analyze(FIXTURE).unwrap();
    assert_eq!(result.modules.len(), 1);
    assert_eq!(result.modules[0].name, "model.fc1");
    assert_eq!(result.modules[0].module_type, "Linear");
    assert_eq!(result.modules[0].host_duration, 300.0);
}

#[test]
fn test_begin_end_two_event_trace() {
    let result = analyze_value(&json!([
        {"ph": "B", "name": "f", "pid": 1, "tid": 1, "ts": 0},
        {"ph": "E", "name": "f", "pid": 1, "tid": 1, "ts": 100}
    ]))
    .unwrap();

    assert_eq!(result.events.len(), 1);
    assert_eq!(result.events[0].event().dur, 100.0);
    assert_eq!(result.events[0].self_time, 100.0);
    assert_eq!(result.operators.len(), 1);
    assert_eq!(result.operators[0].name, "f");
    assert_eq!(result.operators[0].calls, 1);
}

#[test]
fn test_nested_begin_end_pairs_lifo() {
    let result = analyze_value(&json!([
        {"ph": "B", "name": "f", "pid": 1, "tid": 1, "ts": 0},
        {"ph": "B", "name": "f", "pid": 1, "tid": 1, "ts": 10},
        {"ph": "E", "name": "f", "pid": 1, "tid": 1, "ts": 40},
        {"ph": "E", "name": "f", "pid": 1, "tid": 1, "ts": 100}
    ]))
    .unwrap();

    let durations: Vec<f64> = result.events.iter().map(|e| e.event().dur).collect();
    assert_eq!(durations, vec![100.0, 30.0]);
    assert_eq!(result.events[1].parent_id(), Some(result.events[0].id()));
    assert_eq!(result.events[0].self_time, 70.0);
}

#[test]
fn test_string_ids_and_undecodable_entries() {
    let result = analyze_value(&json!({
        "traceEvents": [
            {"ph": "X", "name": "op", "pid": "Spans", "tid": "PyTorch Profiler", "ts": 0, "dur": 5},
            42,
            {"ph": "X", "name": "op", "pid": "Spans", "tid": "PyTorch Profiler", "ts": 10, "dur": 5}
        ]
    }))
    .unwrap();

    assert_eq!(result.summary.event_count, 3);
    assert_eq!(result.operators[0].calls, 2);
    assert_eq!(result.events[0].event().pid, TraceId::Name("Spans".to_string()));
}

#[test]
fn test_null_and_mistyped_fields_keep_events() {
    let result = analyze_value(&json!([
        {"ph": "X", "name": null, "pid": 1, "tid": 1, "ts": 0, "dur": 50},
        {"ph": "X", "name": "ok", "pid": 1, "tid": 1, "ts": 0, "dur": 10},
        {"ph": "X", "name": "k", "cat": "kernel", "pid": 1, "tid": 7, "ts": 5, "dur": 4, "args": []}
    ]))
    .unwrap();

    assert_eq!(result.events.len(), 3);
    assert_eq!(result.summary.total_duration, 50.0);
    assert_eq!(result.kernels.len(), 1);
    assert_eq!(result.kernels[0].mean_occupancy, None);
}

#[test]
fn test_device_properties_with_float_memory() {
    let result = analyze_value(&json!({
        "traceEvents": [{"ph": "X", "name": "f", "pid": 1, "tid": 1, "ts": 0, "dur": 1}],
        "deviceProperties": [
            {"name": "NVIDIA A100", "totalGlobalMem": 42298834944.0, "computeMajor": 8, "computeMinor": 0}
        ]
    }))
    .unwrap();

    assert_eq!(result.gpu_info.name, "NVIDIA A100");
    assert_eq!(result.gpu_info.memory, 42_298_834_944);
    assert_eq!(result.gpu_info.compute_capability, "8.0");
}

#[test]
fn test_negative_timestamps_summary() {
    let result = analyze_value(&json!([
        {"ph": "X", "name": "a", "pid": 1, "tid": 1, "ts": -100, "dur": 30},
        {"ph": "X", "name": "b", "pid": 1, "tid": 1, "ts": -50, "dur": 20}
    ]))
    .unwrap();

    assert_eq!(result.summary.start_time, -100.0);
    assert_eq!(result.summary.end_time, -30.0);
    assert_eq!(result.summary.total_duration, 70.0);
}

#[test]
fn test_error_kinds() {
    assert!(matches!(analyze("not json"), Err(AnalysisError::Parse(_))));
    assert!(matches!(analyze(r#""text""#), Err(AnalysisError::Format)));
    assert!(matches!(
        analyze(r#"{"traceEvents": {}}"#),
        Err(AnalysisError::Format)
    ));
    assert!(matches!(
        analyze(r#"{"traceEvents": []}"#),
        Err(AnalysisError::EmptyTrace(_))
    ));
    assert!(matches!(
        analyze(r#"[{"ph":"B","name":"f","ts":0}]"#),
        Err(AnalysisError::EmptyTrace(_))
    ));
}

#[test]
fn test_serialized_result_is_idempotent() {
    let first = serde_json::to_string(&analyze(FIXTURE).unwrap()).unwrap();
    let second = serde_json::to_string(&analyze(FIXTURE).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_serialized_shape() {
    let value = serde_json::to_value(analyze(FIXTURE).unwrap()).unwrap();

    for key in [
        "events",
        "metadata",
        "operators",
        "kernels",
        "memoryEvents",
        "modules",
        "stepTimeBreakdown",
        "gpuUtilization",
        "gpuInfo",
        "recommendations",
        "summary",
        "memoryProfile",
    ] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }

    let event = &value["events"][0];
    assert_eq!(event["name"], "ProfilerStep#1");
    assert_eq!(event["parentId"], serde_json::Value::Null);
    assert_eq!(event["selfTime"], 500.0);
    assert_eq!(value["metadata"]["threadNames"]["1_1"], "main thread");
    assert_eq!(value["stepTimeBreakdown"][6]["name"], "CPU Exec");
    assert_eq!(value["recommendations"][0]["severity"], "warning");
    assert_eq!(value["recommendations"][0]["link"], "operators");
}
