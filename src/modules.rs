//! PyTorch module attribution
//!
//! Events carrying a module name in their args are grouped per module.
//! Dotted names (`model.encoder.layer1`) link a module to its parent.

use crate::classify::is_device_category;
use crate::hierarchy::TimedEvent;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

const MODULE_KEYS: [&str; 3] = ["module", "Module Hierarchy", "module_name"];

/// One operator call attributed to a module
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOperator {
    pub name: String,
    pub duration: f64,
    pub timestamp: f64,
}

/// Per-module totals
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: String,
    pub occurrences: u64,
    pub operator_count: u64,
    pub host_duration: f64,
    pub device_duration: f64,
    /// Names of direct child modules
    pub children: Vec<String>,
    pub operators: Vec<ModuleOperator>,
}

/// Module with its children resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleNode {
    #[serde(flatten)]
    pub module: ModuleSummary,
    #[serde(rename = "childNodes")]
    pub child_nodes: Vec<ModuleNode>,
}

fn module_name(event: &TimedEvent) -> Option<&str> {
    MODULE_KEYS
        .iter()
        .find_map(|key| event.event().arg(key).and_then(Value::as_str))
        .filter(|name| !name.is_empty())
}

fn parent_name(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(parent, _)| parent)
}

/// Group events by module name
///
/// Output is sorted by device duration, descending.
pub fn parse_modules(events: &[TimedEvent]) -> Vec<ModuleSummary> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut modules: Vec<ModuleSummary> = Vec::new();

    for timed in events {
        let Some(name) = module_name(timed) else {
            continue;
        };
        let event = timed.event();

        let slot = *slots.entry(name.to_string()).or_insert_with(|| {
            modules.push(ModuleSummary {
                name: name.to_string(),
                module_type: event
                    .arg("module_type")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown")
                    .to_string(),
                occurrences: 0,
                operator_count: 0,
                host_duration: 0.0,
                device_duration: 0.0,
                children: Vec::new(),
                operators: Vec::new(),
            });
            modules.len() - 1
        });

        let module = &mut modules[slot];
        module.occurrences += 1;
        module.operator_count += 1;
        if event.category.as_deref().is_some_and(is_device_category) {
            module.device_duration += event.dur;
        } else {
            module.host_duration += event.dur;
        }
        module.operators.push(ModuleOperator {
            name: event.name.clone(),
            duration: event.dur,
            timestamp: event.ts,
        });
    }

    let links: Vec<(usize, String)> = modules
        .iter()
        .filter_map(|m| {
            let parent = parent_name(&m.name)?;
            slots.get(parent).map(|&slot| (slot, m.name.clone()))
        })
        .collect();
    for (parent, child) in links {
        if !modules[parent].children.contains(&child) {
            modules[parent].children.push(child);
        }
    }

    modules.sort_by(|a, b| b.device_duration.total_cmp(&a.device_duration));
    tracing::debug!(modules = modules.len(), "Parsed modules");
    modules
}

/// Nest modules under their dotted-name parents
///
/// Modules whose parent is absent become roots. Root and child order follow
/// the input order.
pub fn build_module_tree(modules: &[ModuleSummary]) -> Vec<ModuleNode> {
    let index: HashMap<&str, usize> = modules
        .iter()
        .enumerate()
        .map(|(i, m)| (m.name.as_str(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); modules.len()];
    let mut roots = Vec::new();
    for (i, module) in modules.iter().enumerate() {
        match parent_name(&module.name).and_then(|p| index.get(p)) {
            Some(&parent) if parent != i => children[parent].push(i),
            _ => roots.push(i),
        }
    }

    roots
        .into_iter()
        .map(|root| build_node(root, modules, &children))
        .collect()
}

fn build_node(i: usize, modules: &[ModuleSummary], children: &[Vec<usize>]) -> ModuleNode {
    ModuleNode {
        module: modules[i].clone(),
        child_nodes: children[i]
            .iter()
            .map(|&child| build_node(child, modules, children))
            .collect(),
    }
}
