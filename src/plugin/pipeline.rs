//! Shared metric/summary aggregation used by both the crawl and playground
//! pipelines (spec §4.2's "Metrics aggregation").

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::traits::{CrawlPlugin, PlaygroundPlugin};

/// For each enabled plugin that implements `summarize`, passes in its
/// ordered metrics and places the result into the returned map keyed by
/// plugin name. A plugin with no recorded metrics is skipped; `summarize`
/// itself cannot throw in this implementation (it's a plain function, not a
/// hook returning `Result`), so there's no "omit on panic" branch to model.
pub fn summarize_crawl_plugins(
    plugins: &[Arc<dyn CrawlPlugin>],
    metrics_by_plugin: &HashMap<String, Vec<Value>>,
) -> serde_json::Map<String, Value> {
    let mut summary = serde_json::Map::new();
    for plugin in plugins {
        let Some(metrics) = metrics_by_plugin.get(plugin.name()) else {
            continue;
        };
        if let Some(value) = plugin.summarize(metrics) {
            summary.insert(plugin.name().to_string(), value);
        }
    }
    summary
}

pub fn summarize_playground_plugins(
    plugins: &[Box<dyn PlaygroundPlugin>],
    metrics_by_plugin: &HashMap<String, Vec<Value>>,
) -> serde_json::Map<String, Value> {
    let mut summary = serde_json::Map::new();
    for plugin in plugins {
        let Some(metrics) = metrics_by_plugin.get(plugin.name()) else {
            continue;
        };
        if let Some(value) = plugin.summarize(metrics) {
            summary.insert(plugin.name().to_string(), value);
        }
    }
    summary
}
