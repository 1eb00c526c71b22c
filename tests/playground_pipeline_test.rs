use std::sync::Arc;

use crawlhub_core::config::PlaygroundConfig;
use crawlhub_core::engine::JobEngine;
use crawlhub_core::events::EventBus;
use crawlhub_core::job::{JobStatus, JobStore};
use crawlhub_core::playground::PlaygroundEngine;
use crawlhub_core::plugin::PlaygroundPluginRegistry;
use crawlhub_core::plugin::builtin::{ReversePlugin, UppercasePlugin};
use crawlhub_core::queue::JobQueue;
use serde_json::json;

fn build_engine() -> PlaygroundEngine {
    let store = Arc::new(JobStore::new());
    let queue = Arc::new(JobQueue::new(None));
    let bus = Arc::new(EventBus::new(64));
    let mut registry = PlaygroundPluginRegistry::new();
    registry.register("reverse", || Box::new(ReversePlugin));
    registry.register("uppercase", || Box::new(UppercasePlugin));
    PlaygroundEngine::new(store, queue, bus, Arc::new(registry))
}

#[tokio::test]
async fn runs_plugins_in_registration_order_and_completes() {
    let engine = build_engine();
    let config = PlaygroundConfig::builder().input(json!("hello")).build().unwrap();
    let job = engine.create_job(config).await.unwrap();

    engine.start_job(job.id).await.unwrap();

    let finished = engine.get_job(job.id).await.unwrap();
    assert_eq!(finished.progress.status, JobStatus::Completed);
    assert_eq!(finished.progress.completed_plugins, vec!["reverse", "uppercase"]);

    let result = finished.result.as_ref().unwrap();
    assert_eq!(result.metrics.len(), 2);
    assert!(result.summary.contains_key("reverse"));
}

#[tokio::test]
async fn isolates_a_failing_plugin_without_aborting_the_pipeline() {
    let engine = build_engine();
    // `reverse` requires a string input; feeding it a number makes it fail
    // while `uppercase` never runs (also a string-only plugin, so this
    // exercises both a failure and a later failure on the same input).
    let config = PlaygroundConfig::builder().input(json!(42)).build().unwrap();
    let job = engine.create_job(config).await.unwrap();

    engine.start_job(job.id).await.unwrap();

    let finished = engine.get_job(job.id).await.unwrap();
    assert_eq!(finished.progress.status, JobStatus::Completed);
    let result = finished.result.as_ref().unwrap();
    assert!(result.error.is_some());
}

#[tokio::test]
async fn plugins_filter_limits_the_pipeline_to_named_plugins() {
    let engine = build_engine();
    let config = PlaygroundConfig::builder()
        .input(json!("abc"))
        .plugins(Some(vec!["uppercase".to_string()]))
        .build()
        .unwrap();
    let job = engine.create_job(config).await.unwrap();

    engine.start_job(job.id).await.unwrap();

    let finished = engine.get_job(job.id).await.unwrap();
    assert_eq!(finished.progress.completed_plugins, vec!["uppercase"]);
}

#[tokio::test]
async fn fail_job_marks_a_running_job_failed_without_double_transition() {
    let engine = build_engine();
    let config = PlaygroundConfig::builder().input(json!("x")).build().unwrap();
    let job = engine.create_job(config).await.unwrap();

    let failed = engine.fail_job(job.id, "driver unavailable".to_string()).await.unwrap();
    assert_eq!(failed.progress.status, JobStatus::Failed);

    // Failing an already-terminal job is a no-op, not an error.
    let again = engine.fail_job(job.id, "second failure".to_string()).await.unwrap();
    assert_eq!(again.progress.error.as_ref().unwrap().message, "driver unavailable");
}
