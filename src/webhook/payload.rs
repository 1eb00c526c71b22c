//! Builds the outbound JSON body for one webhook delivery (spec §6).

use chrono::Utc;
use serde_json::{Map, Value, json};

use crate::events::JobEvent;
use crate::job::{Job, JobConfig, JobKind};

/// `status ∈ {started, progress, completed, failed}`; every payload carries
/// `{status, jobId, timestamp}` plus status-specific fields.
pub fn build_payload(event: &JobEvent, job: &Job) -> Option<Value> {
    let status = event.webhook_name()?;
    let mut body = Map::new();
    body.insert("status".into(), Value::String(status.to_string()));
    body.insert("jobId".into(), Value::String(job.id.to_string()));
    body.insert(
        "timestamp".into(),
        Value::String(Utc::now().to_rfc3339()),
    );

    match event {
        JobEvent::JobStart { .. } => {
            body.insert("config".into(), started_config(&job.config));
        }
        JobEvent::PageComplete { page_analysis, .. } => {
            body.insert("progress".into(), crawl_progress(job));
            body.insert(
                "currentPage".into(),
                json!({
                    "url": page_analysis.url,
                    "title": page_analysis.title,
                    "wordCount": page_analysis.word_count,
                }),
            );
        }
        JobEvent::PluginComplete {
            plugin_name,
            metrics,
            ..
        } => {
            body.insert("pluginName".into(), Value::String(plugin_name.clone()));
            body.insert("metrics".into(), metrics.clone());
            body.insert("progress".into(), playground_progress(job));
        }
        JobEvent::Progress { .. } => match job.kind {
            JobKind::Crawl => {
                body.insert("progress".into(), crawl_progress(job));
            }
            JobKind::Playground => {
                body.insert("progress".into(), playground_progress(job));
            }
        },
        JobEvent::JobComplete { .. } => {
            let result = job
                .result
                .as_ref()
                .map(|r| json!({ "pages": r.pages, "metrics": r.metrics, "summary": r.summary }))
                .unwrap_or(Value::Null);
            body.insert("result".into(), result);
            body.insert("summary".into(), completion_summary(job));
        }
        JobEvent::JobError { error, .. } => {
            body.insert("error".into(), Value::String(error.message.clone()));
            body.insert("progress".into(), match job.kind {
                JobKind::Crawl => crawl_progress(job),
                JobKind::Playground => playground_progress(job),
            });
        }
        _ => {}
    }

    Some(Value::Object(body))
}

fn started_config(config: &JobConfig) -> Value {
    match config {
        JobConfig::Crawl(cfg) => json!({
            "url": cfg.start_url.to_string(),
            "maxDepth": cfg.max_depth,
            "maxPages": cfg.max_pages,
        }),
        JobConfig::Playground(cfg) => json!({
            "plugins": cfg.plugins,
        }),
    }
}

fn crawl_progress(job: &Job) -> Value {
    let p = &job.progress;
    json!({
        "pagesAnalyzed": p.pages_analyzed,
        "totalPages": p.total_pages,
        "currentUrl": p.current_url,
        "uniqueUrls": p.unique_urls,
        "skippedUrls": p.skipped_urls,
        "failedUrls": p.failed_urls,
        "currentDepth": p.current_depth,
        "elapsedTime": p.elapsed_ms(Utc::now()),
    })
}

fn playground_progress(job: &Job) -> Value {
    let p = &job.progress;
    json!({
        "status": p.status,
        "completedPlugins": p.completed_plugins,
        "currentPlugin": p.current_plugin,
    })
}

fn completion_summary(job: &Job) -> Value {
    let p = &job.progress;
    match job.kind {
        JobKind::Crawl => json!({
            "duration": p.elapsed_ms(Utc::now()),
            "pagesAnalyzed": p.pages_analyzed,
            "uniqueUrls": p.unique_urls,
            "skippedUrls": p.skipped_urls,
            "failedUrls": p.failed_urls,
        }),
        JobKind::Playground => json!({
            "duration": p.elapsed_ms(Utc::now()),
            "completedPlugins": p.completed_plugins,
        }),
    }
}
