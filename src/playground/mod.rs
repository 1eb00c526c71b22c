//! `PlaygroundEngine`: runs the plugin pipeline once over an opaque input
//! instead of a page traversal (spec §4.1 "Playground engine behavior").

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::config::PlaygroundConfig;
use crate::engine::{EngineError, JobEngine};
use crate::events::{EventBus, JobEvent};
use crate::job::{Job, JobConfig, JobErrorRecord, JobKind, JobResult, JobStatus, JobStore, MetricEntry};
use crate::plugin::{PlaygroundContext, PlaygroundPluginRegistry};
use crate::queue::{JobQueue, QueueError};

pub struct PlaygroundEngine {
    store: Arc<JobStore>,
    queue: Arc<JobQueue>,
    bus: Arc<EventBus>,
    registry: Arc<PlaygroundPluginRegistry>,
}

impl PlaygroundEngine {
    #[must_use]
    pub fn new(store: Arc<JobStore>, queue: Arc<JobQueue>, bus: Arc<EventBus>, registry: Arc<PlaygroundPluginRegistry>) -> Self {
        Self {
            store,
            queue,
            bus,
            registry,
        }
    }

    /// Create-and-start-immediately per spec §4.1: a Playground job is
    /// enqueued like any other, but `async=false` callers want the final
    /// `Job` in the same HTTP response, so the HTTP layer awaits completion
    /// via [`JobStore`] polling rather than this method racing the queue.
    pub async fn create_job(&self, config: PlaygroundConfig) -> Result<Arc<Job>, QueueError> {
        let id = Uuid::new_v4();
        self.queue.enqueue(id, JobKind::Playground)?;
        let job = Job::new(id, JobConfig::Playground(config), Utc::now());
        Ok(self.store.insert(job))
    }

    #[must_use]
    pub fn get_progress(&self, id: Uuid) -> Option<crate::job::Progress> {
        self.store.get(id).map(|job| job.progress.clone())
    }

    async fn emit(&self, event: JobEvent) {
        let _ = self.bus.publish(event).await;
    }
}

#[async_trait]
impl JobEngine for PlaygroundEngine {
    async fn start_job(&self, id: Uuid) -> Result<(), EngineError> {
        let Some(job) = self.store.get(id) else {
            return Err(EngineError::NotFound(id));
        };
        if job.progress.status.is_terminal() {
            return Err(EngineError::AlreadyTerminal(id));
        }
        let config = match &job.config {
            JobConfig::Playground(cfg) => cfg.clone(),
            JobConfig::Crawl(_) => return Err(EngineError::RunFailed("not a playground job".into())),
        };

        let now = Utc::now();
        let started = self
            .store
            .update(id, |j| {
                j.progress.status = JobStatus::Running;
                j.result = Some(JobResult::default());
            })
            .ok_or(EngineError::NotFound(id))?;
        self.emit(JobEvent::JobStart {
            job_id: id,
            job: (*started).clone(),
            timestamp: now,
        })
        .await;

        let plugins = self.registry.create_all(config.plugins.as_deref());
        let ctx = PlaygroundContext::new(id, config.input.clone());

        for plugin in &plugins {
            plugin.initialize().await;
        }

        // Plugins execute strictly in configuration order (spec §5); a
        // single plugin's failure is isolated to `result.error` and does
        // not stop the remaining plugins from running.
        for plugin in &plugins {
            let name = plugin.name().to_string();
            let updated = self.store.update(id, |j| j.progress.current_plugin = Some(name.clone()));
            if let Some(job) = updated {
                self.emit(JobEvent::PluginStart {
                    job_id: id,
                    job: (*job).clone(),
                    plugin_name: name.clone(),
                    timestamp: Utc::now(),
                })
                .await;
            }

            plugin.before(&ctx).await;
            match plugin.execute(&ctx).await {
                Ok(value) => {
                    *ctx.output.lock() = Some(value.clone());
                    let updated = self.store.update(id, |j| {
                        j.progress.completed_plugins.push(name.clone());
                        j.progress.current_plugin = None;
                        if let Some(result) = j.result.as_mut() {
                            result.metrics.push(MetricEntry {
                                plugin_name: name.clone(),
                                page_url: None,
                                value: value.clone(),
                            });
                        }
                    });
                    if let Some(job) = updated {
                        self.emit(JobEvent::PluginComplete {
                            job_id: id,
                            job: (*job).clone(),
                            plugin_name: name.clone(),
                            metrics: value,
                            timestamp: Utc::now(),
                        })
                        .await;
                    }
                }
                Err(err) => {
                    let error = JobErrorRecord {
                        message: err.0.clone(),
                        plugin_name: Some(name.clone()),
                        timestamp: Utc::now(),
                    };
                    let updated = self.store.update(id, |j| {
                        j.progress.current_plugin = None;
                        if let Some(result) = j.result.as_mut() {
                            result.error = Some(error.clone());
                        }
                    });
                    if let Some(job) = updated {
                        self.emit(JobEvent::PluginError {
                            job_id: id,
                            job: (*job).clone(),
                            plugin_name: name.clone(),
                            error: err.0,
                            timestamp: Utc::now(),
                        })
                        .await;
                    }
                }
            }
            plugin.after(&ctx).await;
        }

        let mut summaries = serde_json::Map::new();
        if let Some(job) = self.store.get(id) {
            if let Some(result) = &job.result {
                let by_plugin: std::collections::HashMap<String, Vec<Value>> = result
                    .metrics
                    .iter()
                    .fold(std::collections::HashMap::new(), |mut acc, m| {
                        acc.entry(m.plugin_name.clone()).or_default().push(m.value.clone());
                        acc
                    });
                for plugin in &plugins {
                    if let Some(metrics) = by_plugin.get(plugin.name()) {
                        if let Some(summary) = plugin.summarize(metrics) {
                            summaries.insert(plugin.name().to_string(), summary);
                        }
                    }
                }
            }
        }
        self.store.update(id, |j| {
            if let Some(result) = j.result.as_mut() {
                result.summary = summaries;
            }
        });

        for plugin in &plugins {
            plugin.destroy().await;
        }

        let now = Utc::now();
        let completed = self
            .store
            .update(id, |j| {
                j.progress.status = JobStatus::Completed;
                j.progress.end_time = Some(now);
            })
            .ok_or(EngineError::NotFound(id))?;
        self.emit(JobEvent::JobComplete {
            job_id: id,
            job: (*completed).clone(),
            timestamp: now,
        })
        .await;
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Option<Arc<Job>> {
        self.store.get(id)
    }

    async fn fail_job(&self, id: Uuid, message: String) -> Result<Arc<Job>, EngineError> {
        let Some(job) = self.store.get(id) else {
            return Err(EngineError::NotFound(id));
        };
        if job.progress.status.is_terminal() {
            return Ok(job);
        }
        let now = Utc::now();
        let error = JobErrorRecord {
            message,
            plugin_name: None,
            timestamp: now,
        };
        let updated = self
            .store
            .update(id, |j| {
                j.progress.status = JobStatus::Failed;
                j.progress.end_time = Some(now);
                j.progress.error = Some(error.clone());
                if let Some(result) = j.result.as_mut() {
                    result.error = Some(error.clone());
                }
            })
            .ok_or(EngineError::NotFound(id))?;
        self.emit(JobEvent::JobError {
            job_id: id,
            job: (*updated).clone(),
            error,
            timestamp: now,
        })
        .await;
        Ok(updated)
    }
}
