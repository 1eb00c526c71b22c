//! Plugin capability set (spec §4.2): an ordered set of optional lifecycle
//! hooks around either a crawled page or a single opaque input.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::storage::{PluginStorage, PluginStorageRegistry};
use crate::job::Job;

/// A throw from any one plugin hook. Isolated at the pipeline boundary —
/// it never propagates past the plugin that raised it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct PluginError(pub String);

impl From<&str> for PluginError {
    fn from(s: &str) -> Self {
        PluginError(s.to_string())
    }
}

impl From<String> for PluginError {
    fn from(s: String) -> Self {
        PluginError(s)
    }
}

pub type PluginResult<T> = Result<T, PluginError>;

/// One crawled page, as seen by a plugin's `before_each`/`evaluate`/`after_each`.
#[derive(Clone)]
pub struct PageContext {
    pub url: String,
    pub depth: u32,
    pub status_code: Option<u16>,
    pub html: String,
    storage: Arc<PluginStorageRegistry>,
}

impl PageContext {
    pub fn new(url: String, depth: u32, status_code: Option<u16>, html: String, storage: Arc<PluginStorageRegistry>) -> Self {
        Self {
            url,
            depth,
            status_code,
            html,
            storage,
        }
    }

    /// This plugin's isolated keyed store, created on first access.
    pub fn storage_for(&self, plugin_name: &str) -> Arc<PluginStorage> {
        self.storage.get(plugin_name)
    }
}

/// The single input/output slot a playground job's pipeline runs over.
pub struct PlaygroundContext {
    pub job_id: Uuid,
    pub input: Value,
    pub output: parking_lot::Mutex<Option<Value>>,
    pub start_time: DateTime<Utc>,
    storage: PluginStorageRegistry,
}

impl PlaygroundContext {
    pub fn new(job_id: Uuid, input: Value) -> Self {
        Self {
            job_id,
            input,
            output: parking_lot::Mutex::new(None),
            start_time: Utc::now(),
            storage: PluginStorageRegistry::new(),
        }
    }

    /// This plugin's isolated keyed store, created on first access.
    pub fn storage_for(&self, plugin_name: &str) -> Arc<PluginStorage> {
        self.storage.get(plugin_name)
    }
}

/// A plugin run over a browser-controlled page traversal.
#[async_trait]
pub trait CrawlPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Called once at engine construction.
    async fn initialize(&self) {}

    /// Called on entry to `StartJob`.
    async fn before_crawl(&self, _job: &Job) {}

    async fn before_each(&self, _page: &PageContext) {}

    /// Required. A failure here is recorded as a per-(page, plugin) error,
    /// not a page failure.
    async fn evaluate(&self, page: &PageContext, load_time_ms: u64) -> PluginResult<Value>;

    async fn after_each(&self, _page: &PageContext) {}

    /// Called after all pages have been visited.
    async fn after_crawl(&self, _job: &Job) {}

    /// Called at end of job with every metric this plugin produced, in
    /// completion order. A panic-free default omits this plugin from the
    /// summary.
    fn summarize(&self, _metrics: &[Value]) -> Option<Value> {
        None
    }

    /// Called on engine shutdown.
    async fn destroy(&self) {}
}

/// A plugin run once over an opaque input in the Playground variant.
#[async_trait]
pub trait PlaygroundPlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn initialize(&self) {}

    async fn before(&self, _ctx: &PlaygroundContext) {}

    /// Required. A failure here is recorded on `result.error` (last writer
    /// wins) and execution continues with the next plugin.
    async fn execute(&self, ctx: &PlaygroundContext) -> PluginResult<Value>;

    async fn after(&self, _ctx: &PlaygroundContext) {}

    fn summarize(&self, _metrics: &[Value]) -> Option<Value> {
        None
    }

    async fn destroy(&self) {}
}
