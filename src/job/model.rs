use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{CrawlConfig, PlaygroundConfig};

/// Which engine owns a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Crawl,
    Playground,
}

/// Frozen configuration snapshot, tagged by job kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobConfig {
    Crawl(CrawlConfig),
    Playground(PlaygroundConfig),
}

impl JobConfig {
    pub fn kind(&self) -> JobKind {
        match self {
            JobConfig::Crawl(_) => JobKind::Crawl,
            JobConfig::Playground(_) => JobKind::Playground,
        }
    }
}

/// `queued → running → (completed|failed)`. No other transition is legal;
/// `Completed`/`Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobErrorRecord {
    pub message: String,
    pub plugin_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Observable, continuously-updated status snapshot attached to a [`Job`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub status: JobStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<JobErrorRecord>,

    // Crawl-specific.
    pub pages_analyzed: u32,
    pub total_pages: Option<u32>,
    pub current_url: Option<String>,
    pub current_depth: u32,
    pub unique_urls: u32,
    pub skipped_urls: u32,
    pub failed_urls: u32,

    // Playground-specific.
    pub current_plugin: Option<String>,
    pub completed_plugins: Vec<String>,
}

impl Progress {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Queued,
            start_time: now,
            end_time: None,
            error: None,
            pages_analyzed: 0,
            total_pages: None,
            current_url: None,
            current_depth: 0,
            unique_urls: 0,
            skipped_urls: 0,
            failed_urls: 0,
            current_plugin: None,
            completed_plugins: Vec::new(),
        }
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        let end = self.end_time.unwrap_or(now);
        (end - self.start_time).num_milliseconds().max(0)
    }
}

/// One crawled page's outcome, attached to a `pageComplete`/`pageError` event
/// and appended to `JobResult.pages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub url: String,
    pub depth: u32,
    pub status_code: Option<u16>,
    pub load_time_ms: u64,
    pub title: Option<String>,
    pub word_count: Option<usize>,
    pub error: Option<String>,
}

/// One metric contribution from a single plugin invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricEntry {
    pub plugin_name: String,
    pub page_url: Option<String>,
    pub value: Value,
}

/// Accumulates as a job runs; present (possibly empty) once a run begins,
/// absent while `status=queued`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub metrics: Vec<MetricEntry>,
    #[serde(default)]
    pub pages: Vec<PageAnalysis>,
    pub summary: serde_json::Map<String, Value>,
    pub error: Option<JobErrorRecord>,
}

/// The primary entity: one per client request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub config: JobConfig,
    pub progress: Progress,
    pub result: Option<JobResult>,
    pub priority: i32,
    pub retries: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: Uuid, config: JobConfig, now: DateTime<Utc>) -> Self {
        let kind = config.kind();
        Self {
            id,
            kind,
            config,
            progress: Progress::new(now),
            result: None,
            priority: 0,
            retries: 0,
            max_retries: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
