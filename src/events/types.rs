//! Typed event kinds published on the internal [`super::bus::EventBus`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::job::{Job, JobErrorRecord, PageAnalysis};

/// Reason an [`EventBus`](super::bus::EventBus) shut down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShutdownReason {
    JobCompleted,
    Error(String),
    Cancelled,
}

/// The ten internal event kinds a job engine emits (spec §4.4). `jobId` is
/// carried by every variant so subscribers can key without matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JobEvent {
    JobStart {
        job_id: Uuid,
        job: Job,
        timestamp: DateTime<Utc>,
    },
    JobComplete {
        job_id: Uuid,
        job: Job,
        timestamp: DateTime<Utc>,
    },
    JobError {
        job_id: Uuid,
        job: Job,
        error: JobErrorRecord,
        timestamp: DateTime<Utc>,
    },
    /// Crawl only.
    PageStart {
        job_id: Uuid,
        job: Job,
        url: String,
        timestamp: DateTime<Utc>,
    },
    /// Crawl only.
    PageComplete {
        job_id: Uuid,
        job: Job,
        page_analysis: PageAnalysis,
        timestamp: DateTime<Utc>,
    },
    /// Crawl only.
    PageError {
        job_id: Uuid,
        job: Job,
        url: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    PluginStart {
        job_id: Uuid,
        job: Job,
        plugin_name: String,
        timestamp: DateTime<Utc>,
    },
    PluginComplete {
        job_id: Uuid,
        job: Job,
        plugin_name: String,
        metrics: Value,
        timestamp: DateTime<Utc>,
    },
    PluginError {
        job_id: Uuid,
        job: Job,
        plugin_name: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// Periodic tick while a job is running.
    Progress {
        job_id: Uuid,
        job: Job,
        timestamp: DateTime<Utc>,
    },
    /// Signals that the event bus is shutting down; subscribers should exit
    /// their receive loops.
    Shutdown {
        reason: ShutdownReason,
        timestamp: DateTime<Utc>,
    },
}

impl JobEvent {
    /// The outbound webhook event name this internal event maps to, per the
    /// one-to-one mapping in spec §4.5. `Shutdown` has no outbound mapping.
    pub fn webhook_name(&self) -> Option<&'static str> {
        match self {
            JobEvent::JobStart { .. } => Some("started"),
            JobEvent::JobComplete { .. } => Some("completed"),
            JobEvent::JobError { .. } => Some("failed"),
            JobEvent::PageComplete { .. } => Some("progress"),
            JobEvent::PluginComplete { .. } => Some("progress"),
            JobEvent::Progress { .. } => Some("progress"),
            JobEvent::PageStart { .. }
            | JobEvent::PageError { .. }
            | JobEvent::PluginStart { .. }
            | JobEvent::PluginError { .. }
            | JobEvent::Shutdown { .. } => None,
        }
    }

    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            JobEvent::JobStart { job_id, .. }
            | JobEvent::JobComplete { job_id, .. }
            | JobEvent::JobError { job_id, .. }
            | JobEvent::PageStart { job_id, .. }
            | JobEvent::PageComplete { job_id, .. }
            | JobEvent::PageError { job_id, .. }
            | JobEvent::PluginStart { job_id, .. }
            | JobEvent::PluginComplete { job_id, .. }
            | JobEvent::PluginError { job_id, .. }
            | JobEvent::Progress { job_id, .. } => Some(*job_id),
            JobEvent::Shutdown { .. } => None,
        }
    }
}

/// Result of publishing a batch of events. Always represents successful
/// execution of the batch operation itself — the fields report how many
/// individual events found subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPublishResult {
    pub total: usize,
    pub published: usize,
    pub failed: usize,
    pub max_subscribers: usize,
}

impl BatchPublishResult {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.published == self.total && self.failed == 0
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.published as f64 / self.total as f64) * 100.0
    }
}
