//! The shared contract both concrete engines (`crawl::CrawlEngine`,
//! `playground::PlaygroundEngine`) implement, and the dispatcher's view of
//! "an engine" — see spec §4.1.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::job::Job;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("job {0} not found")]
    NotFound(Uuid),
    #[error("job {0} is already terminal")]
    AlreadyTerminal(Uuid),
    #[error("engine run failed: {0}")]
    RunFailed(String),
}

/// Implemented by `CrawlEngine` and `PlaygroundEngine`. The [`crate::queue::JobQueue`]
/// dispatcher only ever calls [`start_job`](JobEngine::start_job) — `CreateJob`,
/// `GetJob`, `GetProgress`, and `FailJob` are called directly by HTTP handlers
/// and by the engine's own run loop.
#[async_trait]
pub trait JobEngine: Send + Sync {
    /// Transitions `queued → running`, drives the pipeline to completion or
    /// failure, and returns once the job has reached a terminal state.
    ///
    /// Must not propagate plugin- or page-level errors — those are recorded
    /// on the job's `result` and surfaced as events. An `Err` here means the
    /// run itself could not proceed (driver init failure, an unhandled panic
    /// boundary); the engine is expected to have already called `FailJob`
    /// before returning it, so the dispatcher only logs and moves on.
    async fn start_job(&self, id: Uuid) -> Result<(), EngineError>;

    async fn get_job(&self, id: Uuid) -> Option<Arc<Job>>;

    async fn fail_job(&self, id: Uuid, message: String) -> Result<Arc<Job>, EngineError>;
}

/// Routes a dequeued job to the engine that owns its kind.
#[derive(Clone)]
pub struct EngineRouter {
    pub crawl: Arc<dyn JobEngine>,
    pub playground: Arc<dyn JobEngine>,
}

impl EngineRouter {
    pub fn for_kind(&self, kind: crate::job::JobKind) -> &Arc<dyn JobEngine> {
        match kind {
            crate::job::JobKind::Crawl => &self.crawl,
            crate::job::JobKind::Playground => &self.playground,
        }
    }
}
