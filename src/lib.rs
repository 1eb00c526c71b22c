pub mod app;
pub mod config;
pub mod crawl;
pub mod engine;
pub mod events;
pub mod http;
pub mod job;
pub mod observability;
pub mod playground;
pub mod plugin;
pub mod queue;
pub mod utils;
pub mod webhook;

pub use app::AppState;
pub use config::{CrawlConfig, PlaygroundConfig, WebhookConfig};
pub use engine::{EngineError, EngineRouter, JobEngine};
pub use job::{Job, JobConfig, JobKind, JobStatus, JobStore};
