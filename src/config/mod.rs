//! Request-shaped configuration for crawl and playground jobs.
//!
//! Configs arrive as JSON over HTTP and are turned into frozen, validated
//! snapshots before a `Job` is ever created — invalid configuration never
//! reaches the engine.

pub mod crawl_config;
pub mod playground_config;
pub mod webhook_config;

pub use crawl_config::{CrawlConfig, CrawlConfigBuilder};
pub use playground_config::{PlaygroundConfig, PlaygroundConfigBuilder};
pub use webhook_config::WebhookConfig;

use thiserror::Error;

/// Raised by a builder's `.build()` when the assembled configuration
/// violates a documented range or is missing a required field.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("{field} must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// One issue entry for the HTTP 400 `{error:"Invalid configuration", issues}` shape.
    pub fn as_issue(&self) -> String {
        self.to_string()
    }
}
