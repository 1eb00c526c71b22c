//! Request/response bodies for the HTTP surface (spec §6).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::WebhookConfig;

#[derive(Debug, Deserialize)]
pub struct TimeoutDto {
    pub page: Option<u64>,
    pub request: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlConfigDto {
    pub max_depth: Option<u32>,
    pub max_pages: Option<u32>,
    pub max_requests_per_minute: Option<u32>,
    pub max_concurrency: Option<u32>,
    pub timeout: Option<TimeoutDto>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub respect_robots_txt: bool,
    pub sitemap_url: Option<String>,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueInfo {
    pub position: usize,
    pub is_processing: bool,
    pub estimated_start: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookInfo {
    pub url: String,
    pub expected_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlAcceptedResponse {
    pub message: String,
    pub job_id: Uuid,
    pub status: &'static str,
    pub queue_info: QueueInfo,
    pub webhook: WebhookInfo,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: Option<String>,
    pub issues: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn invalid_domain(message: impl Into<String>) -> Self {
        Self {
            error: "Invalid domain",
            message: Some(message.into()),
            issues: None,
        }
    }

    pub fn invalid_configuration(issues: Vec<String>) -> Self {
        Self {
            error: "Invalid configuration",
            message: None,
            issues: Some(issues),
        }
    }

    pub fn queue_full(max_depth: usize) -> Self {
        Self {
            error: "Queue full",
            message: Some(format!("the job queue is at capacity ({max_depth} jobs)")),
            issues: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundJobRequest {
    pub input: Value,
    #[serde(default)]
    pub retries: u32,
    pub plugins: Option<Vec<String>>,
    pub webhook: Option<WebhookConfig>,
    #[serde(default)]
    pub r#async: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundAcceptedResponse {
    pub job_id: Uuid,
    pub status: &'static str,
    pub message: String,
}
