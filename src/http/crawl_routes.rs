//! `POST /crawl/{siteDomain}` (spec §6).

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;

use super::dto::{CrawlAcceptedResponse, CrawlConfigDto, ErrorResponse, QueueInfo, WebhookInfo};
use crate::app::AppState;
use crate::config::{CrawlConfig, ConfigError};
use crate::queue::QueueError;

pub async fn create_crawl(
    State(state): State<AppState>,
    Path(site_domain): Path<String>,
    Json(body): Json<CrawlConfigDto>,
) -> Result<Json<CrawlAcceptedResponse>, (StatusCode, Json<ErrorResponse>)> {
    let config = build_config(&site_domain, body).map_err(to_error_response)?;
    let webhook_url = config.webhook.url.clone();
    let expected_updates = vec!["started", "progress", "completed", "failed"];

    let job = state.crawl_engine.create_job(config).await.map_err(to_queue_error_response)?;

    Ok(Json(CrawlAcceptedResponse {
        message: "Crawl job accepted".to_string(),
        job_id: job.id,
        status: "accepted",
        queue_info: QueueInfo {
            position: state.queue.length(),
            is_processing: state.queue.is_processing(),
            estimated_start: Utc::now().to_rfc3339(),
        },
        webhook: WebhookInfo {
            url: webhook_url,
            expected_updates,
        },
    }))
}

fn build_config(site_domain: &str, body: CrawlConfigDto) -> Result<CrawlConfig, ConfigError> {
    let mut builder = CrawlConfig::builder().start_url(site_domain)?.webhook(body.webhook);

    if let Some(v) = body.max_depth {
        builder = builder.max_depth(v);
    }
    if let Some(v) = body.max_pages {
        builder = builder.max_pages(v);
    }
    if let Some(v) = body.max_requests_per_minute {
        builder = builder.max_requests_per_minute(v);
    }
    if let Some(v) = body.max_concurrency {
        builder = builder.max_concurrency(v);
    }
    if let Some(timeout) = &body.timeout {
        if let Some(page) = timeout.page {
            builder = builder.timeout_page_ms(page);
        }
        if let Some(request) = timeout.request {
            builder = builder.timeout_request_ms(request);
        }
    }
    if !body.headers.is_empty() {
        builder = builder.headers(body.headers);
    }
    if let Some(ua) = body.user_agent {
        builder = builder.user_agent(ua);
    }
    builder = builder.respect_robots_txt(body.respect_robots_txt);
    if body.sitemap_url.is_some() {
        builder = builder.sitemap_url(body.sitemap_url);
    }

    builder.build()
}

fn to_error_response(err: ConfigError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        ConfigError::InvalidDomain(domain) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::invalid_domain(format!("'{domain}' is not a valid domain"))),
        ),
        other => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::invalid_configuration(vec![other.as_issue()])),
        ),
    }
}

fn to_queue_error_response(err: QueueError) -> (StatusCode, Json<ErrorResponse>) {
    let QueueError::Full(max_depth) = err;
    (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse::queue_full(max_depth)))
}
