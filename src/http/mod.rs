//! The thin axum HTTP surface over the job engines (spec §6). Request
//! validation happens in the config builders; handlers only translate
//! between wire shapes and engine calls.

pub mod crawl_routes;
pub mod dto;
pub mod playground_routes;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::app::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/crawl/{site_domain}", post(crawl_routes::create_crawl))
        .route("/playground/jobs", post(playground_routes::create_playground_job))
        .route(
            "/playground/jobs/{id}/start",
            post(playground_routes::start_playground_job),
        )
        .route("/playground/jobs/{id}", get(playground_routes::get_playground_job))
        .route(
            "/playground/jobs/{id}/progress",
            get(playground_routes::get_playground_progress),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
