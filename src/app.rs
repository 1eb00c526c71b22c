//! Application wiring: constructs the job store, queue, event bus, engines,
//! and webhook emitter exactly once at process start and injects them
//! everywhere, resolving the source's "engine per request vs. module-level
//! singleton" inconsistency (spec §9) in favor of the singleton.

use std::sync::Arc;

use crate::crawl::{CrawlEngine, HttpPageDriver};
use crate::engine::EngineRouter;
use crate::events::EventBus;
use crate::job::JobStore;
use crate::plugin::builtin::{ReversePlugin, TitlePlugin, UppercasePlugin, WordCountPlugin};
use crate::plugin::{CrawlPlugin, PlaygroundPluginRegistry};
use crate::playground::PlaygroundEngine;
use crate::queue::JobQueue;
use crate::webhook::WebhookEmitter;

/// Shared state injected into every HTTP handler via axum's `State` extractor.
///
/// Holds concrete engine handles (for `create_job`/`get_progress`, which
/// aren't part of the [`crate::engine::JobEngine`] trait the dispatcher
/// uses) alongside the trait-object [`EngineRouter`] the queue dispatches
/// through.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JobStore>,
    pub queue: Arc<JobQueue>,
    pub bus: Arc<EventBus>,
    pub crawl_engine: Arc<CrawlEngine>,
    pub playground_engine: Arc<PlaygroundEngine>,
}

impl AppState {
    /// Builds the full dependency graph and spawns the dispatcher and
    /// webhook emitter background tasks. Call once at startup.
    #[must_use]
    pub fn bootstrap(max_queue_depth: Option<usize>) -> Self {
        let store = Arc::new(JobStore::new());
        let queue = Arc::new(JobQueue::new(max_queue_depth));
        let bus = Arc::new(EventBus::new(1024));

        let crawl_plugins: Vec<Arc<dyn CrawlPlugin>> = vec![Arc::new(WordCountPlugin), Arc::new(TitlePlugin)];
        let driver = Arc::new(HttpPageDriver::new("crawlhub/0.1".to_string()));
        let crawl_engine = Arc::new(CrawlEngine::new(
            store.clone(),
            queue.clone(),
            bus.clone(),
            crawl_plugins,
            driver,
        ));

        let mut registry = PlaygroundPluginRegistry::new();
        registry.register("reverse", || Box::new(ReversePlugin));
        registry.register("uppercase", || Box::new(UppercasePlugin));
        let registry = Arc::new(registry);
        let playground_engine = Arc::new(PlaygroundEngine::new(store.clone(), queue.clone(), bus.clone(), registry));

        let router = EngineRouter {
            crawl: crawl_engine.clone(),
            playground: playground_engine.clone(),
        };
        queue.clone().spawn_dispatcher(router);

        let emitter = Arc::new(WebhookEmitter::new(bus.clone()));
        emitter.spawn();

        Self {
            store,
            queue,
            bus,
            crawl_engine,
            playground_engine,
        }
    }
}
