//! `CrawlEngine`: orchestrates one crawl job end to end — frontier
//! discovery, per-page plugin pipeline, progress accounting, and event
//! emission (spec §4.1 "Crawl engine behavior").

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use scraper::{Html, Selector};
use serde_json::Value;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::frontier::Frontier;
use super::rate_limiter::CrawlRateLimiter;
use super::robots::{self, RobotsRules};
use super::sitemap;
use super::driver::PageDriver;
use crate::config::CrawlConfig;
use crate::engine::{EngineError, JobEngine};
use crate::events::{EventBus, JobEvent};
use crate::job::{
    Job, JobConfig, JobErrorRecord, JobKind, JobResult, JobStatus, JobStore, MetricEntry, PageAnalysis, Progress,
};
use crate::plugin::{CrawlPlugin, PageContext, PluginStorageRegistry};
use crate::queue::{JobQueue, QueueError};

const PROGRESS_TICK: Duration = Duration::from_secs(10);
const PROGRESS_TICK_PAGES: u32 = 10;

pub struct CrawlEngine {
    store: Arc<JobStore>,
    queue: Arc<JobQueue>,
    bus: Arc<EventBus>,
    plugins: Vec<Arc<dyn CrawlPlugin>>,
    driver: Arc<dyn PageDriver>,
}

impl CrawlEngine {
    /// Spawns each plugin's `initialize()` once, per spec §4.2's "once at
    /// engine construction". Unlike Playground's per-job plugin instances,
    /// a crawl engine's plugins live for the engine's whole lifetime, so
    /// construction is the only sound place to call this.
    #[must_use]
    pub fn new(
        store: Arc<JobStore>,
        queue: Arc<JobQueue>,
        bus: Arc<EventBus>,
        plugins: Vec<Arc<dyn CrawlPlugin>>,
        driver: Arc<dyn PageDriver>,
    ) -> Self {
        for plugin in &plugins {
            let plugin = plugin.clone();
            tokio::spawn(async move {
                plugin.initialize().await;
            });
        }
        Self {
            store,
            queue,
            bus,
            plugins,
            driver,
        }
    }

    /// Calls `destroy()` once on every plugin. Intended to run once at
    /// process shutdown (spec §4.2's "engine shutdown" hook timing).
    pub async fn shutdown(&self) {
        for plugin in &self.plugins {
            plugin.destroy().await;
        }
    }

    /// Allocates a `queued` job and hands it to the queue. Mirrors
    /// `engine.CreateJob(config)` in spec §4.1 — unlike Playground, the
    /// crawl engine never auto-starts.
    ///
    /// Returns `Err` if the queue is at capacity; no `Job` is persisted in
    /// that case, per spec §4.3's "implementations SHOULD... reject
    /// enqueues with a distinct error" note.
    pub async fn create_job(&self, config: CrawlConfig) -> Result<Arc<Job>, QueueError> {
        let id = Uuid::new_v4();
        self.queue.enqueue(id, JobKind::Crawl)?;
        let job = Job::new(id, JobConfig::Crawl(config), Utc::now());
        Ok(self.store.insert(job))
    }

    #[must_use]
    pub fn get_progress(&self, id: Uuid) -> Option<Progress> {
        self.store.get(id).map(|job| job.progress.clone())
    }

    async fn emit(&self, event: JobEvent) {
        let _ = self.bus.publish(event).await;
    }

    async fn run(&self, id: Uuid, config: &CrawlConfig) -> anyhow::Result<()> {
        let robots = if config.respect_robots_txt {
            let client = reqwest::Client::new();
            robots::fetch(&client, &config.start_url, &config.user_agent).await
        } else {
            RobotsRules::allow_all()
        };

        let frontier = Arc::new(parking_lot::Mutex::new(Frontier::new(&config.start_url)));
        if let Some(sitemap_url) = &config.sitemap_url {
            if let Ok(url) = url::Url::parse(sitemap_url) {
                let client = reqwest::Client::new();
                for loc in sitemap::fetch_locations(&client, &url).await {
                    frontier.lock().seed(loc);
                }
            }
        }

        let rate_limiter = Arc::new(CrawlRateLimiter::new(config.max_requests_per_minute));
        let semaphore = Arc::new(Semaphore::new(config.max_concurrency as usize));
        let metrics_by_plugin: Arc<DashMap<String, Vec<Value>>> = Arc::new(DashMap::new());
        let storage: Arc<PluginStorageRegistry> = Arc::new(PluginStorageRegistry::new());
        let active_workers = Arc::new(AtomicUsize::new(0));
        let pages_since_tick = Arc::new(AtomicU32::new(0));

        let ticker_handle = self.spawn_progress_ticker(id);

        // Tracks pages this run has committed to dispatching, incremented at
        // spawn time — not `progress.pages_analyzed`, which only advances
        // once a worker finishes and would let up to `maxConcurrency - 1`
        // extra pages slip past the budget while workers are still in
        // flight.
        let mut dispatched: u32 = 0;

        loop {
            if self.store.get(id).is_none() {
                break;
            }

            let next = if dispatched >= config.max_pages {
                None
            } else {
                frontier.lock().next()
            };

            let Some((page_url, depth)) = next else {
                if active_workers.load(Ordering::SeqCst) == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
                continue;
            };

            if depth > config.max_depth {
                continue;
            }

            if !robots.is_allowed(page_url.path()) {
                self.store.update(id, |j| j.progress.skipped_urls += 1);
                continue;
            }

            if let Some(filter) = &config.url_filter {
                if !filter(page_url.as_str()) {
                    self.store.update(id, |j| j.progress.skipped_urls += 1);
                    continue;
                }
            }

            dispatched += 1;
            let permit = semaphore.clone().acquire_owned().await?;
            active_workers.fetch_add(1, Ordering::SeqCst);

            let worker = PageWorker {
                job_id: id,
                store: self.store.clone(),
                bus: self.bus.clone(),
                plugins: self.plugins.clone(),
                driver: self.driver.clone(),
                rate_limiter: rate_limiter.clone(),
                frontier: frontier.clone(),
                metrics_by_plugin: metrics_by_plugin.clone(),
                storage: storage.clone(),
                pages_since_tick: pages_since_tick.clone(),
                timeout_page_ms: config.timeout_page_ms,
            };
            let active_workers = active_workers.clone();

            tokio::spawn(async move {
                worker.process(page_url, depth).await;
                drop(permit);
                active_workers.fetch_sub(1, Ordering::SeqCst);
            });
        }

        ticker_handle.abort();
        self.finalize_summaries(id, &metrics_by_plugin);
        Ok(())
    }

    fn spawn_progress_ticker(&self, id: Uuid) -> tokio::task::JoinHandle<()> {
        let bus = self.bus.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PROGRESS_TICK);
            interval.tick().await; // first tick fires immediately; skip it
            loop {
                interval.tick().await;
                let Some(job) = store.get(id) else { break };
                if job.progress.status.is_terminal() {
                    break;
                }
                let _ = bus
                    .publish(JobEvent::Progress {
                        job_id: id,
                        job: (*job).clone(),
                        timestamp: Utc::now(),
                    })
                    .await;
            }
        })
    }

    fn finalize_summaries(&self, id: Uuid, metrics_by_plugin: &DashMap<String, Vec<Value>>) {
        let mut summaries = serde_json::Map::new();
        for plugin in &self.plugins {
            if let Some(metrics) = metrics_by_plugin.get(plugin.name()) {
                if let Some(summary) = plugin.summarize(metrics.value()) {
                    summaries.insert(plugin.name().to_string(), summary);
                }
            }
        }
        self.store.update(id, |j| {
            if let Some(result) = j.result.as_mut() {
                result.summary = summaries;
            }
        });
    }
}

/// One in-flight page fetch plus its plugin pipeline run, owned by a
/// spawned task so up to `maxConcurrency` pages process concurrently.
struct PageWorker {
    job_id: Uuid,
    store: Arc<JobStore>,
    bus: Arc<EventBus>,
    plugins: Vec<Arc<dyn CrawlPlugin>>,
    driver: Arc<dyn PageDriver>,
    rate_limiter: Arc<CrawlRateLimiter>,
    frontier: Arc<parking_lot::Mutex<Frontier>>,
    metrics_by_plugin: Arc<DashMap<String, Vec<Value>>>,
    storage: Arc<PluginStorageRegistry>,
    pages_since_tick: Arc<AtomicU32>,
    timeout_page_ms: u64,
}

impl PageWorker {
    async fn process(&self, page_url: url::Url, depth: u32) {
        self.rate_limiter.acquire().await;

        if let Some(job) = self.store.get(self.job_id) {
            self.publish(JobEvent::PageStart {
                job_id: self.job_id,
                job: (*job).clone(),
                url: page_url.to_string(),
                timestamp: Utc::now(),
            })
            .await;
        }

        match self.driver.fetch(&page_url, self.timeout_page_ms).await {
            Ok(fetched) => self.handle_success(page_url, depth, fetched).await,
            Err(err) => self.handle_failure(page_url, depth, err.to_string()).await,
        }
    }

    async fn handle_success(&self, page_url: url::Url, depth: u32, fetched: super::driver::FetchedPage) {
        let page_ctx = PageContext::new(
            page_url.to_string(),
            depth,
            Some(fetched.status_code),
            fetched.html.clone(),
            self.storage.clone(),
        );

        for plugin in &self.plugins {
            plugin.before_each(&page_ctx).await;
        }

        let mut per_page_metrics: HashMap<String, Value> = HashMap::new();
        for plugin in &self.plugins {
            let name = plugin.name().to_string();
            if let Some(job) = self.store.get(self.job_id) {
                self.publish(JobEvent::PluginStart {
                    job_id: self.job_id,
                    job: (*job).clone(),
                    plugin_name: name.clone(),
                    timestamp: Utc::now(),
                })
                .await;
            }
            match plugin.evaluate(&page_ctx, fetched.load_time_ms).await {
                Ok(value) => {
                    self.metrics_by_plugin.entry(name.clone()).or_default().push(value.clone());
                    per_page_metrics.insert(name, value);
                }
                Err(err) => {
                    if let Some(job) = self.store.get(self.job_id) {
                        self.publish(JobEvent::PluginError {
                            job_id: self.job_id,
                            job: (*job).clone(),
                            plugin_name: name,
                            error: err.0,
                            timestamp: Utc::now(),
                        })
                        .await;
                    }
                }
            }
        }

        for plugin in &self.plugins {
            plugin.after_each(&page_ctx).await;
        }

        for (plugin_name, value) in &per_page_metrics {
            if let Some(job) = self.store.get(self.job_id) {
                self.publish(JobEvent::PluginComplete {
                    job_id: self.job_id,
                    job: (*job).clone(),
                    plugin_name: plugin_name.clone(),
                    metrics: value.clone(),
                    timestamp: Utc::now(),
                })
                .await;
            }
        }

        let (title, word_count) = extract_title_and_words(&fetched.html);
        let analysis = PageAnalysis {
            url: page_url.to_string(),
            depth,
            status_code: Some(fetched.status_code),
            load_time_ms: fetched.load_time_ms,
            title,
            word_count: Some(word_count),
            error: None,
        };

        let updated = self.store.update(self.job_id, |j| {
            j.progress.pages_analyzed += 1;
            j.progress.unique_urls += 1;
            j.progress.current_url = Some(analysis.url.clone());
            j.progress.current_depth = depth;
            if let Some(result) = j.result.as_mut() {
                for (plugin_name, value) in &per_page_metrics {
                    result.metrics.push(MetricEntry {
                        plugin_name: plugin_name.clone(),
                        page_url: Some(analysis.url.clone()),
                        value: value.clone(),
                    });
                }
                result.pages.push(analysis.clone());
            }
        });

        if let Some(job) = updated {
            self.publish(JobEvent::PageComplete {
                job_id: self.job_id,
                job: (*job).clone(),
                page_analysis: analysis,
                timestamp: Utc::now(),
            })
            .await;

            let ticks = self.pages_since_tick.fetch_add(1, Ordering::SeqCst) + 1;
            if ticks % PROGRESS_TICK_PAGES == 0 {
                self.publish(JobEvent::Progress {
                    job_id: self.job_id,
                    job: (*job).clone(),
                    timestamp: Utc::now(),
                })
                .await;
            }
        }

        let mut guard = self.frontier.lock();
        for href in &fetched.links {
            guard.discover(&page_url, href, depth + 1);
        }
    }

    async fn handle_failure(&self, page_url: url::Url, depth: u32, error: String) {
        let updated = self.store.update(self.job_id, |j| {
            j.progress.failed_urls += 1;
            if let Some(result) = j.result.as_mut() {
                result.pages.push(PageAnalysis {
                    url: page_url.to_string(),
                    depth,
                    status_code: None,
                    load_time_ms: 0,
                    title: None,
                    word_count: None,
                    error: Some(error.clone()),
                });
            }
        });
        if let Some(job) = updated {
            self.publish(JobEvent::PageError {
                job_id: self.job_id,
                job: (*job).clone(),
                url: page_url.to_string(),
                error,
                timestamp: Utc::now(),
            })
            .await;
        }
    }

    async fn publish(&self, event: JobEvent) {
        let _ = self.bus.publish(event).await;
    }
}

fn extract_title_and_words(html: &str) -> (Option<String>, usize) {
    let document = Html::parse_document(html);
    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());
    let word_count = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().split_whitespace().count())
        .unwrap_or(0);
    (title, word_count)
}

#[async_trait]
impl JobEngine for CrawlEngine {
    async fn start_job(&self, id: Uuid) -> Result<(), EngineError> {
        let Some(job) = self.store.get(id) else {
            return Err(EngineError::NotFound(id));
        };
        if job.progress.status.is_terminal() {
            return Err(EngineError::AlreadyTerminal(id));
        }
        let config = match &job.config {
            JobConfig::Crawl(cfg) => cfg.clone(),
            JobConfig::Playground(_) => return Err(EngineError::RunFailed("not a crawl job".into())),
        };

        let now = Utc::now();
        let started = self
            .store
            .update(id, |j| {
                j.progress.status = JobStatus::Running;
                j.result = Some(JobResult::default());
            })
            .ok_or(EngineError::NotFound(id))?;
        self.emit(JobEvent::JobStart {
            job_id: id,
            job: (*started).clone(),
            timestamp: now,
        })
        .await;

        for plugin in &self.plugins {
            plugin.before_crawl(&started).await;
        }

        match self.run(id, &config).await {
            Ok(()) => {
                let now = Utc::now();
                let completed = self
                    .store
                    .update(id, |j| {
                        j.progress.status = JobStatus::Completed;
                        j.progress.end_time = Some(now);
                    })
                    .ok_or(EngineError::NotFound(id))?;
                for plugin in &self.plugins {
                    plugin.after_crawl(&completed).await;
                }
                self.emit(JobEvent::JobComplete {
                    job_id: id,
                    job: (*completed).clone(),
                    timestamp: now,
                })
                .await;
                Ok(())
            }
            Err(err) => {
                self.fail_job(id, err.to_string()).await?;
                Err(EngineError::RunFailed(err.to_string()))
            }
        }
    }

    async fn get_job(&self, id: Uuid) -> Option<Arc<Job>> {
        self.store.get(id)
    }

    async fn fail_job(&self, id: Uuid, message: String) -> Result<Arc<Job>, EngineError> {
        let Some(job) = self.store.get(id) else {
            return Err(EngineError::NotFound(id));
        };
        if job.progress.status.is_terminal() {
            return Ok(job);
        }
        let now = Utc::now();
        let error = JobErrorRecord {
            message,
            plugin_name: None,
            timestamp: now,
        };
        let updated = self
            .store
            .update(id, |j| {
                j.progress.status = JobStatus::Failed;
                j.progress.end_time = Some(now);
                j.progress.error = Some(error.clone());
                if let Some(result) = j.result.as_mut() {
                    result.error = Some(error.clone());
                } else {
                    j.result = Some(JobResult {
                        error: Some(error.clone()),
                        ..Default::default()
                    });
                }
            })
            .ok_or(EngineError::NotFound(id))?;
        self.emit(JobEvent::JobError {
            job_id: id,
            job: (*updated).clone(),
            error,
            timestamp: now,
        })
        .await;
        Ok(updated)
    }
}
