//! The internal publish/subscribe bus between a job engine and its
//! subscribers (chiefly the [`crate::webhook::WebhookEmitter`]).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify, broadcast};

use super::config::EventBusConfig;
use super::errors::EventBusError;
use super::metrics::{EventBusMetrics, MetricsSnapshot};
use super::streaming::FilteredReceiver;
use super::types::{BatchPublishResult, JobEvent, ShutdownReason};

/// Typed in-process event bus. Delivery is synchronous fan-out to
/// subscribers on the publisher's task; a slow subscriber only affects its
/// own receive loop since `tokio::sync::broadcast` hands each subscriber an
/// independent cursor into the ring buffer.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<JobEvent>,
    config: Arc<EventBusConfig>,
    metrics: EventBusMetrics,
    shutdown: Arc<Notify>,
    shutdown_flag: Arc<AtomicBool>,
    capacity_notify: Arc<Notify>,
    send_lock: Arc<Mutex<()>>,
    consecutive_timeouts: Arc<AtomicUsize>,
    num_instances: Arc<AtomicUsize>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let config = EventBusConfig {
            capacity,
            ..Default::default()
        };
        Self::with_config(config)
    }

    #[must_use]
    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.capacity);
        Self {
            sender,
            config: Arc::new(config),
            metrics: EventBusMetrics::new(),
            shutdown: Arc::new(Notify::new()),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            capacity_notify: Arc::new(Notify::new()),
            send_lock: Arc::new(Mutex::new(())),
            consecutive_timeouts: Arc::new(AtomicUsize::new(0)),
            num_instances: Arc::new(AtomicUsize::new(1)),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &EventBusMetrics {
        &self.metrics
    }

    /// Publish to all subscribers, honoring no backpressure (drop-oldest
    /// semantics of the underlying broadcast channel).
    pub async fn publish(&self, event: JobEvent) -> Result<usize, EventBusError> {
        if let Ok(subscriber_count) = self.sender.send(event) {
            if self.config.enable_metrics {
                self.metrics.increment_published();
                self.metrics.update_subscriber_count(subscriber_count);
                if subscriber_count == 0 {
                    self.metrics.increment_dropped();
                    tracing::debug!("published event but no active subscribers");
                }
            }
            Ok(subscriber_count)
        } else {
            if self.config.enable_metrics {
                self.metrics.increment_failed();
            }
            Err(EventBusError::NoSubscribers)
        }
    }

    /// Publish honoring the configured [`BackpressureMode`](super::config::BackpressureMode).
    pub async fn publish_with_backpressure(&self, event: JobEvent) -> Result<usize, EventBusError> {
        use super::config::BackpressureMode;

        match self.config.backpressure_mode {
            BackpressureMode::DropOldest => self.publish(event).await,

            BackpressureMode::Block => {
                let timeout_count = self.consecutive_timeouts.load(Ordering::Acquire);
                if timeout_count > 10 {
                    tracing::warn!(
                        "circuit breaker opened after {timeout_count} consecutive timeouts, falling back to drop-oldest"
                    );
                    return self.publish(event).await;
                }

                let publish_future = async {
                    loop {
                        if self.sender.len() < self.config.capacity {
                            break;
                        }
                        if self.is_shutdown() {
                            return Err(EventBusError::Shutdown);
                        }
                        let _ = tokio::time::timeout(
                            Duration::from_millis(5),
                            self.capacity_notify.notified(),
                        )
                        .await;
                    }

                    if let Ok(subscriber_count) = self.sender.send(event) {
                        if self.config.enable_metrics {
                            self.metrics.increment_published();
                            self.metrics.update_subscriber_count(subscriber_count);
                            if subscriber_count == 0 {
                                self.metrics.increment_dropped();
                            }
                        }
                        self.capacity_notify.notify_one();
                        Ok(subscriber_count)
                    } else {
                        if self.config.enable_metrics {
                            self.metrics.increment_failed();
                        }
                        Err(EventBusError::NoSubscribers)
                    }
                };

                match tokio::time::timeout(Duration::from_secs(30), publish_future).await {
                    Ok(Ok(count)) => {
                        self.consecutive_timeouts.store(0, Ordering::Release);
                        Ok(count)
                    }
                    Ok(Err(e)) => Err(e),
                    Err(_elapsed) => {
                        let new_count = self.consecutive_timeouts.fetch_add(1, Ordering::AcqRel) + 1;
                        tracing::warn!("publish timeout #{new_count} after 30s waiting for channel capacity");
                        Err(EventBusError::PublishTimeout)
                    }
                }
            }

            BackpressureMode::Error => {
                let _guard = self.send_lock.lock().await;
                if self.sender.len() >= self.config.capacity {
                    return Err(EventBusError::ChannelFull);
                }
                if let Ok(subscriber_count) = self.sender.send(event) {
                    if self.config.enable_metrics {
                        self.metrics.increment_published();
                        self.metrics.update_subscriber_count(subscriber_count);
                        if subscriber_count == 0 {
                            self.metrics.increment_dropped();
                        }
                    }
                    Ok(subscriber_count)
                } else {
                    if self.config.enable_metrics {
                        self.metrics.increment_failed();
                    }
                    Err(EventBusError::NoSubscribers)
                }
            }
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let count = self.sender.receiver_count();
        if self.config.enable_metrics {
            self.metrics.update_subscriber_count(count);
        }
        count
    }

    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    #[must_use]
    pub fn pressure(&self) -> f64 {
        self.sender.len() as f64 / self.config.capacity as f64
    }

    #[must_use]
    pub fn is_overloaded(&self) -> bool {
        self.pressure() >= self.config.overload_threshold
    }

    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.sender.len()
    }

    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        self.config.capacity.saturating_sub(self.sender.len())
    }

    pub fn subscribe_filtered<F>(&self, filter: F) -> FilteredReceiver<F>
    where
        F: Fn(&JobEvent) -> bool + Send + Sync + 'static,
    {
        FilteredReceiver::new(self.subscribe(), filter)
    }

    /// Publish every event in `events`, continuing past individual failures
    /// (best-effort; no active subscribers is reported, not fatal).
    pub async fn publish_batch(&self, events: Vec<JobEvent>) -> BatchPublishResult {
        let total = events.len();
        let mut published = 0;
        let mut failed = 0;
        let mut max_subscribers = 0;

        for event in events {
            if let Ok(count) = self.sender.send(event) {
                published += 1;
                max_subscribers = max_subscribers.max(count);
                if self.config.enable_metrics {
                    self.metrics.increment_published();
                    self.metrics.update_subscriber_count(count);
                    if count == 0 {
                        self.metrics.increment_dropped();
                    }
                }
            } else {
                failed += 1;
                if self.config.enable_metrics {
                    self.metrics.increment_failed();
                }
            }
        }

        BatchPublishResult {
            total,
            published,
            failed,
            max_subscribers,
        }
    }

    #[must_use]
    pub fn get_metrics_report(&self) -> String {
        if !self.config.enable_metrics {
            return "metrics disabled".to_string();
        }
        let snapshot = self.metrics.snapshot();
        format!(
            "event bus metrics: published={} dropped={} failed={} active_subscribers={} peak_subscribers={} success_rate={:.2}%",
            snapshot.events_published,
            snapshot.events_dropped,
            snapshot.events_failed,
            snapshot.active_subscribers,
            snapshot.peak_subscribers,
            self.success_rate(&snapshot),
        )
    }

    /// Idempotent; all clones share the same shutdown signal.
    pub fn shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    pub async fn wait_for_shutdown(&self) {
        self.shutdown.notified().await;
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Sets the shutdown flag, publishes a `Shutdown` event, gives
    /// subscribers a heuristic 500ms to drain, then wakes waiters.
    pub async fn shutdown_gracefully(&self, reason: ShutdownReason) {
        tracing::info!(?reason, "beginning graceful event bus shutdown");
        self.shutdown_flag.store(true, Ordering::SeqCst);

        let event = JobEvent::Shutdown {
            reason,
            timestamp: chrono::Utc::now(),
        };
        let _ = self.publish(event).await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        self.shutdown.notify_waiters();
    }

    fn success_rate(&self, snapshot: &MetricsSnapshot) -> f64 {
        let total = snapshot.events_published;
        if total == 0 {
            return 100.0;
        }
        ((total - snapshot.events_failed) as f64 / total as f64) * 100.0
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_config(EventBusConfig::default())
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        self.num_instances.fetch_add(1, Ordering::Relaxed);
        Self {
            sender: self.sender.clone(),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            shutdown: self.shutdown.clone(),
            shutdown_flag: self.shutdown_flag.clone(),
            capacity_notify: self.capacity_notify.clone(),
            send_lock: self.send_lock.clone(),
            consecutive_timeouts: self.consecutive_timeouts.clone(),
            num_instances: self.num_instances.clone(),
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        if 1 == self.num_instances.fetch_sub(1, Ordering::AcqRel) {
            self.shutdown_flag.store(true, Ordering::SeqCst);
            self.shutdown.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_progress_event() -> JobEvent {
        JobEvent::Shutdown {
            reason: ShutdownReason::JobCompleted,
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_reports_dropped() {
        let bus = EventBus::new(8);
        let result = bus.publish(sample_progress_event()).await.unwrap();
        assert_eq!(result, 0);
        assert_eq!(bus.metrics().snapshot().events_dropped, 1);
    }

    #[tokio::test]
    async fn filtered_receiver_skips_non_matching_events() {
        let bus = EventBus::new(8);
        let mut filtered = bus.subscribe_filtered(|e| matches!(e, JobEvent::Shutdown { .. }));
        bus.publish(JobEvent::Progress {
            job_id: Uuid::new_v4(),
            job: dummy_job(),
            timestamp: chrono::Utc::now(),
        })
        .await
        .unwrap();
        bus.publish(sample_progress_event()).await.unwrap();
        let received = filtered.recv().await.unwrap();
        assert!(matches!(received, JobEvent::Shutdown { .. }));
    }

    fn dummy_job() -> crate::job::Job {
        use crate::config::{CrawlConfig, WebhookConfig};
        use crate::job::JobConfig;
        use std::collections::HashMap;
        let cfg = CrawlConfig::builder()
            .start_url("example.com")
            .unwrap()
            .webhook(WebhookConfig {
                url: "https://hooks.example.com".into(),
                headers: HashMap::new(),
                retries: 3,
                on: None,
            })
            .build()
            .unwrap();
        crate::job::Job::new(Uuid::new_v4(), JobConfig::Crawl(cfg), chrono::Utc::now())
    }
}
