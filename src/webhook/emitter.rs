//! Subscribes to the internal event bus and fans out filtered, retried
//! webhook deliveries (spec §4.5). Runs as its own background task so a
//! slow or unreachable webhook receiver never blocks the job engine.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use super::payload::build_payload;
use super::retry::{ExponentialBackoff, RetryStrategy};
use crate::config::WebhookConfig;
use crate::events::{EventBus, JobEvent};
use crate::job::{Job, JobConfig};

pub struct WebhookEmitter {
    bus: Arc<EventBus>,
    client: Client,
    retry: Arc<dyn RetryStrategy>,
}

impl WebhookEmitter {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            client: Client::new(),
            retry: Arc::new(ExponentialBackoff),
        }
    }

    pub fn with_retry_strategy(mut self, retry: Arc<dyn RetryStrategy>) -> Self {
        self.retry = retry;
        self
    }

    /// Spawns the subscriber loop. One delivery is spawned per matching
    /// event so deliveries never serialize behind one another.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut receiver = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => self.clone().handle_event(event),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "webhook emitter lagged behind the event bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn handle_event(self: Arc<Self>, event: JobEvent) {
        let Some(job) = extract_job(&event) else {
            return;
        };
        let Some(webhook) = webhook_config(&job.config).cloned() else {
            return;
        };
        let Some(event_name) = event.webhook_name() else {
            return;
        };
        if !webhook.allows(event_name) {
            return;
        }
        let Some(payload) = build_payload(&event, job) else {
            return;
        };

        let client = self.client.clone();
        let retry = self.retry.clone();
        tokio::spawn(async move {
            deliver_with_retries(&client, retry.as_ref(), &webhook, &payload).await;
        });
    }
}

fn extract_job(event: &JobEvent) -> Option<&Job> {
    match event {
        JobEvent::JobStart { job, .. }
        | JobEvent::JobComplete { job, .. }
        | JobEvent::JobError { job, .. }
        | JobEvent::PageStart { job, .. }
        | JobEvent::PageComplete { job, .. }
        | JobEvent::PageError { job, .. }
        | JobEvent::PluginStart { job, .. }
        | JobEvent::PluginComplete { job, .. }
        | JobEvent::PluginError { job, .. }
        | JobEvent::Progress { job, .. } => Some(job),
        JobEvent::Shutdown { .. } => None,
    }
}

fn webhook_config(config: &JobConfig) -> Option<&WebhookConfig> {
    match config {
        JobConfig::Crawl(cfg) => Some(&cfg.webhook),
        JobConfig::Playground(cfg) => cfg.webhook.as_ref(),
    }
}

/// POSTs `payload` to `webhook.url`, retrying up to `webhook.retries` times
/// with the configured backoff. Exhaustion is logged and dropped — webhook
/// delivery never mutates job state.
async fn deliver_with_retries(
    client: &Client,
    retry: &dyn RetryStrategy,
    webhook: &WebhookConfig,
    payload: &serde_json::Value,
) {
    let mut attempts = 0u32;
    loop {
        let mut request = client
            .post(&webhook.url)
            .header("Content-Type", "application/json")
            .json(payload);
        for (key, value) in &webhook.headers {
            request = request.header(key, value);
        }

        let outcome = request.send().await;
        attempts += 1;

        match outcome {
            Ok(response) if response.status().is_success() => return,
            Ok(response) => {
                tracing::debug!(status = %response.status(), attempts, "webhook delivery non-2xx");
            }
            Err(err) => {
                tracing::debug!(error = %err, attempts, "webhook delivery transport error");
            }
        }

        if attempts >= webhook.retries {
            tracing::warn!(url = %webhook.url, attempts, "webhook delivery exhausted retries, dropping");
            return;
        }

        let delay = retry.delay_before_retry(attempts - 1);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    struct NoDelay;
    impl RetryStrategy for NoDelay {
        fn delay_before_retry(&self, _attempt_index: u32) -> StdDuration {
            StdDuration::from_millis(0)
        }
    }

    #[tokio::test]
    async fn stops_after_first_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cb")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let webhook = WebhookConfig {
            url: format!("{}/cb", server.url()),
            headers: Default::default(),
            retries: 3,
            on: None,
        };
        let client = Client::new();
        deliver_with_retries(&client, &NoDelay, &webhook, &serde_json::json!({"ok": true})).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn gives_up_after_exhausting_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cb")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let webhook = WebhookConfig {
            url: format!("{}/cb", server.url()),
            headers: Default::default(),
            retries: 3,
            on: None,
        };
        let client = Client::new();
        deliver_with_retries(&client, &NoDelay, &webhook, &serde_json::json!({"ok": true})).await;
        mock.assert_async().await;
    }
}
