use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ConfigError, WebhookConfig};

/// Frozen configuration for one playground job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundConfig {
    pub input: Value,
    /// Reserved, mirrors `Job.maxRetries`; not consumed by the reference
    /// engine (a single plugin failure is isolated, not retried).
    #[serde(default)]
    pub retries: u32,
    /// When present, only plugins whose `name` is listed execute.
    #[serde(default)]
    pub plugins: Option<Vec<String>>,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
    #[serde(default)]
    pub r#async: bool,
}

impl PlaygroundConfig {
    pub fn builder() -> PlaygroundConfigBuilder {
        PlaygroundConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(webhook) = &self.webhook {
            webhook.validate()?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct PlaygroundConfigBuilder {
    input: Option<Value>,
    retries: u32,
    plugins: Option<Vec<String>>,
    webhook: Option<WebhookConfig>,
    r#async: bool,
}

impl PlaygroundConfigBuilder {
    pub fn input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
    pub fn plugins(mut self, plugins: Option<Vec<String>>) -> Self {
        self.plugins = plugins;
        self
    }
    pub fn webhook(mut self, webhook: Option<WebhookConfig>) -> Self {
        self.webhook = webhook;
        self
    }
    pub fn async_mode(mut self, r#async: bool) -> Self {
        self.r#async = r#async;
        self
    }

    pub fn build(self) -> Result<PlaygroundConfig, ConfigError> {
        let cfg = PlaygroundConfig {
            input: self.input.ok_or(ConfigError::MissingField("input"))?,
            retries: self.retries,
            plugins: self.plugins,
            webhook: self.webhook,
            r#async: self.r#async,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
