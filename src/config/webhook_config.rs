use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::ConfigError;

const DEFAULT_RETRIES: u32 = 3;
const MIN_RETRIES: u32 = 1;
const MAX_RETRIES: u32 = 5;

/// Outbound webhook target, shared by crawl and playground jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// If present, only these outbound event names are delivered. Unknown
    /// names are ignored rather than rejected.
    #[serde(default)]
    pub on: Option<HashSet<String>>,
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

impl WebhookConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Invalid("webhook.url must not be empty".into()));
        }
        if !(MIN_RETRIES..=MAX_RETRIES).contains(&self.retries) {
            return Err(ConfigError::OutOfRange {
                field: "webhook.retries",
                min: MIN_RETRIES as i64,
                max: MAX_RETRIES as i64,
                actual: self.retries as i64,
            });
        }
        Ok(())
    }

    /// Whether `event_name` should be delivered under this filter.
    pub fn allows(&self, event_name: &str) -> bool {
        match &self.on {
            None => true,
            Some(allowed) => allowed.contains(event_name),
        }
    }
}
