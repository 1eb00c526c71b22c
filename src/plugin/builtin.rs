//! Reference plugin implementations exercising the hook contracts above.

use async_trait::async_trait;
use chrono::Utc;
use scraper::{Html, Selector};
use serde_json::json;

use super::traits::{CrawlPlugin, PageContext, PlaygroundContext, PlaygroundPlugin, PluginResult};
use crate::utils::string_utils::safe_truncate_chars;

/// Counts words in the page's visible text.
pub struct WordCountPlugin;

#[async_trait]
impl CrawlPlugin for WordCountPlugin {
    fn name(&self) -> &str {
        "word_count"
    }

    async fn evaluate(&self, page: &PageContext, load_time_ms: u64) -> PluginResult<serde_json::Value> {
        let document = Html::parse_document(&page.html);
        let body_selector = Selector::parse("body").map_err(|e| format!("selector: {e:?}"))?;
        let text: String = document
            .select(&body_selector)
            .flat_map(|el| el.text())
            .collect::<Vec<_>>()
            .join(" ");
        let word_count = text.split_whitespace().count();
        Ok(json!({
            "url": page.url,
            "wordCount": word_count,
            "loadTimeMs": load_time_ms,
        }))
    }

    fn summarize(&self, metrics: &[serde_json::Value]) -> Option<serde_json::Value> {
        let total: u64 = metrics
            .iter()
            .filter_map(|m| m.get("wordCount").and_then(|v| v.as_u64()))
            .sum();
        Some(json!({ "totalWords": total, "pagesCounted": metrics.len() }))
    }
}

/// Extracts the page `<title>`, truncated to a safe display length.
pub struct TitlePlugin;

#[async_trait]
impl CrawlPlugin for TitlePlugin {
    fn name(&self) -> &str {
        "title"
    }

    async fn evaluate(&self, page: &PageContext, _load_time_ms: u64) -> PluginResult<serde_json::Value> {
        let document = Html::parse_document(&page.html);
        let title_selector = Selector::parse("title").map_err(|e| format!("selector: {e:?}"))?;
        let title = document
            .select(&title_selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .map(|t| safe_truncate_chars(t.trim(), 200).to_string());
        Ok(json!({ "url": page.url, "title": title }))
    }
}

/// Reverses a string input. The reference plugin for the playground's
/// happy-path scenario: `input="hello"` yields `inputLength`/`outputLength`
/// of 5 and a `totalProcessed` summary of 1.
pub struct ReversePlugin;

#[async_trait]
impl PlaygroundPlugin for ReversePlugin {
    fn name(&self) -> &str {
        "reverse"
    }

    async fn execute(&self, ctx: &PlaygroundContext) -> PluginResult<serde_json::Value> {
        let started = std::time::Instant::now();
        let input = ctx
            .input
            .as_str()
            .ok_or_else(|| "reverse plugin requires a string input".to_string())?;
        let output: String = input.chars().rev().collect();
        *ctx.output.lock() = Some(serde_json::Value::String(output.clone()));
        Ok(json!({
            "processedAt": Utc::now(),
            "inputLength": input.chars().count(),
            "outputLength": output.chars().count(),
            "processingTimeMs": started.elapsed().as_millis() as u64,
        }))
    }

    fn summarize(&self, metrics: &[serde_json::Value]) -> Option<serde_json::Value> {
        Some(json!({ "totalProcessed": metrics.len() }))
    }
}

/// Uppercases a string input; a second reference playground plugin so
/// multi-plugin ordering is exercised.
pub struct UppercasePlugin;

#[async_trait]
impl PlaygroundPlugin for UppercasePlugin {
    fn name(&self) -> &str {
        "uppercase"
    }

    async fn execute(&self, ctx: &PlaygroundContext) -> PluginResult<serde_json::Value> {
        let input = ctx
            .input
            .as_str()
            .ok_or_else(|| "uppercase plugin requires a string input".to_string())?;
        let output = input.to_uppercase();
        *ctx.output.lock() = Some(serde_json::Value::String(output.clone()));
        Ok(json!({ "output": output }))
    }
}
