//! `PageDriver`: the external page-fetching contract (spec §2 C1). The core
//! treats it as injected so the orchestration logic never depends on a
//! concrete browser or HTTP client; `HttpPageDriver` is the reference
//! implementation used by this server (plain HTTP fetch + HTML parse, no
//! JS execution).

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

use super::page_timeout::with_page_timeout;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out")]
    Timeout,
}

/// One fetched page: its HTML, status, load time, and the hrefs discovered
/// via `a[href]` (link extraction is the driver's job per spec §4.1).
pub struct FetchedPage {
    pub html: String,
    pub status_code: u16,
    pub load_time_ms: u64,
    pub links: Vec<String>,
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn fetch(&self, url: &Url, timeout_ms: u64) -> Result<FetchedPage, DriverError>;
}

pub struct HttpPageDriver {
    client: Client,
    user_agent: String,
}

impl HttpPageDriver {
    #[must_use]
    pub fn new(user_agent: String) -> Self {
        Self {
            client: Client::new(),
            user_agent,
        }
    }
}

#[async_trait]
impl PageDriver for HttpPageDriver {
    async fn fetch(&self, url: &Url, timeout_ms: u64) -> Result<FetchedPage, DriverError> {
        let started = Instant::now();
        let client = self.client.clone();
        let user_agent = self.user_agent.clone();
        let target = url.clone();

        let fetched = with_page_timeout(
            async move {
                let response = client
                    .get(target)
                    .header("User-Agent", &user_agent)
                    .send()
                    .await
                    .map_err(|err| anyhow::anyhow!("transport error: {err}"))?;
                let status_code = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .map_err(|err| anyhow::anyhow!("transport error: {err}"))?;
                Ok((status_code, body))
            },
            timeout_ms,
            "page fetch",
        )
        .await;

        let (status_code, body) = match fetched {
            Ok(pair) => pair,
            Err(err) if err.to_string().contains("timed out") => return Err(DriverError::Timeout),
            Err(err) => return Err(DriverError::Transport(err.to_string())),
        };

        let load_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let links = extract_links(&body);
        Ok(FetchedPage {
            html: body,
            status_code,
            load_time_ms,
            links,
        })
    }
}

fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_hrefs() {
        let html = r#"<html><body><a href="/a">A</a><a href="/b">B</a></body></html>"#;
        let links = extract_links(html);
        assert_eq!(links, vec!["/a".to_string(), "/b".to_string()]);
    }

    #[tokio::test]
    async fn fetches_mocked_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"<html><body><a href="/x">X</a></body></html>"#)
            .create_async()
            .await;

        let driver = HttpPageDriver::new("crawlhub-test".to_string());
        let url = Url::parse(&server.url()).unwrap();
        let page = driver.fetch(&url, 5000).await.unwrap();
        mock.assert_async().await;

        assert_eq!(page.status_code, 200);
        assert_eq!(page.links, vec!["/x".to_string()]);
    }
}
