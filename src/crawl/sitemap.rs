//! Sitemap `<loc>` extraction for frontier seeding (spec §4.1 `sitemapUrl`).

use reqwest::Client;
use url::Url;

/// Fetches `sitemap_url` and extracts every `<loc>` entry, best-effort: a
/// transport error or unparsable body yields an empty list rather than
/// failing the job.
pub async fn fetch_locations(client: &Client, sitemap_url: &Url) -> Vec<Url> {
    let Ok(response) = client.get(sitemap_url.clone()).send().await else {
        return Vec::new();
    };
    let Ok(body) = response.text().await else {
        return Vec::new();
    };
    extract_locations(&body)
}

/// Parses `<loc>...</loc>` entries out of a sitemap XML body without
/// pulling in a full XML parser — sitemaps are a flat, regular format and a
/// tag-scoped scan is sufficient.
#[must_use]
pub fn extract_locations(body: &str) -> Vec<Url> {
    let mut urls = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find("<loc>") {
        let after_open = &rest[start + "<loc>".len()..];
        let Some(end) = after_open.find("</loc>") else {
            break;
        };
        let raw = after_open[..end].trim();
        if let Ok(url) = Url::parse(raw) {
            urls.push(url);
        }
        rest = &after_open[end + "</loc>".len()..];
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_multiple_locations() {
        let body = r#"<?xml version="1.0"?>
<urlset>
  <url><loc>https://example.com/a</loc></url>
  <url><loc>https://example.com/b</loc></url>
</urlset>"#;
        let urls = extract_locations(body);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "https://example.com/a");
        assert_eq!(urls[1].as_str(), "https://example.com/b");
    }

    #[test]
    fn ignores_malformed_entries() {
        let body = "<loc>not a url</loc><loc>https://example.com/ok</loc>";
        let urls = extract_locations(body);
        assert_eq!(urls.len(), 1);
    }
}
