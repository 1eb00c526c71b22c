//! URL normalization and the visited-set frontier (spec §4.1).
//!
//! Normalization: lowercase host, strip default ports (80/443), drop
//! fragments, preserve query strings, preserve trailing slash as given.

use std::collections::HashSet;

use url::Url;

/// Normalizes `raw` relative to `base`, returning `None` if it cannot be
/// parsed or resolved (these are dropped silently, not counted as skipped —
/// a skip implies `urlFilter` rejected a well-formed URL).
#[must_use]
pub fn normalize(raw: &str, base: &Url) -> Option<Url> {
    let mut url = base.join(raw).ok()?;
    url.set_fragment(None);
    if let Some(host) = url.host_str() {
        let lower = host.to_lowercase();
        if lower != host {
            let _ = url.set_host(Some(&lower));
        }
    }
    let default_port = match url.scheme() {
        "https" => Some(443),
        "http" => Some(80),
        _ => None,
    };
    if url.port() == default_port {
        let _ = url.set_port(None);
    }
    Some(url)
}

/// Tracks visited URLs and the same-host boundary for a single crawl job.
pub struct Frontier {
    host: String,
    port: Option<u16>,
    visited: HashSet<Url>,
    to_visit: Vec<(Url, u32)>,
}

impl Frontier {
    #[must_use]
    pub fn new(start: &Url) -> Self {
        Self {
            host: start.host_str().unwrap_or_default().to_lowercase(),
            port: start.port(),
            visited: HashSet::new(),
            to_visit: vec![(start.clone(), 0)],
        }
    }

    fn same_site(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|h| h.eq_ignore_ascii_case(&self.host)) && url.port() == self.port
    }

    /// Pops the next (url, depth) pair not yet visited, marking it visited.
    pub fn next(&mut self) -> Option<(Url, u32)> {
        while let Some((url, depth)) = self.to_visit.pop() {
            if self.visited.insert(url.clone()) {
                return Some((url, depth));
            }
        }
        None
    }

    /// Queues a discovered link at `depth` if it is same-site and unvisited.
    /// Returns `false` if the link was off-site (not counted at all).
    pub fn discover(&mut self, base: &Url, raw: &str, depth: u32) -> bool {
        let Some(url) = normalize(raw, base) else {
            return false;
        };
        if !self.same_site(&url) {
            return false;
        }
        if !self.visited.contains(&url) {
            self.to_visit.push((url, depth));
        }
        true
    }

    pub fn seed(&mut self, url: Url) {
        if self.same_site(&url) && !self.visited.contains(&url) {
            self.to_visit.push((url, 0));
        }
    }

    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.to_visit.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_default_port_and_fragment_lowercases_host() {
        let base = Url::parse("https://Example.com/").unwrap();
        let normalized = normalize("https://EXAMPLE.com:443/Path#section", &base).unwrap();
        assert_eq!(normalized.as_str(), "https://example.com/Path");
    }

    #[test]
    fn preserves_query_and_trailing_slash() {
        let base = Url::parse("https://example.com/").unwrap();
        let normalized = normalize("/a/?x=1", &base).unwrap();
        assert_eq!(normalized.as_str(), "https://example.com/a/?x=1");
    }

    #[test]
    fn frontier_dedupes_and_respects_site_boundary() {
        let start = Url::parse("https://example.com/").unwrap();
        let mut frontier = Frontier::new(&start);
        let (first, depth) = frontier.next().unwrap();
        assert_eq!(first, start);
        assert_eq!(depth, 0);

        assert!(frontier.discover(&start, "/a", 1));
        assert!(!frontier.discover(&start, "https://external.com/x", 1));
        assert!(frontier.discover(&start, "/a", 1));

        let (next, depth) = frontier.next().unwrap();
        assert_eq!(next.path(), "/a");
        assert_eq!(depth, 1);
        assert!(frontier.next().is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Normalizing an already-normalized URL is a no-op, regardless of
        /// which ASCII-alphanumeric path segment it points at.
        #[test]
        fn normalize_is_idempotent(segment in "[a-z0-9]{1,12}") {
            let base = Url::parse("https://example.com/").unwrap();
            let raw = format!("/{segment}");
            let once = normalize(&raw, &base).unwrap();
            let twice = normalize(once.as_str(), &base).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Re-discovering the same link any number of times never grows the
        /// frontier's pending count beyond one entry for that URL.
        #[test]
        fn rediscovery_does_not_duplicate_pending_entries(segment in "[a-z0-9]{1,12}", times in 1usize..5) {
            let start = Url::parse("https://example.com/").unwrap();
            let mut frontier = Frontier::new(&start);
            frontier.next();
            let raw = format!("/{segment}");
            for _ in 0..times {
                frontier.discover(&start, &raw, 1);
            }
            let mut seen = 0;
            while frontier.next().is_some() {
                seen += 1;
            }
            prop_assert_eq!(seen, 1);
        }
    }
}
