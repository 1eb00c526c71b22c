//! `robots.txt` fetch and Allow/Disallow matching (spec §4.1
//! `respectRobotsTxt`). Fetched once per host with a 5s timeout; a missing
//! or malformed file is treated as full allow, never as full deny.

use std::time::Duration;

use reqwest::Client;
use url::Url;

const ROBOTS_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RobotsRules {
    disallow: Vec<String>,
    allow: Vec<String>,
}

impl RobotsRules {
    /// Permissive default used whenever the file is missing or unparsable.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            disallow: Vec::new(),
            allow: Vec::new(),
        }
    }

    /// Longest matching rule wins; an `Allow` beats a `Disallow` of equal
    /// length, matching the conventional robots.txt precedence rule.
    #[must_use]
    pub fn is_allowed(&self, path: &str) -> bool {
        let best_disallow = self
            .disallow
            .iter()
            .filter(|p| path.starts_with(p.as_str()))
            .map(String::len)
            .max();
        let best_allow = self
            .allow
            .iter()
            .filter(|p| path.starts_with(p.as_str()))
            .map(String::len)
            .max();
        match (best_disallow, best_allow) {
            (Some(d), Some(a)) => a >= d,
            (Some(_), None) => false,
            _ => true,
        }
    }
}

/// Parses a `robots.txt` body, collecting rules from whichever group
/// matches `user_agent` exactly and, separately, the `*` group — falling
/// back to the latter when the former is empty.
#[must_use]
pub fn parse(body: &str, user_agent: &str) -> RobotsRules {
    let mut groups: Vec<(String, Vec<String>, Vec<String>)> = Vec::new();

    for line in body.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();
        if value.is_empty() && key != "user-agent" {
            continue;
        }

        match key.as_str() {
            "user-agent" => {
                match groups.last() {
                    Some((_, d, a)) if d.is_empty() && a.is_empty() => {
                        groups.last_mut().unwrap().0 = value.to_lowercase();
                    }
                    _ => groups.push((value.to_lowercase(), Vec::new(), Vec::new())),
                }
            }
            "disallow" => {
                if let Some((_, d, _)) = groups.last_mut() {
                    d.push(value.to_string());
                }
            }
            "allow" => {
                if let Some((_, _, a)) = groups.last_mut() {
                    a.push(value.to_string());
                }
            }
            _ => {}
        }
    }

    let exact = groups.iter().find(|(agent, ..)| agent == &user_agent.to_lowercase());
    let wildcard = groups.iter().find(|(agent, ..)| agent == "*");
    let chosen = exact.or(wildcard);

    match chosen {
        Some((_, disallow, allow)) => RobotsRules {
            disallow: disallow.clone(),
            allow: allow.clone(),
        },
        None => RobotsRules::allow_all(),
    }
}

/// Fetches and parses `{scheme}://{host}/robots.txt`; any transport error,
/// non-2xx status, or timeout yields `allow_all`.
pub async fn fetch(client: &Client, origin: &Url, user_agent: &str) -> RobotsRules {
    let Ok(robots_url) = origin.join("/robots.txt") else {
        return RobotsRules::allow_all();
    };
    let fetch = client.get(robots_url).send();
    match tokio::time::timeout(ROBOTS_TIMEOUT, fetch).await {
        Ok(Ok(response)) if response.status().is_success() => match response.text().await {
            Ok(body) => parse(&body, user_agent),
            Err(_) => RobotsRules::allow_all(),
        },
        _ => RobotsRules::allow_all(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disallow_blocks_matching_prefix() {
        let rules = parse("User-agent: *\nDisallow: /admin\n", "crawlhub");
        assert!(!rules.is_allowed("/admin/users"));
        assert!(rules.is_allowed("/public"));
    }

    #[test]
    fn allow_overrides_equal_length_disallow() {
        let rules = parse("User-agent: *\nDisallow: /a\nAllow: /a\n", "crawlhub");
        assert!(rules.is_allowed("/a/b"));
    }

    #[test]
    fn missing_file_allows_everything() {
        let rules = RobotsRules::allow_all();
        assert!(rules.is_allowed("/anything"));
    }
}
