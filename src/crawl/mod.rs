//! The crawl engine: frontier discovery over a `PageDriver`, per-page
//! plugin pipeline, rate limiting, and robots/sitemap handling (spec §4.1).

pub mod driver;
pub mod engine;
pub mod frontier;
pub mod page_timeout;
pub mod rate_limiter;
pub mod robots;
pub mod sitemap;

pub use driver::{DriverError, FetchedPage, HttpPageDriver, PageDriver};
pub use engine::CrawlEngine;
pub use rate_limiter::{CrawlRateLimiter, RateLimitDecision};
