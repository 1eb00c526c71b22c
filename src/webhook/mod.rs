//! Outbound webhook delivery: per-event filtering, retry with exponential
//! backoff, and custom-header support (spec §4.5).

pub mod emitter;
pub mod payload;
pub mod retry;

pub use emitter::WebhookEmitter;
pub use retry::{ExponentialBackoff, RetryStrategy};
