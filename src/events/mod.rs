//! Internal event bus: publish/subscribe between a job engine and its
//! subscribers, with metrics, backpressure, and graceful shutdown.

pub mod bus;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod streaming;
pub mod types;

pub use bus::EventBus;
pub use config::{BackpressureMode, EventBusConfig};
pub use errors::EventBusError;
pub use metrics::EventBusMetrics;
pub use streaming::FilteredReceiver;
pub use types::{BatchPublishResult, JobEvent, ShutdownReason};
