//! The plugin pipeline: lifecycle hooks over a crawled page or an opaque
//! playground input, with per-plugin error isolation and metric
//! aggregation (spec §4.2).

pub mod builtin;
pub mod pipeline;
pub mod registry;
pub mod storage;
pub mod traits;

pub use registry::PlaygroundPluginRegistry;
pub use storage::{PluginStorage, PluginStorageRegistry};
pub use traits::{CrawlPlugin, PageContext, PlaygroundContext, PlaygroundPlugin, PluginError, PluginResult};
