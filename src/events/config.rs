//! Configuration for [`super::bus::EventBus`] behavior.

/// Strategy for handling channel saturation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackpressureMode {
    /// Drop oldest events when the channel is full (default). Publishers
    /// never block; receivers may see a lagged receive.
    #[default]
    DropOldest,
    /// Block the publisher until space is available. Applies backpressure;
    /// can deadlock if all subscribers are slow, so a circuit breaker falls
    /// back to `DropOldest` after repeated timeouts.
    Block,
    /// Return `ChannelFull` when the channel is at capacity.
    Error,
}

#[derive(Debug, Clone)]
pub struct EventBusConfig {
    pub capacity: usize,
    pub backpressure_mode: BackpressureMode,
    /// Pressure threshold (0.0-1.0) for `is_overloaded()`.
    pub overload_threshold: f64,
    pub enable_batching: bool,
    pub max_batch_size: usize,
    pub batch_timeout_ms: u64,
    pub enable_metrics: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            backpressure_mode: BackpressureMode::default(),
            overload_threshold: 0.8,
            enable_batching: false,
            max_batch_size: 100,
            batch_timeout_ms: 100,
            enable_metrics: true,
        }
    }
}
