//! Filtered event receivers for selective consumption of the bus.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::errors::EventBusError;
use super::types::JobEvent;

/// Wraps a `broadcast::Receiver<JobEvent>` and skips events that don't pass
/// `filter`, without losing the receiver's buffered position.
pub struct FilteredReceiver<F>
where
    F: Fn(&JobEvent) -> bool + Send + Sync + 'static,
{
    receiver: broadcast::Receiver<JobEvent>,
    filter: Arc<F>,
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&JobEvent) -> bool + Send + Sync + 'static,
{
    pub fn new(receiver: broadcast::Receiver<JobEvent>, filter: F) -> Self {
        Self {
            receiver,
            filter: Arc::new(filter),
        }
    }

    pub async fn recv(&mut self) -> Result<JobEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if (self.filter)(&event) {
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return Err(EventBusError::Shutdown),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    return Err(EventBusError::ReceiverLagged(skipped));
                }
            }
        }
    }

    pub fn try_recv(&mut self) -> Result<Option<JobEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if (self.filter)(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(EventBusError::Shutdown),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    return Err(EventBusError::ReceiverLagged(skipped));
                }
            }
        }
    }

    #[must_use]
    pub fn would_receive(&self, event: &JobEvent) -> bool {
        (self.filter)(event)
    }
}
