//! Message bus abstraction used by bridge workers.

use std::future::Future;

use dslsight_common::BusMessage;

use crate::error::Result;

/// A message bus a bridge publishes to.
///
/// [`MqttBus`](crate::MqttBus) is the production implementation; tests
/// substitute in-memory recorders.
pub trait MessageBus: Send {
    /// Publish a single message.
    fn publish(&mut self, message: &BusMessage) -> impl Future<Output = Result<()>> + Send;

    /// Register the messages the broker must deliver if this client vanishes
    /// without a clean disconnect.
    ///
    /// Replaces any previously registered set. Registering an identical set
    /// is a no-op.
    fn set_last_will(&mut self, wills: &[BusMessage]) -> impl Future<Output = Result<()>> + Send;

    /// Publish a batch of messages in order.
    ///
    /// Failures are logged and counted; publishing continues with the next message.
    fn publish_batch(&mut self, messages: &[BusMessage]) -> impl Future<Output = PublishStats> + Send
    where
        Self: Sized,
    {
        async move {
            let mut stats = PublishStats::default();

            for message in messages {
                match self.publish(message).await {
                    Ok(()) => {
                        stats.success += 1;
                        tracing::debug!(topic = %message.topic, payload = %message.payload, "Published");
                    }
                    Err(e) => {
                        stats.failed += 1;
                        tracing::warn!(error = %e, "Failed to publish message");
                    }
                }
            }

            stats
        }
    }
}

/// Statistics from a batch publish operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishStats {
    /// Number of successfully published messages.
    pub success: usize,
    /// Number of failed publishes.
    pub failed: usize,
}

impl std::ops::AddAssign for PublishStats {
    fn add_assign(&mut self, other: Self) {
        self.success += other.success;
        self.failed += other.failed;
    }
}
