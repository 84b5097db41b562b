//! Notification sinks invoked when a trigger rings.
//!
//! The scheduler awaits each [`Notifier`] call in turn, so sinks should finish
//! quickly. A failing sink is logged by the scheduler and never stops the loop.

use crate::scheduler::Firing;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Errors a sink can report for one delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The receiving side of a channel sink is gone.
    #[error("notification channel closed: {0}")]
    Closed(String),

    /// The sink could not deliver.
    #[error("{sink} failed: {message}")]
    Failed {
        /// Name of the failing sink.
        sink: String,
        /// What went wrong.
        message: String,
    },
}

/// Sink contract. New delivery targets only need to implement this trait.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Stable sink identifier used in logs.
    fn name(&self) -> &str;

    /// Deliver one firing.
    async fn notify(&self, firing: &Firing) -> Result<(), NotifyError>;
}

/// Writes each firing to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, firing: &Firing) -> Result<(), NotifyError> {
        tracing::info!(
            trigger_id = %firing.trigger_id,
            fired_at = %firing.fired_at.to_rfc3339(),
            reason = %firing.reason,
            "ALARM TRIGGERED"
        );
        Ok(())
    }
}

/// Forwards firings to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Firing>,
}

impl ChannelNotifier {
    /// Wrap an existing sender.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Firing>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiver.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Firing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    fn name(&self) -> &str {
        "channel"
    }

    async fn notify(&self, firing: &Firing) -> Result<(), NotifyError> {
        self.tx
            .send(firing.clone())
            .map_err(|_| NotifyError::Closed(format!("trigger {}", firing.trigger_id)))
    }
}

/// Delivers to several sinks in order. One failing sink does not stop the rest.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sink.
    #[must_use]
    pub fn with(mut self, sink: impl Notifier + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for FanoutNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("FanoutNotifier")
            .field("sinks", &names)
            .finish()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    fn name(&self) -> &str {
        "fanout"
    }

    async fn notify(&self, firing: &Firing) -> Result<(), NotifyError> {
        let mut failed = Vec::new();
        for sink in &self.sinks {
            if let Err(e) = sink.notify(firing).await {
                tracing::warn!(sink = sink.name(), error = %e, "fanout sink failed");
                failed.push(sink.name().to_owned());
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Failed {
                sink: self.name().to_owned(),
                message: format!(
                    "{} of {} sinks failed: {}",
                    failed.len(),
                    self.sinks.len(),
                    failed.join(", ")
                ),
            })
        }
    }
}
