use super::types::DisplayEvent;

use tokio::sync::mpsc;

/// The presentation layer. Only ever called from the presentation task, one event at a time.
pub trait DisplaySink: Send + 'static {
    fn apply(&mut self, event: DisplayEvent);
}

/// Forwards every event to a channel, for UIs that run their own event loop.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<DisplayEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<DisplayEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DisplayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl DisplaySink for ChannelSink {
    fn apply(&mut self, event: DisplayEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Display receiver dropped, discarding event");
        }
    }
}
