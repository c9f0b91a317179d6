//! Single-threaded Presentation Context
//!
//! The sink is moved into one spawned task and never shared, so display work cannot run
//! concurrently with itself. `post` never blocks; `post_and_wait` blocks the calling worker
//! until the event has been applied and must not be called from async code.

use super::sink::DisplaySink;
use super::types::DisplayEvent;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum Command {
    Apply(DisplayEvent),
    ApplyAndAck(DisplayEvent, oneshot::Sender<()>),
    Barrier(oneshot::Sender<()>),
    Shutdown,
}

/// Cloneable handle for posting display events.
#[derive(Clone)]
pub struct Presenter {
    tx: mpsc::UnboundedSender<Command>,
}

impl Presenter {
    pub fn post(&self, event: DisplayEvent) {
        if self.tx.send(Command::Apply(event)).is_err() {
            tracing::trace!("Presentation context gone, dropping event");
        }
    }

    /// Posts `event` and blocks until the sink has applied it.
    ///
    /// Returns `false` if the presentation context has shut down.
    pub fn post_and_wait(&self, event: DisplayEvent) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::ApplyAndAck(event, ack_tx)).is_err() {
            return false;
        }
        ack_rx.blocking_recv().is_ok()
    }

    /// Resolves once every event posted before this call has been applied.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Barrier(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

/// Owns the presentation task.
pub struct PresentationContext {
    presenter: Presenter,
    task: JoinHandle<()>,
}

impl PresentationContext {
    /// Spawns the presentation task on the current tokio runtime.
    pub fn spawn<S: DisplaySink>(sink: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(Self::run(sink, rx));

        Self {
            presenter: Presenter { tx },
            task,
        }
    }

    pub fn presenter(&self) -> Presenter {
        self.presenter.clone()
    }

    async fn run<S: DisplaySink>(mut sink: S, mut rx: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!("Presentation context started");

        while let Some(command) = rx.recv().await {
            match command {
                Command::Apply(event) => sink.apply(event),
                Command::ApplyAndAck(event, ack) => {
                    sink.apply(event);
                    let _ = ack.send(());
                }
                Command::Barrier(ack) => {
                    let _ = ack.send(());
                }
                Command::Shutdown => break,
            }
        }

        tracing::debug!("Presentation context stopped");
    }

    /// Applies everything already posted, then stops the task.
    pub async fn shutdown(self) {
        let _ = self.presenter.tx.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            tracing::error!("Presentation task failed: {}", e);
        }
    }
}
