use super::types::StatusLine;
use crate::display::context::Presenter;
use crate::display::types::DisplayEvent;
use crate::session::search::SessionHandle;
use crate::session::types::SessionError;

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_millis(500);

/// Background task refreshing the status line while a session runs.
pub struct StatisticsPoller {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StatisticsPoller {
    /// Starts polling `session` every `period`. The first query happens one period after start.
    ///
    /// `on_failure` runs once if a query fails with an I/O error; the poller then exits.
    pub fn spawn<F>(
        runtime: &Handle,
        session: Arc<SessionHandle>,
        presenter: Presenter,
        period: Duration,
        on_failure: F,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = runtime.spawn(Self::poll_loop(
            session,
            presenter,
            period,
            cancel.clone(),
            on_failure,
        ));

        Self { cancel, task }
    }

    async fn poll_loop<F>(
        session: Arc<SessionHandle>,
        presenter: Presenter,
        period: Duration,
        cancel: CancellationToken,
        on_failure: F,
    ) where
        F: FnOnce() + Send + 'static,
    {
        tracing::debug!("Statistics poller started for session {}", session.id());

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let query = session.clone();
            let outcome = tokio::task::spawn_blocking(move || query.statistics()).await;

            if cancel.is_cancelled() {
                break;
            }

            match outcome {
                Ok(Ok(servers)) => {
                    let line = StatusLine::from_statistics(&servers);
                    tracing::trace!("Session {}: {}", session.id(), line);
                    presenter.post(DisplayEvent::Status(line));
                }
                Ok(Err(SessionError::Closed)) => {
                    tracing::debug!("Session {} closed, statistics poller exiting", session.id());
                    break;
                }
                Ok(Err(e)) => {
                    tracing::error!("Statistics query for session {} failed: {}", session.id(), e);
                    on_failure();
                    break;
                }
                Err(e) => {
                    tracing::error!("Statistics query task failed: {}", e);
                    break;
                }
            }
        }

        tracing::debug!("Statistics poller stopped for session {}", session.id());
    }

    /// Cancels polling and waits for any in-flight query to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Statistics poller task failed: {}", e);
        }
    }

    /// `stop` for blocking worker threads.
    pub fn stop_blocking(self, runtime: &Handle) {
        runtime.block_on(self.stop());
    }
}
