use crate::display::context::Presenter;
use crate::display::types::DisplayEvent;
use crate::session::search::SessionHandle;
use crate::session::types::SessionError;

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SESSION_VARS_INTERVAL: Duration = Duration::from_secs(1);

/// Global session variables, shared between the UI and the merge loop.
pub type SessionVariables = Arc<DashMap<String, f64>>;

/// Background task merging the global session variables into a running session.
pub struct SessionVariablePusher {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionVariablePusher {
    /// Starts merging immediately, then every `period`.
    pub fn spawn(
        runtime: &Handle,
        session: Arc<SessionHandle>,
        globals: SessionVariables,
        presenter: Presenter,
        period: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task = runtime.spawn(Self::merge_loop(
            session,
            globals,
            presenter,
            period,
            cancel.clone(),
        ));

        Self { cancel, task }
    }

    async fn merge_loop(
        session: Arc<SessionHandle>,
        globals: SessionVariables,
        presenter: Presenter,
        period: Duration,
        cancel: CancellationToken,
    ) {
        tracing::debug!(
            "Session variable merge every {:?} for session {}",
            period,
            session.id()
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let snapshot: HashMap<String, f64> = globals
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect();

            let query = session.clone();
            let outcome =
                tokio::task::spawn_blocking(move || query.merge_session_variables(&snapshot)).await;

            if cancel.is_cancelled() {
                break;
            }

            match outcome {
                Ok(Ok(merged)) => {
                    for (name, value) in &merged {
                        globals.insert(name.clone(), *value);
                    }

                    let mut sorted: Vec<(String, f64)> = merged.into_iter().collect();
                    sorted.sort_by(|a, b| a.0.cmp(&b.0));
                    presenter.post(DisplayEvent::SessionVariablesChanged(sorted));
                }
                Ok(Err(SessionError::Closed)) => {
                    tracing::debug!("Session {} closed, variable merge exiting", session.id());
                    break;
                }
                Ok(Err(e)) => {
                    tracing::warn!("Session variable merge for {} failed: {}", session.id(), e);
                }
                Err(e) => {
                    tracing::error!("Session variable merge task failed: {}", e);
                    break;
                }
            }
        }

        tracing::debug!("Session variable merge stopped for session {}", session.id());
    }

    /// Stops merging without waiting for an in-flight merge.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Session variable task failed: {}", e);
        }
    }

    pub fn stop_blocking(self, runtime: &Handle) {
        runtime.block_on(self.stop());
    }
}
