//! Result Gatherer
//!
//! The producer side of the grid. Runs on the blocking pool because it spends its life in
//! `next_result` or parked on the full-gate.
//!
//! ## Responsibilities
//! - **Opening**: Starting the backend session and its periodic loops.
//! - **Draining**: Annotating each result and placing it, in arrival order.
//! - **Cleanup**: Exactly one pass, whichever way the stream ended.

use super::controller::Shared;
use crate::annotate::annotator::Annotator;
use crate::annotate::decorator::Decorator;
use crate::annotate::thumbnail::ThumbnailSource;
use crate::display::types::DisplayEvent;
use crate::grid::types::{Placement, SlotView};
use crate::session::search::{SearchFactory, SessionHandle};
use crate::session::types::{Scope, SearchResult, Searchlet, SessionError, SessionId};
use crate::stats::poller::StatisticsPoller;
use crate::stats::types::{StatisticsSummary, StatusLine};

use std::sync::Arc;
use std::time::Duration;

/// How the gathering loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GatherOutcome {
    /// The session reported end of stream.
    Exhausted,
    /// Stopped by the user, or the session was closed underneath us.
    Cancelled,
    /// The session could not be started or failed mid-stream.
    Failed,
}

pub(crate) struct ResultGatherer {
    pub(crate) id: SessionId,
    pub(crate) shared: Arc<Shared>,
    pub(crate) factory: Arc<dyn SearchFactory>,
    pub(crate) annotator: Option<Arc<dyn Annotator>>,
    pub(crate) decorator: Option<Arc<dyn Decorator>>,
    pub(crate) scope: Scope,
    pub(crate) searchlet: Searchlet,
    pub(crate) stats_interval: Duration,
}

impl ResultGatherer {
    pub(crate) fn run(self) {
        tracing::info!("Result gatherer for session {} started", self.id);

        let session = match self.open_session() {
            Ok(session) => session,
            Err(outcome) => {
                self.finish(None, None, outcome);
                return;
            }
        };

        let poller = {
            let shared = self.shared.clone();
            StatisticsPoller::spawn(
                &self.shared.runtime,
                session.clone(),
                self.shared.presenter.clone(),
                self.stats_interval,
                move || {
                    let _ = shared.request_stop();
                },
            )
        };
        self.shared.start_pusher(&session);

        let outcome = self.drain(&session);
        self.finish(Some(session), Some(poller), outcome);
    }

    fn open_session(&self) -> Result<Arc<SessionHandle>, GatherOutcome> {
        let backend = self
            .factory
            .start(&self.scope, &self.searchlet)
            .map_err(|e| {
                tracing::error!("Failed to start session {}: {}", self.id, e);
                GatherOutcome::Failed
            })?;

        let session = Arc::new(SessionHandle::new(self.id.clone(), backend));

        if !self.shared.attach_session(&session) {
            tracing::info!("Session {} stopped while opening", self.id);
            session.close();
            return Err(GatherOutcome::Cancelled);
        }

        Ok(session)
    }

    fn drain(&self, session: &SessionHandle) -> GatherOutcome {
        let presenter = &self.shared.presenter;

        loop {
            tracing::trace!("Session {}: waiting for next result", self.id);

            match session.next_result() {
                Ok(Some(result)) => {
                    let view = self.build_view(result);
                    let object_id = view.object_id().clone();

                    let placement = self.shared.grid.place(
                        view,
                        || presenter.post(DisplayEvent::NextEnabled(true)),
                        |index, view| {
                            presenter.post(DisplayEvent::SlotFilled {
                                index,
                                view: view.clone(),
                            })
                        },
                    );

                    match placement {
                        Placement::Placed(index) => {
                            tracing::debug!(
                                "Session {}: placed {} in slot {}",
                                self.id,
                                object_id,
                                index
                            );
                        }
                        Placement::Cancelled => {
                            tracing::debug!(
                                "Session {}: cancelled, dropping {}",
                                self.id,
                                object_id
                            );
                            return GatherOutcome::Cancelled;
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("Session {}: no more objects", self.id);
                    self.shared.mark_draining();
                    return GatherOutcome::Exhausted;
                }
                Err(SessionError::Closed) => {
                    tracing::debug!("Session {} closed while fetching", self.id);
                    return GatherOutcome::Cancelled;
                }
                Err(e) => {
                    tracing::error!("Session {}: fetch failed: {}", self.id, e);
                    return GatherOutcome::Failed;
                }
            }
        }
    }

    /// Annotates and decorates the result and picks its thumbnail bytes. May hit the backend.
    fn build_view(&self, result: SearchResult) -> SlotView {
        let annotations = self
            .annotator
            .as_ref()
            .map(|a| a.annotations(&result))
            .unwrap_or_default();
        let decorations = self
            .decorator
            .as_ref()
            .map(|d| d.decorate(&result))
            .unwrap_or_default();
        let thumbnail = ThumbnailSource::resolve(&result, Some(self.factory.as_ref()));

        SlotView {
            result: Arc::new(result),
            annotations,
            decorations,
            thumbnail,
        }
    }

    fn finish(
        &self,
        session: Option<Arc<SessionHandle>>,
        poller: Option<StatisticsPoller>,
        outcome: GatherOutcome,
    ) {
        let presenter = &self.shared.presenter;

        self.shared.grid.cancel();
        presenter.post(DisplayEvent::NextEnabled(false));

        if let Some(poller) = poller {
            poller.stop_blocking(&self.shared.runtime);
        }
        // A detached session never gets a new pusher
        self.shared.detach_session();
        self.shared.stop_pusher();

        if let Some(session) = session {
            match session.statistics() {
                Ok(servers) => {
                    tracing::debug!("Session {}: final statistics", self.id);
                    let summary = StatisticsSummary::aggregate(&servers);
                    presenter.post_and_wait(DisplayEvent::Status(StatusLine::Progress(summary)));
                }
                Err(SessionError::Closed) => {
                    tracing::debug!("Session {} closed before final statistics", self.id);
                }
                Err(e) => {
                    tracing::error!("Session {}: final statistics failed: {}", self.id, e);
                }
            }

            session.close();
        }

        if outcome != GatherOutcome::Exhausted {
            self.shared.grid.disable_selection();
            presenter.post(DisplayEvent::SelectionEnabled(false));
        }

        self.shared.enter_idle();

        tracing::info!(
            "Result gatherer for session {} finished ({:?})",
            self.id,
            outcome
        );
    }
}
