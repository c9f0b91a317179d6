use super::gatherer::ResultGatherer;
use super::types::*;
use crate::annotate::annotator::Annotator;
use crate::annotate::decorator::Decorator;
use crate::config::{BrowserConfig, ConfigError};
use crate::display::context::Presenter;
use crate::display::types::DisplayEvent;
use crate::grid::gate::ResultGrid;
use crate::grid::types::{GridSnapshot, SlotView};
use crate::session::search::{SearchFactory, SessionHandle};
use crate::session::types::{Scope, Searchlet, SessionId};
use crate::stats::types::StatusLine;
use crate::stats::variables::{SessionVariablePusher, SessionVariables};

use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the controller and its gatherer.
///
/// Lock order: `state`, then `session`, then `pusher`.
pub(crate) struct Shared {
    state: Mutex<SessionState>,
    session: Mutex<Option<Arc<SessionHandle>>>,
    pub(crate) grid: ResultGrid,
    pub(crate) presenter: Presenter,
    pub(crate) runtime: Handle,
    variables: SessionVariables,
    vars_interval: Mutex<Option<Duration>>,
    pusher: Mutex<Option<SessionVariablePusher>>,
}

impl Shared {
    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    /// Moves `Running -> Draining`. Any other state is left alone.
    pub(crate) fn mark_draining(&self) {
        let mut state = self.state();
        if *state == SessionState::Running {
            *state = SessionState::Draining;
            self.presenter.post(DisplayEvent::StateChanged(SessionState::Draining));
        }
    }

    /// Publishes the opened session, unless a stop already arrived.
    ///
    /// Returns `false` when the session must be abandoned.
    pub(crate) fn attach_session(&self, session: &Arc<SessionHandle>) -> bool {
        let state = self.state();
        if *state == SessionState::Stopping {
            return false;
        }
        *lock(&self.session) = Some(session.clone());
        true
    }

    pub(crate) fn detach_session(&self) {
        lock(&self.session).take();
    }

    /// Returns to `Idle` and restores the idle affordances.
    pub(crate) fn enter_idle(&self) {
        let mut state = self.state();
        *state = SessionState::Idle;
        self.presenter.post(DisplayEvent::StateChanged(SessionState::Idle));
        self.presenter.post(DisplayEvent::StartEnabled(true));
        self.presenter.post(DisplayEvent::StopEnabled(false));
    }

    /// Cancels the running session: the grid stops accepting results and the backend
    /// session is closed on a blocking worker, which unblocks a pending fetch.
    pub(crate) fn request_stop(&self) -> Result<(), ControllerError> {
        let session = {
            let mut state = self.state();
            if !state.is_active() {
                return Err(ControllerError::NotRunning);
            }
            match *state {
                SessionState::Stopping => return Ok(()),
                _ => {
                    *state = SessionState::Stopping;
                    self.presenter.post(DisplayEvent::StateChanged(SessionState::Stopping));
                    self.presenter.post(DisplayEvent::StopEnabled(false));
                }
            }
            lock(&self.session).clone()
        };

        self.grid.cancel();

        if let Some(session) = session {
            tracing::info!("Stop requested for session {}", session.id());
            self.runtime.spawn_blocking(move || {
                session.close();
            });
        } else {
            tracing::info!("Stop requested with no open session");
        }

        Ok(())
    }

    /// (Re)starts the session variable loop for `session` with the configured interval.
    ///
    /// Does nothing once `session` has been detached, so cleanup never leaves a loop behind.
    pub(crate) fn start_pusher(&self, session: &Arc<SessionHandle>) {
        let attached = lock(&self.session);
        if !attached
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, session))
        {
            tracing::debug!("Session {} detached, not merging variables", session.id());
            return;
        }

        let interval = *lock(&self.vars_interval);
        let mut pusher = lock(&self.pusher);

        if let Some(old) = pusher.take() {
            old.cancel();
        }

        if let Some(period) = interval {
            *pusher = Some(SessionVariablePusher::spawn(
                &self.runtime,
                session.clone(),
                self.variables.clone(),
                self.presenter.clone(),
                period,
            ));
        }
    }

    /// Stops the session variable loop and waits for an in-flight merge. Blocking.
    pub(crate) fn stop_pusher(&self) {
        let pusher = lock(&self.pusher).take();
        if let Some(pusher) = pusher {
            pusher.stop_blocking(&self.runtime);
        }
    }
}

/// Drives one search session at a time and exposes the Start / Stop / Next controls.
///
/// All display changes are posted to the `Presenter` given at construction. The methods
/// never block on backend I/O and are safe to call from the presentation context.
pub struct SessionController {
    shared: Arc<Shared>,
    factory: Arc<dyn SearchFactory>,
    annotator: Option<Arc<dyn Annotator>>,
    decorator: Option<Arc<dyn Decorator>>,
    stats_interval: Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    /// Creates an idle controller. Must be called from within a tokio runtime.
    pub fn new(
        config: &BrowserConfig,
        factory: Arc<dyn SearchFactory>,
        presenter: Presenter,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::Idle),
                session: Mutex::new(None),
                grid: ResultGrid::new(config.rows, config.cols)?,
                presenter,
                runtime: Handle::current(),
                variables: Arc::new(DashMap::new()),
                vars_interval: Mutex::new(config.session_vars_interval()),
                pusher: Mutex::new(None),
            }),
            factory,
            annotator: None,
            decorator: None,
            stats_interval: config.stats_interval(),
            worker: Mutex::new(None),
        })
    }

    pub fn with_annotator(mut self, annotator: Arc<dyn Annotator>) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub fn with_decorator(mut self, decorator: Arc<dyn Decorator>) -> Self {
        self.decorator = Some(decorator);
        self
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state()
    }

    pub fn grid(&self) -> GridSnapshot {
        self.shared.grid.snapshot()
    }

    pub fn capacity(&self) -> usize {
        self.shared.grid.capacity()
    }

    /// The result shown in slot `index`, if it can currently be opened.
    pub fn select(&self, index: usize) -> Option<SlotView> {
        self.shared.grid.select(index)
    }

    /// The global session variable table merged into every running session.
    pub fn session_variables(&self) -> SessionVariables {
        self.shared.variables.clone()
    }

    /// Starts a new search. Fails only if a session is already active.
    pub fn start(&self, scope: Scope, searchlet: Searchlet) -> Result<SessionId, ControllerError> {
        let presenter = &self.shared.presenter;

        {
            let mut state = self.shared.state();
            if state.is_active() {
                tracing::warn!("Start rejected, session is {:?}", *state);
                return Err(ControllerError::AlreadyRunning);
            }
            *state = SessionState::Running;
            presenter.post(DisplayEvent::StateChanged(SessionState::Running));
            presenter.post(DisplayEvent::StartEnabled(false));
            presenter.post(DisplayEvent::StopEnabled(true));
        }

        self.shared
            .grid
            .open(|| presenter.post(DisplayEvent::GridCleared));
        presenter.post(DisplayEvent::NextEnabled(false));
        presenter.post(DisplayEvent::SelectionEnabled(true));
        presenter.post(DisplayEvent::Status(StatusLine::initializing()));

        let id = SessionId::new();
        tracing::info!(
            "Starting session {} over scope '{}' ({} slots)",
            id,
            scope.name,
            self.shared.grid.capacity()
        );

        let gatherer = ResultGatherer {
            id: id.clone(),
            shared: self.shared.clone(),
            factory: self.factory.clone(),
            annotator: self.annotator.clone(),
            decorator: self.decorator.clone(),
            scope,
            searchlet,
            stats_interval: self.stats_interval,
        };

        let worker = self.shared.runtime.spawn_blocking(move || gatherer.run());
        *lock(&self.worker) = Some(worker);

        Ok(id)
    }

    /// Requests the running session to stop. Returns before the gatherer has exited.
    pub fn stop(&self) -> Result<(), ControllerError> {
        self.shared.request_stop()
    }

    /// Dismisses a full page: disables Next, empties the grid and releases the gatherer.
    pub fn advance(&self) -> Result<(), ControllerError> {
        let presenter = &self.shared.presenter;
        presenter.post(DisplayEvent::NextEnabled(false));

        if self
            .shared
            .grid
            .advance(|| presenter.post(DisplayEvent::GridCleared))
        {
            tracing::debug!("Page dismissed");
            Ok(())
        } else {
            Err(ControllerError::NextUnavailable)
        }
    }

    /// Changes the session variable merge period; `None` stops merging.
    /// Takes effect immediately for a running session.
    pub fn set_session_variable_interval(&self, interval: Option<Duration>) {
        tracing::info!("Session variable interval set to {:?}", interval);
        *lock(&self.shared.vars_interval) = interval;

        let session = lock(&self.shared.session).clone();
        match session {
            Some(session) => self.shared.start_pusher(&session),
            None => {
                if let Some(old) = lock(&self.shared.pusher).take() {
                    old.cancel();
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> Arc<Shared> {
        self.shared.clone()
    }

    /// Waits for the current gatherer, if any, to finish its cleanup.
    pub async fn join(&self) {
        let worker = lock(&self.worker).take();
        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            tracing::error!("Result gatherer failed: {}", e);
        }
    }
}
