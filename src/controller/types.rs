use serde::Serialize;

/// Lifecycle of the (single) search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// No session; Start is available.
    Idle,
    /// The gatherer is pulling results.
    Running,
    /// The stream ended; final statistics and close are in progress.
    Draining,
    /// A stop was requested; the gatherer is winding down.
    Stopping,
}

impl SessionState {
    /// States in which the session is live and statistics may be polled.
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("a search session is already active")]
    AlreadyRunning,

    #[error("no search session is running")]
    NotRunning,

    /// Next was pressed while no full page is waiting to be dismissed.
    #[error("no full page is waiting for advance")]
    NextUnavailable,
}
