//! Backend Collaborator Traits
//!
//! `SearchFactory` starts sessions; `SearchSession` is one running search. Both are driven
//! from blocking worker threads, never from the presentation context.

use super::types::*;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A running search on the backend.
///
/// `close` must be callable while another thread is blocked in `next_result`, and must
/// unblock it (the blocked call then returns `SessionError::Closed`).
pub trait SearchSession: Send + Sync {
    /// Blocks until the next result arrives. `Ok(None)` marks the end of the stream.
    fn next_result(&self) -> Result<Option<SearchResult>, SessionError>;

    /// Per-server counters, keyed by server name.
    fn statistics(&self) -> Result<HashMap<String, ServerStatistics>, SessionError>;

    /// Pushes the global session variables to the servers and returns the merged values.
    fn merge_session_variables(
        &self,
        globals: &HashMap<String, f64>,
    ) -> Result<HashMap<String, f64>, SessionError>;

    fn close(&self);
}

/// Creates sessions against a backend.
pub trait SearchFactory: Send + Sync {
    fn start(
        &self,
        scope: &Scope,
        searchlet: &Searchlet,
    ) -> Result<Arc<dyn SearchSession>, SessionError>;

    /// Re-fetches an object. An empty `attributes` list asks for the object data only.
    fn generate_result(
        &self,
        object_id: &ObjectId,
        attributes: &[String],
    ) -> Result<SearchResult, SessionError>;
}

/// Shared owner of one session. Guarantees the backend `close` runs at most once,
/// whichever of stop or drain completion gets there first.
pub struct SessionHandle {
    id: SessionId,
    session: Arc<dyn SearchSession>,
    closed: AtomicBool,
}

impl SessionHandle {
    pub fn new(id: SessionId, session: Arc<dyn SearchSession>) -> Self {
        Self {
            id,
            session,
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn next_result(&self) -> Result<Option<SearchResult>, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        self.session.next_result()
    }

    pub fn statistics(&self) -> Result<HashMap<String, ServerStatistics>, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        self.session.statistics()
    }

    pub fn merge_session_variables(
        &self,
        globals: &HashMap<String, f64>,
    ) -> Result<HashMap<String, f64>, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        self.session.merge_session_variables(globals)
    }

    /// Closes the backend session. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Session {} already closed", self.id);
            return false;
        }

        tracing::info!("Closing session {}", self.id);
        self.session.close();
        true
    }
}
