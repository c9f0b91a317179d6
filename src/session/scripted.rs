//! Scripted Backend
//!
//! Replays a fixed list of objects as a search stream. The script is plain JSON:
//!
//! ```json
//! {
//!   "servers": ["alpha", "beta"],
//!   "objects": [
//!     { "id": "obj-1", "data": "...", "attributes": { "_cols.int": 640, "label": "cat" } }
//!   ],
//!   "fail_after": null,
//!   "hang": false,
//!   "delay_ms": 0
//! }
//! ```
//!
//! Integer attribute values are stored as 4-byte little-endian integers, strings as UTF-8.

use super::search::{SearchFactory, SearchSession};
use super::types::*;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ScriptValue {
    Int(i32),
    Text(String),
}

impl ScriptValue {
    fn to_bytes(&self) -> Vec<u8> {
        match self {
            ScriptValue::Int(v) => v.to_le_bytes().to_vec(),
            ScriptValue::Text(s) => s.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptedObject {
    pub id: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub attributes: HashMap<String, ScriptValue>,
    /// Delivered without object data; the full object is only available through
    /// `SearchFactory::generate_result`.
    #[serde(default)]
    pub lazy: bool,
}

impl ScriptedObject {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: String::new(),
            attributes: HashMap::new(),
            lazy: false,
        }
    }

    fn full_result(&self) -> SearchResult {
        self.attributes.iter().fold(
            SearchResult::new(self.id.clone(), self.data.as_bytes().to_vec()),
            |result, (name, value)| result.with_attribute(name.clone(), value.to_bytes()),
        )
    }

    fn delivered_result(&self) -> SearchResult {
        if !self.lazy {
            return self.full_result();
        }
        self.attributes.iter().fold(
            SearchResult::new(self.id.clone(), Vec::new()),
            |result, (name, value)| result.with_attribute(name.clone(), value.to_bytes()),
        )
    }
}

fn default_servers() -> Vec<String> {
    vec!["scripted".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Script {
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,
    #[serde(default)]
    pub objects: Vec<ScriptedObject>,
    /// Fail with an I/O error once this many objects have been delivered.
    #[serde(default)]
    pub fail_after: Option<usize>,
    /// Block until closed instead of ending the stream after the last object.
    #[serde(default)]
    pub hang: bool,
    /// Pause before each delivered object.
    #[serde(default)]
    pub delay_ms: u64,
    /// Variables every server reports on the first merge.
    #[serde(default)]
    pub session_variables: HashMap<String, f64>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            objects: Vec::new(),
            fail_after: None,
            hang: false,
            delay_ms: 0,
            session_variables: HashMap::new(),
        }
    }
}

impl Script {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// `count` objects named `obj-1`, `obj-2`, ... with image dimensions attached.
    pub fn numbered(count: usize) -> Self {
        let objects = (1..=count)
            .map(|i| {
                let mut object = ScriptedObject::new(format!("obj-{}", i));
                object.data = format!("object {}", i);
                object
                    .attributes
                    .insert("_cols.int".to_string(), ScriptValue::Int(640));
                object
                    .attributes
                    .insert("_rows.int".to_string(), ScriptValue::Int(480));
                object
            })
            .collect();

        Self {
            objects,
            ..Self::default()
        }
    }
}

struct StreamState {
    pending: VecDeque<SearchResult>,
    delivered: usize,
    closed: bool,
    variables: HashMap<String, f64>,
}

/// One replay of a `Script`.
pub struct ScriptedSession {
    state: Mutex<StreamState>,
    wake: Condvar,
    servers: Vec<String>,
    total: usize,
    fail_after: Option<usize>,
    hang: bool,
    delay: Duration,
    close_calls: AtomicUsize,
    statistics_calls: AtomicUsize,
    merge_calls: AtomicUsize,
}

impl ScriptedSession {
    pub fn new(script: &Script) -> Self {
        let pending: VecDeque<SearchResult> = script
            .objects
            .iter()
            .map(ScriptedObject::delivered_result)
            .collect();
        let servers = if script.servers.is_empty() {
            default_servers()
        } else {
            script.servers.clone()
        };

        Self {
            total: pending.len(),
            state: Mutex::new(StreamState {
                pending,
                delivered: 0,
                closed: false,
                variables: script.session_variables.clone(),
            }),
            wake: Condvar::new(),
            servers,
            fail_after: script.fail_after,
            hang: script.hang,
            delay: Duration::from_millis(script.delay_ms),
            close_calls: AtomicUsize::new(0),
            statistics_calls: AtomicUsize::new(0),
            merge_calls: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn statistics_calls(&self) -> usize {
        self.statistics_calls.load(Ordering::SeqCst)
    }

    pub fn merge_calls(&self) -> usize {
        self.merge_calls.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> usize {
        self.lock().delivered
    }

    /// Objects are assigned to servers round-robin.
    fn server_counts(&self, index: usize, upto: usize) -> u64 {
        let n = self.servers.len();
        (0..upto).filter(|k| k % n == index).count() as u64
    }
}

impl SearchSession for ScriptedSession {
    fn next_result(&self) -> Result<Option<SearchResult>, SessionError> {
        let mut state = self.lock();

        if !self.delay.is_zero() && !state.closed {
            let (guard, _) = self
                .wake
                .wait_timeout_while(state, self.delay, |s| !s.closed)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }

        if state.closed {
            return Err(SessionError::Closed);
        }

        if self.fail_after == Some(state.delivered) {
            return Err(SessionError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "scripted connection reset",
            )));
        }

        if let Some(result) = state.pending.pop_front() {
            state.delivered += 1;
            return Ok(Some(result));
        }

        if self.hang {
            let _closed = self
                .wake
                .wait_while(state, |s| !s.closed)
                .unwrap_or_else(PoisonError::into_inner);
            return Err(SessionError::Closed);
        }

        Ok(None)
    }

    fn statistics(&self) -> Result<HashMap<String, ServerStatistics>, SessionError> {
        self.statistics_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        if state.closed {
            return Err(SessionError::Closed);
        }

        Ok(self
            .servers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                (
                    name.clone(),
                    ServerStatistics {
                        total_objects: self.server_counts(i, self.total),
                        processed_objects: self.server_counts(i, state.delivered),
                        dropped_objects: 0,
                    },
                )
            })
            .collect())
    }

    fn merge_session_variables(
        &self,
        globals: &HashMap<String, f64>,
    ) -> Result<HashMap<String, f64>, SessionError> {
        self.merge_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.closed {
            return Err(SessionError::Closed);
        }

        state
            .variables
            .extend(globals.iter().map(|(k, v)| (k.clone(), *v)));
        Ok(state.variables.clone())
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        state.closed = true;
        self.wake.notify_all();
    }
}

/// Starts a fresh `ScriptedSession` for every search.
pub struct ScriptedFactory {
    script: Script,
    sessions: Mutex<Vec<Arc<ScriptedSession>>>,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn sessions_started(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn last_session(&self) -> Option<Arc<ScriptedSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl SearchFactory for ScriptedFactory {
    fn start(
        &self,
        scope: &Scope,
        searchlet: &Searchlet,
    ) -> Result<Arc<dyn SearchSession>, SessionError> {
        searchlet.validate()?;

        tracing::debug!(
            "Starting scripted search over scope '{}' with {} filter(s)",
            scope.name,
            searchlet.filters.len()
        );

        let session = Arc::new(ScriptedSession::new(&self.script));
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(session.clone());

        Ok(session)
    }

    fn generate_result(
        &self,
        object_id: &ObjectId,
        _attributes: &[String],
    ) -> Result<SearchResult, SessionError> {
        self.script
            .objects
            .iter()
            .find(|o| o.id == object_id.0)
            .map(ScriptedObject::full_result)
            .ok_or_else(|| {
                SessionError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("object {} not found", object_id),
                ))
            })
    }
}
