use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies one started search session in logs and events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generates a new random UUID v4-based SessionId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend identifier of a searched object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ObjectId(pub String);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single object returned by a search session.
///
/// Carries the raw object bytes plus named attribute values attached by the filters
/// (dimensions, thumbnails, scores). Never mutated after the session hands it over.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    object_id: ObjectId,
    data: Vec<u8>,
    attributes: HashMap<String, Vec<u8>>,
}

impl SearchResult {
    pub fn new(object_id: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            object_id: ObjectId(object_id.into()),
            data: data.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Stores `value` as a 4-byte little-endian integer attribute.
    pub fn with_int_attribute(self, name: impl Into<String>, value: i32) -> Self {
        self.with_attribute(name, value.to_le_bytes().to_vec())
    }

    pub fn object_id(&self) -> &ObjectId {
        &self.object_id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn value(&self, name: &str) -> Option<&[u8]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    pub fn int_value(&self, name: &str) -> Option<i32> {
        self.value(name).and_then(extract_int)
    }

    pub fn string_value(&self, name: &str) -> Option<&str> {
        self.value(name)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .map(|s| s.trim_end_matches('\0'))
    }

    /// Attribute names in sorted order.
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Decodes the leading 4 bytes as a little-endian `i32`.
pub fn extract_int(bytes: &[u8]) -> Option<i32> {
    let head: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    Some(i32::from_le_bytes(head))
}

/// Object counters reported by one backend server.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerStatistics {
    pub total_objects: u64,
    pub processed_objects: u64,
    pub dropped_objects: u64,
}

/// The set of objects a search runs over. Opaque to this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scope {
    pub name: String,
    pub cookie: String,
}

impl Scope {
    pub fn new(name: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cookie: cookie.into(),
        }
    }
}

/// Executable filter code shipped to the servers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterCode(pub Vec<u8>);

/// One filter stage of a searchlet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub code: FilterCode,
    pub eval_function: String,
    pub init_function: String,
    pub fini_function: String,
    /// Minimum score an object must reach to pass the filter.
    pub threshold: i32,
    /// Names of filters that must run before this one.
    pub dependencies: Vec<String>,
    pub arguments: Vec<String>,
    pub merit: i32,
}

impl Filter {
    pub fn new(
        name: impl Into<String>,
        code: FilterCode,
        eval_function: impl Into<String>,
        init_function: impl Into<String>,
        fini_function: impl Into<String>,
        threshold: i32,
    ) -> Self {
        Self {
            name: name.into(),
            code,
            eval_function: eval_function.into(),
            init_function: init_function.into(),
            fini_function: fini_function.into(),
            threshold,
            dependencies: Vec::new(),
            arguments: Vec::new(),
            merit: 0,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_merit(mut self, merit: i32) -> Self {
        self.merit = merit;
        self
    }
}

/// The filter pipeline submitted with a search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Searchlet {
    pub filters: Vec<Filter>,
    /// Filters whose results the application needs attached to every returned object.
    pub application_dependencies: Vec<String>,
}

impl Searchlet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn set_application_dependencies(&mut self, dependencies: Vec<String>) {
        self.application_dependencies = dependencies;
    }

    fn has_filter(&self, name: &str) -> bool {
        self.filters.iter().any(|f| f.name == name)
    }

    /// Checks that the searchlet is non-empty and that every dependency names a filter.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.filters.is_empty() {
            return Err(SessionError::InvalidSearchlet(
                "searchlet has no filters".to_string(),
            ));
        }

        for filter in &self.filters {
            if let Some(missing) = filter.dependencies.iter().find(|d| !self.has_filter(d)) {
                return Err(SessionError::InvalidSearchlet(format!(
                    "filter '{}' depends on unknown filter '{}'",
                    filter.name, missing
                )));
            }
        }

        if let Some(missing) = self
            .application_dependencies
            .iter()
            .find(|d| !self.has_filter(d))
        {
            return Err(SessionError::InvalidSearchlet(format!(
                "application depends on unknown filter '{}'",
                missing
            )));
        }

        Ok(())
    }
}

/// Failures reported by the search backend.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session was closed, usually by a concurrent stop. Benign at most call sites.
    #[error("search session is closed")]
    Closed,

    #[error("search I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid searchlet: {0}")]
    InvalidSearchlet(String),
}
