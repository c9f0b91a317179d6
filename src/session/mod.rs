//! Search Session Module
//!
//! The boundary to the remote content-search backend. Everything behind these traits
//! (searchlet execution, filter evaluation, per-server statistics collection) belongs to the
//! backend client; this crate only drives it.
//!
//! ## Submodules
//! - **`types`**: Results, scopes, searchlet definitions, statistics and the error taxonomy.
//! - **`search`**: The `SearchSession` / `SearchFactory` traits and the close-once `SessionHandle`.
//! - **`scripted`**: An in-memory backend that replays a JSON script. Drives the binary and the tests.

pub mod scripted;
pub mod search;
pub mod types;

#[cfg(test)]
mod tests;
