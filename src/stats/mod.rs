//! Session Statistics Module
//!
//! Periodic background work tied to a running session.
//!
//! ## Core Mechanisms
//! - **Statistics polling**: Every `stats_interval` the per-server counters are fetched on a
//!   blocking worker, aggregated, and posted as a status line. Polling only exists between
//!   session start and the final snapshot; stopping the poller waits for an in-flight query.
//! - **Session variables**: The shared global variable table is merged into the running
//!   session on its own interval and the merged values are written back.
//!
//! ## Submodules
//! - **`types`**: Aggregated counters and the status line text.
//! - **`poller`**: The statistics polling loop.
//! - **`variables`**: The session-variable merge loop.

pub mod poller;
pub mod types;
pub mod variables;
