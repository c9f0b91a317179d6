//! Presentation Module
//!
//! Every display mutation is funneled through one `PresentationContext`: a single tokio task
//! that owns the `DisplaySink` and applies events strictly in the order they were posted.
//! Workers hold a cheap `Presenter` handle and never touch the sink directly.
//!
//! ## Submodules
//! - **`types`**: `DisplayEvent` and the button affordances.
//! - **`context`**: The presentation task and the `Presenter` handle (async post, blocking flush).
//! - **`sink`**: The `DisplaySink` trait and a channel-forwarding sink.

pub mod context;
pub mod sink;
pub mod types;

#[cfg(test)]
mod tests;
