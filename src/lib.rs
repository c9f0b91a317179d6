//! Interactive Search Result Browser Library
//!
//! This library crate holds the core of a result browser for interactive, filter-based
//! object search. It serves as the foundation for the binary executable (`main.rs`) and for
//! any front end that renders its display events.
//!
//! ## Architecture Modules
//! The browser is composed of seven loosely coupled subsystems:
//!
//! - **`session`**: The search backend seam. Defines searchlets, results and statistics, the
//!   `SearchSession` / `SearchFactory` traits, and a scripted backend for demos and tests.
//! - **`grid`**: The bounded result grid. Holds one page of results and parks the producer
//!   on a full-gate until the page is dismissed or the session is cancelled.
//! - **`controller`**: The session lifecycle. Enforces one active session, runs the result
//!   gatherer and performs cleanup exactly once however the session ends.
//! - **`stats`**: Periodic statistics polling, the status line, and session variable merging.
//! - **`display`**: The single presentation context. Every visible change is posted to it as
//!   a `DisplayEvent` and applied in order by a `DisplaySink`.
//! - **`annotate`**: Annotation texts and thumbnail source selection for displayed results.
//! - **`config`**: Grid dimensions and loop periods, with environment overrides.

pub mod annotate;
pub mod config;
pub mod controller;
pub mod display;
pub mod grid;
pub mod session;
pub mod stats;
