//! Session Controller Module
//!
//! Owns the lifecycle of the one search session the browser runs at a time, and the worker
//! that feeds its results into the grid.
//!
//! ## Architecture Overview
//! 1. **Start**: `SessionController::start` moves `Idle -> Running`, resets the grid and spawns
//!    exactly one gatherer on the blocking pool.
//! 2. **Gathering**: The gatherer opens the backend session, starts the statistics and
//!    session-variable loops, then pulls results and places them, parking on the full-gate
//!    when the page is full.
//! 3. **Advance**: `advance` disables Next, resets the page and releases the gatherer.
//! 4. **Termination**: End of stream (`Draining`), a user stop (`Stopping`) or an I/O failure
//!    all run the same cleanup once: stop the loops, flush a final statistics snapshot,
//!    close the session, restore the idle affordances, then return to `Idle`.
//!
//! ## Submodules
//! - **`types`**: `SessionState` and `ControllerError`.
//! - **`controller`**: The public controller and the state shared with the worker.
//! - **`gatherer`**: The result-gathering worker.

pub mod controller;
pub mod gatherer;
pub mod types;
