//! Result Grid Module
//!
//! The fixed page of display slots and the gate that blocks the producer while the page is full.
//!
//! ## Core Mechanisms
//! - **Slots**: `rows * cols` positions filled strictly in order. `next_empty` only grows until
//!   the next reset.
//! - **Full-gate**: One mutex/condvar pair. The gatherer waits on it when every slot is
//!   occupied; `advance` resets the page and wakes it under the same lock, so a placement can
//!   never race a reset.
//! - **Cancellation**: `cancel` flips the grid to "not accepting" and wakes every waiter, so a
//!   stopped session leaves the gate without placing anything.

pub mod gate;
pub mod types;
