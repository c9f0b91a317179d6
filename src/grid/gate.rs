//! Slot Grid and Full-Gate
//!
//! All grid state lives behind one mutex. The callbacks passed to `open`, `place` and
//! `advance` run while that lock is held, which keeps the display events they emit in the
//! same order as the grid mutations they describe. Callbacks must not block.

use super::types::*;
use crate::config::{ConfigError, grid_capacity};

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

pub const DEFAULT_ROWS: usize = 3;
pub const DEFAULT_COLS: usize = 3;

struct GridState {
    slots: Vec<Option<SlotView>>,
    next_empty: usize,
    /// Cleared by `cancel`; placements and waits give up once it is false.
    accepting: bool,
    /// Set while the producer is parked on the full-gate.
    waiting: bool,
    selectable: bool,
}

impl GridState {
    fn is_full(&self) -> bool {
        self.next_empty >= self.slots.len()
    }

    fn clear(&mut self) {
        self.next_empty = 0;
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

/// A fixed page of `rows * cols` result slots.
pub struct ResultGrid {
    rows: usize,
    cols: usize,
    state: Mutex<GridState>,
    not_full: Condvar,
}

impl ResultGrid {
    /// Fails for an empty grid or one above `MAX_GRID_SLOTS`.
    pub fn new(rows: usize, cols: usize) -> Result<Self, ConfigError> {
        let capacity = grid_capacity(rows, cols)?;
        Ok(Self::with_capacity(rows, cols, capacity))
    }

    fn with_capacity(rows: usize, cols: usize, capacity: usize) -> Self {
        Self {
            rows,
            cols,
            state: Mutex::new(GridState {
                slots: vec![None; capacity],
                next_empty: 0,
                accepting: false,
                waiting: false,
                selectable: false,
            }),
            not_full: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GridState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_full(&self) -> bool {
        self.lock().is_full()
    }

    pub fn is_waiting(&self) -> bool {
        self.lock().waiting
    }

    /// Empties every slot and starts accepting results for a new session.
    pub fn open<F: FnOnce()>(&self, on_reset: F) {
        let mut state = self.lock();
        state.clear();
        state.accepting = true;
        state.waiting = false;
        state.selectable = true;
        on_reset();
    }

    /// Stores `view` in the next free slot, parking on the full-gate while the page is full.
    ///
    /// `on_full` runs once, before parking. `on_placed` runs with the chosen index.
    pub fn place<F, P>(&self, view: SlotView, on_full: F, on_placed: P) -> Placement
    where
        F: FnOnce(),
        P: FnOnce(usize, &SlotView),
    {
        let mut state = self.lock();

        if state.accepting && state.is_full() {
            state.waiting = true;
            on_full();
            tracing::debug!("Grid full, waiting for advance");

            state = self
                .not_full
                .wait_while(state, |s| s.accepting && s.is_full())
                .unwrap_or_else(PoisonError::into_inner);
            state.waiting = false;
        }

        if !state.accepting {
            return Placement::Cancelled;
        }

        let index = state.next_empty;
        on_placed(index, &view);
        state.slots[index] = Some(view);
        state.next_empty += 1;

        Placement::Placed(index)
    }

    /// Resets a full page and releases the parked producer.
    ///
    /// Returns `false` without touching the grid unless a producer is currently parked,
    /// which also rejects a second advance racing the first.
    pub fn advance<F: FnOnce()>(&self, on_reset: F) -> bool {
        let mut state = self.lock();
        if !state.waiting || !state.accepting {
            return false;
        }

        state.waiting = false;
        state.clear();
        on_reset();
        self.not_full.notify_one();
        true
    }

    /// Stops accepting results and wakes a parked producer.
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.accepting = false;
        self.not_full.notify_all();
    }

    /// Keeps the slots visible but stops them from being opened.
    pub fn disable_selection(&self) {
        self.lock().selectable = false;
    }

    /// The slot at `index`, if it is occupied and selectable.
    pub fn select(&self, index: usize) -> Option<SlotView> {
        let state = self.lock();
        if !state.selectable {
            return None;
        }
        state.slots.get(index).cloned().flatten()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let state = self.lock();
        GridSnapshot {
            rows: self.rows,
            cols: self.cols,
            slots: state
                .slots
                .iter()
                .map(|slot| slot.as_ref().map(|v| v.object_id().clone()))
                .collect(),
            next_empty: state.next_empty,
            selectable: state.selectable,
            waiting: state.waiting,
        }
    }
}

impl Default for ResultGrid {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ROWS, DEFAULT_COLS, DEFAULT_ROWS * DEFAULT_COLS)
    }
}
