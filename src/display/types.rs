use crate::controller::types::SessionState;
use crate::grid::types::SlotView;
use crate::stats::types::StatusLine;

/// Enabled state of the three user controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Affordances {
    pub start: bool,
    pub stop: bool,
    pub next: bool,
}

impl Affordances {
    pub const IDLE: Self = Self {
        start: true,
        stop: false,
        next: false,
    };

    pub const RUNNING: Self = Self {
        start: false,
        stop: true,
        next: false,
    };
}

/// One change to apply to the display.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    StateChanged(SessionState),
    StartEnabled(bool),
    StopEnabled(bool),
    NextEnabled(bool),
    /// Every slot emptied.
    GridCleared,
    SlotFilled {
        index: usize,
        view: SlotView,
    },
    /// Whether occupied slots may be opened.
    SelectionEnabled(bool),
    Status(StatusLine),
    /// Global session variables after a merge, sorted by name.
    SessionVariablesChanged(Vec<(String, f64)>),
}

impl DisplayEvent {
    /// Applies this event to a tracked set of affordances.
    pub fn update_affordances(&self, affordances: &mut Affordances) {
        match self {
            DisplayEvent::StartEnabled(on) => affordances.start = *on,
            DisplayEvent::StopEnabled(on) => affordances.stop = *on,
            DisplayEvent::NextEnabled(on) => affordances.next = *on,
            _ => {}
        }
    }
}
