use crate::session::types::ServerStatistics;

use serde::Serialize;
use std::collections::HashMap;

pub const INITIALIZING: &str = "Initializing Search";
pub const WAITING_FOR_RESULTS: &str = "Waiting for First Results";

/// Counters summed over every server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSummary {
    pub total: u64,
    pub searched: u64,
    pub dropped: u64,
}

impl StatisticsSummary {
    pub fn aggregate(servers: &HashMap<String, ServerStatistics>) -> Self {
        servers.values().fold(Self::default(), |acc, s| Self {
            total: acc.total + s.total_objects,
            searched: acc.searched + s.processed_objects,
            dropped: acc.dropped + s.dropped_objects,
        })
    }

    /// Searched fraction in `0.0..=1.0`; zero before any server reports a total.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.searched as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Text of the statistics bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StatusLine {
    /// No numbers yet; shown as an indeterminate progress bar.
    Indeterminate(String),
    Progress(StatisticsSummary),
}

impl StatusLine {
    pub fn initializing() -> Self {
        StatusLine::Indeterminate(INITIALIZING.to_string())
    }

    /// Progress numbers, or the waiting message while every server still reports zero objects.
    pub fn from_statistics(servers: &HashMap<String, ServerStatistics>) -> Self {
        if servers.values().any(|s| s.total_objects != 0) {
            StatusLine::Progress(StatisticsSummary::aggregate(servers))
        } else {
            StatusLine::Indeterminate(WAITING_FOR_RESULTS.to_string())
        }
    }
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusLine::Indeterminate(message) => f.write_str(message),
            StatusLine::Progress(s) => write!(
                f,
                "Total: {}, Searched: {}, Dropped: {}",
                s.total, s.searched, s.dropped
            ),
        }
    }
}
