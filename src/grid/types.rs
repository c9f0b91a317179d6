use crate::annotate::annotator::Annotations;
use crate::annotate::decorator::Decoration;
use crate::annotate::thumbnail::ThumbnailSource;
use crate::session::types::{ObjectId, SearchResult};

use std::sync::Arc;

/// What one occupied slot shows.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub result: Arc<SearchResult>,
    pub annotations: Annotations,
    /// Overlays in full-object coordinates.
    pub decorations: Vec<Decoration>,
    /// `None` when no usable image bytes were found.
    pub thumbnail: Option<ThumbnailSource>,
}

impl SlotView {
    pub fn new(result: SearchResult) -> Self {
        Self {
            result: Arc::new(result),
            annotations: Annotations::default(),
            decorations: Vec::new(),
            thumbnail: None,
        }
    }

    pub fn object_id(&self) -> &ObjectId {
        self.result.object_id()
    }

    /// Text shown under the thumbnail, empty when the result has no one-line annotation.
    pub fn label(&self) -> &str {
        self.annotations.one_line.as_deref().unwrap_or_default()
    }
}

/// Outcome of `ResultGrid::place`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Stored at this slot index.
    Placed(usize),
    /// The grid stopped accepting results before a slot became free.
    Cancelled,
}

/// Point-in-time copy of the grid, for callers outside the gatherer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshot {
    pub rows: usize,
    pub cols: usize,
    /// Row-major, `rows * cols` entries.
    pub slots: Vec<Option<ObjectId>>,
    pub next_empty: usize,
    pub selectable: bool,
    /// A producer is parked on the full-gate.
    pub waiting: bool,
}

impl GridSnapshot {
    pub fn occupied(&self) -> Vec<&ObjectId> {
        self.slots.iter().flatten().collect()
    }

    pub fn is_full(&self) -> bool {
        self.next_empty == self.slots.len()
    }

    /// The slots split into display rows.
    pub fn grid_rows(&self) -> impl Iterator<Item = &[Option<ObjectId>]> {
        self.slots.chunks(self.cols.max(1))
    }
}
