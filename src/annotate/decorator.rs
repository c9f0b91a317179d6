//! Thumbnail Decorations
//!
//! A decorator marks up a result with overlay geometry (regions, points) in the pixel space
//! of the full object. Nothing is drawn here: the presentation layer scales each decoration
//! with `ThumbnailSource::decoration_scale` and paints it over the thumbnail.

use crate::session::types::SearchResult;

/// Conventional attribute for `RegionDecorator`.
pub const REGIONS_ATTR: &str = "regions";

/// One overlay shape, in full-object pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoration {
    /// Outline of a region, with an optional caption.
    Region {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        label: Option<String>,
    },
    Point { x: f64, y: f64 },
}

impl Decoration {
    /// The same shape with every coordinate multiplied by `scale`.
    pub fn scaled(&self, scale: f64) -> Self {
        match self {
            Decoration::Region {
                x,
                y,
                width,
                height,
                label,
            } => Decoration::Region {
                x: x * scale,
                y: y * scale,
                width: width * scale,
                height: height * scale,
                label: label.clone(),
            },
            Decoration::Point { x, y } => Decoration::Point {
                x: x * scale,
                y: y * scale,
            },
        }
    }
}

/// Produces overlay decorations for results. Runs on the gatherer, before placement.
pub trait Decorator: Send + Sync {
    fn decorate(&self, result: &SearchResult) -> Vec<Decoration>;
}

/// Reads regions from a text attribute holding `x,y,w,h[,label]` groups separated by `;`.
///
/// Malformed groups are skipped.
#[derive(Debug, Clone)]
pub struct RegionDecorator {
    attribute: String,
}

impl RegionDecorator {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }

    fn parse_region(group: &str) -> Option<Decoration> {
        let mut fields = group.split(',').map(str::trim);

        let mut number = || fields.next()?.parse::<f64>().ok().filter(|v| v.is_finite());
        let (x, y, width, height) = (number()?, number()?, number()?, number()?);
        if width < 0.0 || height < 0.0 {
            return None;
        }

        let label = fields
            .next()
            .filter(|label| !label.is_empty())
            .map(str::to_string);

        Some(Decoration::Region {
            x,
            y,
            width,
            height,
            label,
        })
    }
}

impl Decorator for RegionDecorator {
    fn decorate(&self, result: &SearchResult) -> Vec<Decoration> {
        let Some(text) = result.string_value(&self.attribute) else {
            return Vec::new();
        };

        text.split(';')
            .filter(|group| !group.trim().is_empty())
            .filter_map(|group| {
                let region = Self::parse_region(group);
                if region.is_none() {
                    tracing::debug!(
                        "Skipping malformed region {:?} on {}",
                        group,
                        result.object_id()
                    );
                }
                region
            })
            .collect()
    }
}
