//! Thumbnail Source Selection
//!
//! Decides which bytes a slot should render, in order of preference:
//! 1. the server-side `thumbnail.jpeg` attribute,
//! 2. the object data (re-fetched from the factory when it arrived empty),
//! 3. the raw `_rgb_image.rgbimage` pixels with `_cols.int` x `_rows.int` dimensions.
//!
//! Decoding is left to the presentation layer, along with painting any decorations at
//! `decoration_scale`.

use crate::session::search::SearchFactory;
use crate::session::types::SearchResult;

pub const THUMBNAIL_ATTR: &str = "thumbnail.jpeg";
pub const COLS_ATTR: &str = "_cols.int";
pub const ROWS_ATTR: &str = "_rows.int";
pub const RGB_IMAGE_ATTR: &str = "_rgb_image.rgbimage";

/// Bytes per pixel of the raw RGB attribute (R, G, B, padding).
const RGB_STRIDE: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailSource {
    /// Encoded thumbnail produced by the servers. `full_width` is the width of the
    /// original object, when known, so decorations can be scaled.
    Thumbnail {
        bytes: Vec<u8>,
        full_width: Option<i32>,
    },
    /// Encoded object data.
    ObjectData(Vec<u8>),
    /// Uncompressed pixels, `RGB_STRIDE` bytes each, row-major.
    RawRgb {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

impl ThumbnailSource {
    pub fn resolve(result: &SearchResult, factory: Option<&dyn SearchFactory>) -> Option<Self> {
        if let Some(bytes) = result.value(THUMBNAIL_ATTR).filter(|b| !b.is_empty()) {
            return Some(ThumbnailSource::Thumbnail {
                bytes: bytes.to_vec(),
                full_width: result.int_value(COLS_ATTR),
            });
        }

        if !result.data().is_empty() {
            return Some(ThumbnailSource::ObjectData(result.data().to_vec()));
        }

        if let Some(factory) = factory {
            match factory.generate_result(result.object_id(), &[]) {
                Ok(refetched) if !refetched.data().is_empty() => {
                    tracing::debug!("Re-fetched data for {}", result.object_id());
                    return Some(ThumbnailSource::ObjectData(refetched.data().to_vec()));
                }
                Ok(_) => {
                    tracing::debug!("Re-fetch of {} returned no data", result.object_id());
                }
                Err(e) => {
                    tracing::warn!("Failed to re-fetch {}: {}", result.object_id(), e);
                }
            }
        }

        Self::raw_rgb(result)
    }

    fn raw_rgb(result: &SearchResult) -> Option<Self> {
        let pixels = result.value(RGB_IMAGE_ATTR)?;
        let width = u32::try_from(result.int_value(COLS_ATTR)?).ok()?;
        let height = u32::try_from(result.int_value(ROWS_ATTR)?).ok()?;

        if width == 0 || height == 0 {
            return None;
        }

        let needed = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(RGB_STRIDE)?;
        if pixels.len() < needed {
            tracing::warn!(
                "Raw image of {} is {} bytes, expected {} for {}x{}",
                result.object_id(),
                pixels.len(),
                needed,
                width,
                height
            );
            return None;
        }

        Some(ThumbnailSource::RawRgb {
            width,
            height,
            pixels: pixels[..needed].to_vec(),
        })
    }

    /// Color of pixel `(x, y)` as `0xRRGGBB`, for raw sources only.
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<u32> {
        let ThumbnailSource::RawRgb {
            width,
            height,
            pixels,
        } = self
        else {
            return None;
        };

        if x >= *width || y >= *height {
            return None;
        }

        let i = (y as usize * *width as usize + x as usize) * RGB_STRIDE;
        Some(u32::from(pixels[i]) << 16 | u32::from(pixels[i + 1]) << 8 | u32::from(pixels[i + 2]))
    }

    /// Factor mapping full-object coordinates onto the thumbnail as drawn.
    ///
    /// `decoded_width` is the width of the image decoded from this source and `drawn_width`
    /// the width it is painted at. Server thumbnails are scaled against the object's
    /// `_cols.int` width when it is known.
    pub fn decoration_scale(&self, decoded_width: u32, drawn_width: u32) -> f64 {
        let full_width = match self {
            ThumbnailSource::Thumbnail {
                full_width: Some(w),
                ..
            } if *w > 0 => f64::from(*w),
            ThumbnailSource::RawRgb { width, .. } => f64::from(*width),
            _ => f64::from(decoded_width),
        };

        if full_width <= 0.0 {
            return 1.0;
        }
        f64::from(drawn_width) / full_width
    }
}
