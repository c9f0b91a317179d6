//! Result Annotation Module
//!
//! Everything the gatherer derives from a raw result before it is placed in the grid:
//! the annotation texts shown with a slot, overlay decorations, and the choice of image bytes
//! for its thumbnail.
//! All of it runs on the gatherer thread, never in the presentation context.
//!
//! ## Submodules
//! - **`annotator`**: The `Annotator` trait and an attribute-listing implementation.
//! - **`decorator`**: The `Decorator` trait and a region-attribute implementation.
//! - **`thumbnail`**: Picks the thumbnail source with an explicit fallback chain.

pub mod annotator;
pub mod decorator;
pub mod thumbnail;

#[cfg(test)]
mod tests;
