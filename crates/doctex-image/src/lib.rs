//! Content-vs-decoration classification for images embedded in a walked
//! document: a metadata gate (stage 1) followed by a pixel-statistics
//! scorer (stage 2) over the `image`/`imageproc` crates.

pub mod classifier;
pub mod context;
pub mod pixel;

pub use classifier::{classify, metadata_gate, Classification};
pub use context::ImageContext;
pub use pixel::PixelStats;
