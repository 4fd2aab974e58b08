//! Training-free background removal for RGBA images.
//!
//! The background is estimated from eight border samples (four corners and
//! four edge midpoints). Pixels close in color to any sample are dropped,
//! except where a strong Sobel edge marks an object outline. A final
//! density filter erodes thin or isolated opaque specks. Only the alpha
//! channel of the input is rewritten.
//!
//! # Quick Start
//!
//! ```no_run
//! use classic_bg_removal::{BackgroundRemover, NoProgress};
//!
//! let remover = BackgroundRemover::default();
//! let mut img = image::open("photo.jpg").unwrap().to_rgba8();
//! remover.remove(&mut img, &mut NoProgress).unwrap();
//! img.save("photo_nobg.png").unwrap();
//! ```
//!
//! # Progress
//!
//! Any `FnMut(u8)` closure receives the checkpoints 20, 40, 60, 80, 90 and 100
//! as the stages finish.
//!
//! ```
//! use classic_bg_removal::BackgroundRemover;
//!
//! let remover = BackgroundRemover::default();
//! let mut pixels = vec![255_u8; 4 * 4 * 4];
//! let mut seen = Vec::new();
//! remover
//!     .remove_pixels(&mut pixels, 4, 4, &mut |p: u8| seen.push(p))
//!     .unwrap();
//! assert_eq!(seen, [20, 40, 60, 80, 90, 100]);
//! ```

#![deny(missing_docs)]

pub mod edges;
pub mod error;
pub mod grayscale;
pub mod mask;
mod pipeline;
pub mod progress;
pub mod segmentation;

pub use error::{Error, Result};
pub use pipeline::{
    default_output_path, is_supported_image, opaque_ratio, save_image, save_pixels,
    BackgroundRemover, ProcessResult, RemovalOptions, DEFAULT_COLOR_THRESHOLD,
    DEFAULT_EDGE_THRESHOLD, DEFAULT_REFINE_DENSITY, DEFAULT_REFINE_RADIUS, MAX_INPUT_BYTES,
};
pub use progress::{NoProgress, ProgressSink, Stage};
pub use segmentation::ColorSample;
