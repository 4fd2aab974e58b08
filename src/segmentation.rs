//! Background color sampling and distance-based foreground segmentation.
//!
//! The background is assumed to occupy the four corners and the four edge
//! midpoints of the image. Any pixel whose color lies close to one of those
//! eight samples is classified as background.

/// Number of background samples taken from every image.
pub const SAMPLE_COUNT: usize = 8;

/// Mask value for pixels that are kept.
pub const FOREGROUND: u8 = 255;
/// Mask value for pixels that are dropped.
pub const BACKGROUND: u8 = 0;

/// An RGB color taken from one of the canonical sample positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorSample {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl ColorSample {
    /// Create a sample from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean RGB distance to `px` (the first three bytes are used).
    #[must_use]
    pub fn distance_sq(&self, px: &[u8]) -> u32 {
        let dr = i32::from(px[0]) - i32::from(self.r);
        let dg = i32::from(px[1]) - i32::from(self.g);
        let db = i32::from(px[2]) - i32::from(self.b);
        dr.unsigned_abs().pow(2) + dg.unsigned_abs().pow(2) + db.unsigned_abs().pow(2)
    }
}

/// Sample coordinates `(x, y)` for a `width x height` image.
///
/// Order is fixed: top-left, top-right, bottom-left, bottom-right corners,
/// then the top, bottom, left and right edge midpoints. Small images yield
/// duplicate coordinates.
#[must_use]
pub fn sample_positions(width: usize, height: usize) -> [(usize, usize); SAMPLE_COUNT] {
    let right = width.saturating_sub(1);
    let bottom = height.saturating_sub(1);
    let mid_x = width / 2;
    let mid_y = height / 2;
    [
        (0, 0),
        (right, 0),
        (0, bottom),
        (right, bottom),
        (mid_x, 0),
        (mid_x, bottom),
        (0, mid_y),
        (right, mid_y),
    ]
}

/// Read the eight background samples from an RGBA buffer.
///
/// # Panics
///
/// Panics if the buffer is smaller than `width * height * 4` or the image is empty.
#[must_use]
pub fn sample_background(pixels: &[u8], width: usize, height: usize) -> [ColorSample; SAMPLE_COUNT] {
    sample_positions(width, height).map(|(x, y)| {
        let idx = (y * width + x) * 4;
        ColorSample::new(pixels[idx], pixels[idx + 1], pixels[idx + 2])
    })
}

/// Smallest squared distance that is not strictly below `threshold`.
///
/// Squared RGB distances are integers, so `d < t^2` holds exactly when
/// `d < ceil(t^2)`.
#[must_use]
pub fn squared_bound(threshold: f32) -> u32 {
    let t = f64::from(threshold.max(0.0));
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (t * t).ceil().min(f64::from(u32::MAX)) as u32
    }
}

fn classify(px: &[u8], samples: &[ColorSample], bound: u32) -> u8 {
    if samples.iter().any(|s| s.distance_sq(px) < bound) {
        BACKGROUND
    } else {
        FOREGROUND
    }
}

/// Build a binary foreground mask by color distance to the background samples.
///
/// A pixel is background (0) when its RGB distance to any sample is strictly
/// below `threshold`; otherwise it is foreground (255). Returns one value per pixel.
#[must_use]
pub fn segment_foreground(pixels: &[u8], samples: &[ColorSample], threshold: f32) -> Vec<u8> {
    let bound = squared_bound(threshold);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        pixels
            .par_chunks_exact(4)
            .map(|px| classify(px, samples, bound))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        pixels
            .chunks_exact(4)
            .map(|px| classify(px, samples, bound))
            .collect()
    }
}
