//! Mask fusion, alpha application and density-based edge cleanup.

use crate::segmentation::{BACKGROUND, FOREGROUND};

/// Fuse the edge map and the foreground mask with a logical OR.
///
/// A pixel is kept when its edge magnitude is strictly above `edge_threshold`
/// or the foreground mask marks it as foreground.
///
/// # Panics
///
/// Panics if the two maps differ in length.
#[must_use]
pub fn combine_masks(edges: &[u8], foreground: &[u8], edge_threshold: u8) -> Vec<u8> {
    assert_eq!(edges.len(), foreground.len(), "mask size mismatch");
    edges
        .iter()
        .zip(foreground)
        .map(|(&edge, &fg)| {
            if edge > edge_threshold || fg == FOREGROUND {
                FOREGROUND
            } else {
                BACKGROUND
            }
        })
        .collect()
}

/// Write `mask` into the alpha channel of an RGBA buffer. RGB is left untouched.
///
/// # Panics
///
/// Panics if `mask` does not hold exactly one value per pixel.
pub fn apply_alpha(pixels: &mut [u8], mask: &[u8]) {
    assert_eq!(pixels.len(), mask.len() * 4, "mask size mismatch");
    for (px, &m) in pixels.chunks_exact_mut(4).zip(mask) {
        px[3] = m;
    }
}

/// Side length `2r+1` of the refinement window, or `None` if it overflows.
#[must_use]
pub fn window_span(radius: usize) -> Option<usize> {
    radius.checked_mul(2)?.checked_add(1)
}

fn refine_row(
    alpha: &[u8],
    width: usize,
    y: usize,
    radius: usize,
    min_count: f64,
    out_row: &mut [u8],
) {
    for x in radius..width - radius {
        if alpha[y * width + x] == 0 {
            continue;
        }
        let count: usize = (y - radius..=y + radius)
            .map(|ny| {
                let start = ny * width + x - radius;
                alpha[start..=start + 2 * radius]
                    .iter()
                    .filter(|&&a| a > 0)
                    .count()
            })
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let count = count as f64;
        if count < min_count {
            out_row[x] = 0;
        }
    }
}

/// Erode thin or isolated opaque regions by neighborhood density.
///
/// For every pixel with alpha > 0 lying at least `radius` away from each
/// border, the opaque pixels in its `(2r+1)^2` window (self included) are
/// counted against the alpha snapshot taken before the pass. If the count is
/// below `(2r+1)^2 * density` the pixel becomes fully transparent.
/// Pixels closer than `radius` to a border are never modified, and no pixel
/// ever gains opacity.
///
/// # Panics
///
/// Panics if `pixels.len() != width * height * 4`.
pub fn refine_edges(pixels: &mut [u8], width: usize, height: usize, radius: usize, density: f32) {
    assert_eq!(pixels.len(), width * height * 4, "pixel buffer size mismatch");
    let Some(span) = window_span(radius) else {
        return;
    };
    if width < span || height < span {
        return;
    }

    let alpha: Vec<u8> = pixels.chunks_exact(4).map(|px| px[3]).collect();
    let mut refined = alpha.clone();
    #[allow(clippy::cast_precision_loss)]
    let min_count = (span * span) as f64 * f64::from(density);

    let rows = &mut refined[radius * width..(height - radius) * width];

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        rows.par_chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| refine_row(&alpha, width, i + radius, radius, min_count, row));
    }

    #[cfg(not(feature = "parallel"))]
    {
        rows.chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| refine_row(&alpha, width, i + radius, radius, min_count, row));
    }

    for (px, &a) in pixels.chunks_exact_mut(4).zip(&refined) {
        px[3] = a;
    }
}
