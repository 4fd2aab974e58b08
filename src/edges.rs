//! Sobel gradient magnitude over a grayscale map.
//!
//! Only interior pixels are convolved; the one-pixel border ring has no full
//! 3x3 neighborhood and stays at 0. Magnitudes are clamped to `[0, 255]`.

const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_Y: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Compute one output row of the edge map. `row` must have length `width`.
fn sobel_row(gray: &[u8], width: usize, y: usize, row: &mut [u8]) {
    for x in 1..width - 1 {
        let mut gx = 0_i32;
        let mut gy = 0_i32;
        for (ky, (kernel_x, kernel_y)) in SOBEL_X.iter().zip(SOBEL_Y.iter()).enumerate() {
            let start = (y + ky - 1) * width + x - 1;
            let window = &gray[start..start + 3];
            for ((&v, cx), cy) in window.iter().zip(kernel_x).zip(kernel_y) {
                gx += i32::from(v) * cx;
                gy += i32::from(v) * cy;
            }
        }
        let magnitude = f64::from(gx * gx + gy * gy).sqrt();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            row[x] = magnitude.min(255.0) as u8;
        }
    }
}

/// Compute the Sobel edge map of a `width x height` grayscale buffer.
///
/// Returns a buffer of `width * height` magnitudes. Images narrower or shorter
/// than 3 pixels have no interior and yield an all-zero map.
///
/// # Panics
///
/// Panics if `gray.len() != width * height`.
#[must_use]
pub fn sobel_edges(gray: &[u8], width: usize, height: usize) -> Vec<u8> {
    assert_eq!(gray.len(), width * height, "grayscale map size mismatch");
    let mut edges = vec![0_u8; width * height];
    if width < 3 || height < 3 {
        return edges;
    }

    let interior = &mut edges[width..(height - 1) * width];

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        interior
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| sobel_row(gray, width, i + 1, row));
    }

    #[cfg(not(feature = "parallel"))]
    {
        interior
            .chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| sobel_row(gray, width, i + 1, row));
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_border(i: usize, width: usize, height: usize) -> bool {
        let (x, y) = (i % width, i / width);
        x == 0 || y == 0 || x == width - 1 || y == height - 1
    }

    #[test]
    fn flat_field_has_no_gradient() {
        let gray = vec![128_u8; 10 * 10];
        assert!(sobel_edges(&gray, 10, 10).iter().all(|&g| g == 0));
    }

    #[test]
    fn detects_vertical_edge() {
        let mut gray = vec![0_u8; 10 * 10];
        for y in 0..10 {
            for x in 5..10 {
                gray[y * 10 + x] = 200;
            }
        }
        let edges = sobel_edges(&gray, 10, 10);
        assert_eq!(edges[5 * 10 + 4], 255);
        assert_eq!(edges[5 * 10 + 5], 255);
        assert_eq!(edges[5 * 10 + 2], 0);
        assert_eq!(edges[5 * 10 + 7], 0);
    }

    #[test]
    fn weak_gradient_is_not_clamped() {
        // Column step of 4 gray levels: gx = 4 * (1 + 2 + 1) = 16.
        let mut gray = vec![100_u8; 5 * 5];
        for y in 0..5 {
            for x in 3..5 {
                gray[y * 5 + x] = 104;
            }
        }
        let edges = sobel_edges(&gray, 5, 5);
        assert_eq!(edges[2 * 5 + 2], 16);
        assert_eq!(edges[2 * 5 + 1], 0);
    }

    #[test]
    fn border_ring_is_always_zero() {
        let (w, h) = (7, 6);
        #[allow(clippy::cast_possible_truncation)]
        let gray: Vec<u8> = (0..w * h).map(|i| ((i * 97) % 256) as u8).collect();
        let edges = sobel_edges(&gray, w, h);
        for (i, &e) in edges.iter().enumerate() {
            if is_border(i, w, h) {
                assert_eq!(e, 0, "border pixel {i} must be 0");
            }
        }
    }

    #[test]
    fn tiny_images_yield_zero_map() {
        assert_eq!(sobel_edges(&[7], 1, 1), vec![0]);
        assert_eq!(sobel_edges(&[0, 255, 255, 0], 2, 2), vec![0; 4]);
        assert_eq!(sobel_edges(&[0, 255, 0, 255, 0, 255], 3, 2), vec![0; 6]);
    }
}
