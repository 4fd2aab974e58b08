//! Luminance reduction of an RGBA buffer.

/// Convert interleaved RGBA pixels to 8-bit luminance.
///
/// Uses luminance formula: `0.299*R + 0.587*G + 0.114*B`, summed left to right
/// in `f64` and truncated toward zero.
/// Alpha is ignored. A trailing partial pixel (fewer than 4 bytes) is dropped.
#[must_use]
pub fn to_grayscale(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(4)
        .map(|px| {
            let lum =
                f64::from(px[0]) * 0.299 + f64::from(px[1]) * 0.587 + f64::from(px[2]) * 0.114;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                lum.clamp(0.0, 255.0) as u8
            }
        })
        .collect()
}
