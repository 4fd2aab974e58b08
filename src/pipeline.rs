//! Core background removal pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::{ImageBuffer, ImageFormat, RgbaImage};
use tracing::{debug, info, warn};

use crate::edges;
use crate::error::{Error, Result};
use crate::grayscale;
use crate::mask;
use crate::progress::{NoProgress, ProgressSink, Stage};
use crate::segmentation;

/// Default RGB distance below which a pixel matches a background sample.
pub const DEFAULT_COLOR_THRESHOLD: f32 = 30.0;
/// Default edge magnitude above which a pixel is kept.
pub const DEFAULT_EDGE_THRESHOLD: u8 = 30;
/// Default half-width of the edge refinement window.
pub const DEFAULT_REFINE_RADIUS: usize = 2;
/// Default opaque-neighbor ratio required to survive edge refinement.
pub const DEFAULT_REFINE_DENSITY: f32 = 0.7;
/// Largest input file accepted by [`BackgroundRemover::process_file`] (5 MiB).
pub const MAX_INPUT_BYTES: u64 = 5 * 1024 * 1024;

/// Options controlling background removal.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalOptions {
    /// RGB distance below which a pixel is treated as background.
    pub color_threshold: f32,
    /// Sobel magnitude above which a pixel is always kept.
    pub edge_threshold: u8,
    /// Half-width of the square window used by edge refinement.
    pub refine_radius: usize,
    /// Minimum opaque ratio in the refinement window (0.0 disables erosion).
    pub refine_density: f32,
}

impl Default for RemovalOptions {
    fn default() -> Self {
        Self {
            color_threshold: DEFAULT_COLOR_THRESHOLD,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            refine_radius: DEFAULT_REFINE_RADIUS,
            refine_density: DEFAULT_REFINE_DENSITY,
        }
    }
}

impl RemovalOptions {
    /// Check that every option is within range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] for a negative or non-finite color
    /// threshold, a refinement radius whose window area overflows, or a
    /// refinement density outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !self.color_threshold.is_finite() || self.color_threshold < 0.0 {
            return Err(Error::InvalidOption {
                name: "color_threshold",
                reason: format!("must be a non-negative number, got {}", self.color_threshold),
            });
        }
        if mask::window_span(self.refine_radius)
            .and_then(|span| span.checked_mul(span))
            .is_none()
        {
            return Err(Error::InvalidOption {
                name: "refine_radius",
                reason: format!("window for radius {} overflows", self.refine_radius),
            });
        }
        if !(0.0..=1.0).contains(&self.refine_density) {
            return Err(Error::InvalidOption {
                name: "refine_density",
                reason: format!("must be within [0, 1], got {}", self.refine_density),
            });
        }
        Ok(())
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Share of pixels left opaque, in `[0, 1]`.
    pub opaque_ratio: f32,
    /// Human-readable status message.
    pub message: String,
}

/// Check that a buffer holds exactly `width * height` RGBA pixels.
fn check_buffer(len: usize, width: u32, height: u32) -> Result<(usize, usize)> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    let (w, h) = (width as usize, height as usize);
    let expected = w
        .checked_mul(h)
        .and_then(|n| n.checked_mul(4))
        .ok_or(Error::InvalidDimensions { width, height })?;
    if len != expected {
        return Err(Error::BufferSizeMismatch {
            width,
            height,
            expected,
            actual: len,
        });
    }
    Ok((w, h))
}

fn checkpoint(sink: &mut dyn ProgressSink, stage: Stage, started: Instant) {
    debug!(
        stage = ?stage,
        percent = stage.percent(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "{}",
        stage.description()
    );
    sink.report(stage);
}

/// The background remover.
///
/// Holds validated [`RemovalOptions`]; create once and reuse for many images.
#[derive(Debug, Clone, Default)]
pub struct BackgroundRemover {
    options: RemovalOptions,
}

impl BackgroundRemover {
    /// Create a remover with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] if the options fail validation.
    pub fn new(options: RemovalOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Options in use.
    #[must_use]
    pub fn options(&self) -> &RemovalOptions {
        &self.options
    }

    /// Remove the background of a raw RGBA8 buffer in place.
    ///
    /// Runs grayscale conversion, edge detection, background sampling, color
    /// segmentation, mask fusion, alpha masking and edge refinement in order.
    /// Only the alpha channel is rewritten. `sink` receives 20, 40, 60, 80, 90
    /// and 100 as the stages finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] or [`Error::BufferSizeMismatch`]
    /// before any stage runs; the buffer is then left untouched.
    #[tracing::instrument(level = "debug", skip_all, fields(width = width, height = height))]
    pub fn remove_pixels(
        &self,
        pixels: &mut [u8],
        width: u32,
        height: u32,
        sink: &mut dyn ProgressSink,
    ) -> Result<()> {
        let (w, h) = check_buffer(pixels.len(), width, height)?;
        let started = Instant::now();
        let opts = &self.options;

        let gray = grayscale::to_grayscale(pixels);
        let edge_map = edges::sobel_edges(&gray, w, h);
        drop(gray);
        checkpoint(sink, Stage::EdgeDetection, started);

        let samples = segmentation::sample_background(pixels, w, h);
        let foreground = segmentation::segment_foreground(pixels, &samples, opts.color_threshold);
        checkpoint(sink, Stage::Segmentation, started);

        let combined = mask::combine_masks(&edge_map, &foreground, opts.edge_threshold);
        checkpoint(sink, Stage::MaskCombination, started);

        mask::apply_alpha(pixels, &combined);
        checkpoint(sink, Stage::AlphaMasking, started);

        mask::refine_edges(pixels, w, h, opts.refine_radius, opts.refine_density);
        checkpoint(sink, Stage::EdgeRefinement, started);

        checkpoint(sink, Stage::Completed, started);
        Ok(())
    }

    /// Remove the background of an RGBA image in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for an empty image.
    pub fn remove(&self, image: &mut RgbaImage, sink: &mut dyn ProgressSink) -> Result<()> {
        let (width, height) = image.dimensions();
        self.remove_pixels(image, width, height, sink)
    }

    fn run_file(&self, input: &Path, output: &Path, sink: &mut dyn ProgressSink) -> Result<f32> {
        let size = std::fs::metadata(input)?.len();
        if size > MAX_INPUT_BYTES {
            return Err(Error::FileTooLarge {
                size,
                limit: MAX_INPUT_BYTES,
            });
        }

        let mut rgba = image::open(input).map_err(Error::Decode)?.to_rgba8();
        self.remove(&mut rgba, sink)?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        save_image(&rgba, output)?;
        Ok(opaque_ratio(&rgba))
    }

    /// Process a single image file: load, remove background, save.
    ///
    /// `sink` receives the pipeline checkpoints once the image is decoded.
    /// Returns a [`ProcessResult`] indicating success or failure.
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        sink: &mut dyn ProgressSink,
    ) -> ProcessResult {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            success: false,
            opaque_ratio: 0.0,
            message: String::new(),
        };

        match self.run_file(input, output, sink) {
            Ok(ratio) => {
                info!(input = %input.display(), output = %output.display(), ratio, "background removed");
                result.success = true;
                result.opaque_ratio = ratio;
                result.message = format!("Background removed ({:.0}% kept)", ratio * 100.0);
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "processing failed");
                result.message = e.to_string();
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Files run in parallel when the `parallel` feature is enabled (via rayon).
    /// Each output is written to `output_dir` as `{stem}_nobg.png`, or as
    /// `{stem}_{ext}_nobg.png` when several inputs share a stem. Inputs whose
    /// output name would still clash fail without being processed.
    #[must_use]
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Vec<ProcessResult> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult {
                    path: input_dir.to_path_buf(),
                    success: false,
                    opaque_ratio: 0.0,
                    message: format!("Failed to read directory: {e}"),
                }];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult {
                    path: output_dir.to_path_buf(),
                    success: false,
                    opaque_ratio: 0.0,
                    message: format!("Failed to create output directory: {e}"),
                }];
            }
        }

        debug!(count = entries.len(), dir = %input_dir.display(), "processing directory");
        let outputs = plan_outputs(&entries, output_dir);
        let run = |(input, output): (&PathBuf, &Option<PathBuf>)| match output {
            Some(output) => self.process_file(input, output, &mut NoProgress),
            None => ProcessResult {
                path: input.clone(),
                success: false,
                opaque_ratio: 0.0,
                message: "Output name collides with another input".to_string(),
            },
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            entries.par_iter().zip(outputs.par_iter()).map(run).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            entries.iter().zip(outputs.iter()).map(run).collect()
        }
    }
}

/// Share of pixels with non-zero alpha.
#[must_use]
pub fn opaque_ratio(image: &RgbaImage) -> f32 {
    let total = image.width() as usize * image.height() as usize;
    if total == 0 {
        return 0.0;
    }
    let opaque = image.pixels().filter(|px| px[3] > 0).count();
    #[allow(clippy::cast_precision_loss)]
    {
        opaque as f32 / total as f32
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp" | "tif" | "tiff"
        ),
        None => false,
    }
}

/// Save an RGBA image to a format that keeps the alpha channel.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] unless the extension is PNG, WebP or
/// TIFF, or an error if writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Tiff => {
            img.save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!(
                "{format:?} (output needs an alpha channel)"
            )));
        }
    }

    Ok(())
}

/// Save a raw RGBA8 buffer as an image.
///
/// # Errors
///
/// Returns [`Error::Surface`] if the buffer cannot back a `width x height`
/// image, otherwise the errors of [`save_image`].
pub fn save_pixels(pixels: &[u8], width: u32, height: u32, path: &Path) -> Result<()> {
    let img: RgbaImage = ImageBuffer::from_raw(width, height, pixels.to_vec()).ok_or_else(|| {
        Error::Surface(format!(
            "{} bytes cannot back a {width}x{height} RGBA image",
            pixels.len()
        ))
    })?;
    save_image(&img, path)
}

fn output_file_name(input: &Path) -> String {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    format!("{stem}_nobg.png")
}

/// Output path per input; `None` marks a name that clashes even after
/// adding the extension. Names compare case-insensitively.
fn plan_outputs(inputs: &[PathBuf], output_dir: &Path) -> Vec<Option<PathBuf>> {
    let stem_key = |p: &Path| p.file_stem().unwrap_or_default().to_string_lossy().to_lowercase();

    let mut stems: HashMap<String, usize> = HashMap::new();
    for input in inputs {
        *stems.entry(stem_key(input)).or_default() += 1;
    }

    let names: Vec<String> = inputs
        .iter()
        .map(|input| {
            if stems.get(&stem_key(input)).copied().unwrap_or(0) > 1 {
                let stem = input.file_stem().unwrap_or_default().to_string_lossy();
                let ext = input.extension().unwrap_or_default().to_string_lossy();
                format!("{stem}_{ext}_nobg.png")
            } else {
                output_file_name(input)
            }
        })
        .collect();

    let mut taken: HashMap<String, usize> = HashMap::new();
    for name in &names {
        *taken.entry(name.to_lowercase()).or_default() += 1;
    }

    names
        .into_iter()
        .map(|name| {
            if taken.get(&name.to_lowercase()).copied().unwrap_or(0) > 1 {
                warn!(name = %name, "output name collision");
                None
            } else {
                Some(output_dir.join(name))
            }
        })
        .collect()
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_nobg.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(output_file_name(input))
}
