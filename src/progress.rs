//! Progress checkpoints emitted at pipeline stage boundaries.
//!
//! Rendering is left to the host: the pipeline only hands each finished
//! [`Stage`] to a [`ProgressSink`], synchronously and in increasing order.

/// A stage boundary at which progress is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Grayscale conversion and Sobel edge detection finished.
    EdgeDetection,
    /// Background sampling and color segmentation finished.
    Segmentation,
    /// Edge and foreground masks fused.
    MaskCombination,
    /// Combined mask written to the alpha channel.
    AlphaMasking,
    /// Density-based edge cleanup finished.
    EdgeRefinement,
    /// The alpha channel is final.
    Completed,
}

impl Stage {
    /// All checkpoints in emission order.
    pub const ALL: [Stage; 6] = [
        Stage::EdgeDetection,
        Stage::Segmentation,
        Stage::MaskCombination,
        Stage::AlphaMasking,
        Stage::EdgeRefinement,
        Stage::Completed,
    ];

    /// Progress percentage reported once this stage is done.
    #[must_use]
    pub const fn percent(self) -> u8 {
        match self {
            Stage::EdgeDetection => 20,
            Stage::Segmentation => 40,
            Stage::MaskCombination => 60,
            Stage::AlphaMasking => 80,
            Stage::EdgeRefinement => 90,
            Stage::Completed => 100,
        }
    }

    /// Human-readable description of the stage.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Stage::EdgeDetection => "Detecting edges",
            Stage::Segmentation => "Segmenting background colors",
            Stage::MaskCombination => "Combining masks",
            Stage::AlphaMasking => "Applying alpha mask",
            Stage::EdgeRefinement => "Refining edges",
            Stage::Completed => "Background removed",
        }
    }
}

/// Receiver of progress checkpoints.
pub trait ProgressSink {
    /// Called once per finished stage.
    fn report(&mut self, stage: Stage);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, stage: Stage) {
        self(stage.percent());
    }
}

/// Sink that discards every checkpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _stage: Stage) {}
}
