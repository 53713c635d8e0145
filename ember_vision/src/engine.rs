// THEORY:
// The `engine` module is the top-level API for per-frame fire detection. It
// encapsulates the full analysis stack into a single, easy-to-use interface:
// frames go in, a verdict with supporting evidence comes out. All detection
// state (the learned background, the sliding windows, the duration timer)
// lives behind this facade, so callers only ever hold one object.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::frame::Frame;
use crate::stages::color::ColorSegmenter;
use crate::stages::motion::MotionModel;
use crate::stages::regions;
use crate::stages::temporal::TemporalFilter;

// Re-export the region type for the public API.
pub use crate::stages::regions::Region;

/// The primary output of the engine for a single frame.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// The final verdict: every gate in the pipeline agreed.
    pub fire_present: bool,
    /// Window-averaged confidence, in `0.0..=1.0`.
    pub smoothed_confidence: f64,
    /// The candidate fire regions found in this frame, in scan order.
    /// Empty exactly when no region cleared the per-frame filters.
    pub regions: Vec<Region>,
}

/// The main, top-level struct for the fire detection engine.
pub struct FireDetectionEngine {
    config: EngineConfig,
    segmenter: ColorSegmenter,
    motion: MotionModel,
    temporal: TemporalFilter,
}

impl FireDetectionEngine {
    /// Builds an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            segmenter: ColorSegmenter::new(config.color_band),
            motion: MotionModel::new(config.history, config.var_threshold),
            temporal: TemporalFilter::new(config.smoothing_window, config.min_fire_duration),
            config,
        })
    }

    /// Runs one frame through every stage and returns the verdict.
    ///
    /// Frames must arrive in capture order with monotonically increasing
    /// timestamps; the duration gate is measured against them.
    pub fn process_frame(&mut self, frame: &Frame) -> EngineResult<DetectionResult> {
        frame.validate()?;

        // Stage 1: Color Segmentation
        let color_mask = self.segmenter.segment(frame)?;

        // Stage 2: Motion Modeling
        let motion_mask = self.motion.apply(frame)?;

        // Stage 3: Spatial Grouping
        let (regions, total_area) =
            regions::extract(&color_mask, &motion_mask, self.config.min_fire_area);

        // Stage 4: Temporal Judgment
        let summary =
            self.temporal
                .update(total_area, self.config.min_fire_area, frame.timestamp);

        // Stage 5: Final Gate
        let fire_present = summary.raw_present
            && summary.temporally_consistent
            && summary.persistence >= self.config.persistence_ratio
            && summary.smoothed_confidence >= self.config.confidence_threshold;

        tracing::debug!(
            frame = frame.frame_number,
            regions = regions.len(),
            total_area,
            raw_confidence = summary.raw_confidence,
            smoothed_confidence = summary.smoothed_confidence,
            persistence = summary.persistence,
            consistent = summary.temporally_consistent,
            fire = fire_present,
            "frame scored"
        );

        Ok(DetectionResult {
            fire_present,
            smoothed_confidence: summary.smoothed_confidence,
            regions,
        })
    }

    /// Returns the engine to its just-constructed state: the background
    /// model, the sliding windows, and the duration timer are all cleared.
    pub fn reset(&mut self) {
        self.motion.reset();
        self.temporal.reset();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
