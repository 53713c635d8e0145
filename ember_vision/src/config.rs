// THEORY:
// All tuning knobs for the detection engine live in one plain struct,
// constructed by the caller and validated once before the first frame is
// processed. Defaults carry the values the system was tuned with in the
// field; overriding any of them is a deliberate act. Validation failures are
// `Configuration` errors and fail fast at engine construction, never mid
// stream.

use crate::error::{EngineError, EngineResult};

/// Maximum meaningful hue on the halved 8-bit scale (360 degrees / 2 - 1).
const HUE_MAX: u8 = 179;

/// An inclusive HSV band on the 8-bit OpenCV-style scale: hue in 0..=179,
/// saturation and value in 0..=255. A pixel is inside the band when every
/// channel is within its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBand {
    /// Per-channel lower bounds, (hue, saturation, value).
    pub lower: [u8; 3],
    /// Per-channel upper bounds, (hue, saturation, value).
    pub upper: [u8; 3],
}

impl Default for ColorBand {
    fn default() -> Self {
        // The red-through-orange band of visible flame.
        Self {
            lower: [0, 120, 70],
            upper: [35, 255, 255],
        }
    }
}

/// Configuration for the `FireDetectionEngine`, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// HSV band a pixel must fall into to count as fire-colored.
    pub color_band: ColorBand,
    /// Number of frames contributing to the adaptive background model.
    pub history: usize,
    /// Squared-deviation multiplier above which a pixel is foreground.
    pub var_threshold: f64,
    /// Minimum connected-region pixel area for a frame to count as raw fire
    /// presence.
    pub min_fire_area: usize,
    /// Seconds of uninterrupted raw presence required before a positive
    /// classification is eligible.
    pub min_fire_duration: f64,
    /// Smoothed confidence a frame must reach for a positive classification.
    pub confidence_threshold: f64,
    /// Capacity of the confidence and presence sliding windows, in frames.
    pub smoothing_window: usize,
    /// Fraction of the presence window that must hold raw presence for a
    /// positive classification. A value of 0.7 means 70% of recent frames.
    pub persistence_ratio: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            color_band: ColorBand::default(),
            history: 500,
            var_threshold: 16.0,
            min_fire_area: 500,
            min_fire_duration: 1.0,
            confidence_threshold: 0.6,
            smoothing_window: 10,
            persistence_ratio: 0.7,
        }
    }
}

impl EngineConfig {
    /// Checks every parameter against its legal range.
    pub fn validate(&self) -> EngineResult<()> {
        for channel in 0..3 {
            if self.color_band.lower[channel] > self.color_band.upper[channel] {
                return Err(EngineError::configuration(format!(
                    "color_band channel {channel}: lower bound {} exceeds upper bound {}",
                    self.color_band.lower[channel], self.color_band.upper[channel]
                )));
            }
        }
        if self.color_band.upper[0] > HUE_MAX {
            return Err(EngineError::configuration(format!(
                "color_band hue upper bound {} exceeds the halved 8-bit scale maximum {HUE_MAX}",
                self.color_band.upper[0]
            )));
        }
        if self.history == 0 {
            return Err(EngineError::configuration("history must be at least 1"));
        }
        if !self.var_threshold.is_finite() || self.var_threshold <= 0.0 {
            return Err(EngineError::configuration(format!(
                "var_threshold must be positive, got {}",
                self.var_threshold
            )));
        }
        if self.min_fire_area == 0 {
            return Err(EngineError::configuration(
                "min_fire_area must be at least 1 pixel",
            ));
        }
        if !self.min_fire_duration.is_finite() || self.min_fire_duration < 0.0 {
            return Err(EngineError::configuration(format!(
                "min_fire_duration must not be negative, got {}",
                self.min_fire_duration
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(EngineError::configuration(format!(
                "confidence_threshold must be within 0..=1, got {}",
                self.confidence_threshold
            )));
        }
        if self.smoothing_window == 0 {
            return Err(EngineError::configuration(
                "smoothing_window must hold at least 1 sample",
            ));
        }
        if !(0.0..=1.0).contains(&self.persistence_ratio) {
            return Err(EngineError::configuration(format!(
                "persistence_ratio must be within 0..=1, got {}",
                self.persistence_ratio
            )));
        }
        Ok(())
    }
}
