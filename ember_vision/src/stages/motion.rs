// THEORY:
// Flame flickers. A static orange poster passes the color stage forever, but
// it never moves. This stage learns what every pixel normally looks like and
// flags the ones that currently disagree with their own history, so only
// *changing* regions survive into the fusion step.
//
// Key architectural principles:
// 1.  **Per-pixel adaptive model**: Each pixel carries a running Gaussian
//     (RGB mean plus a shared variance). A pixel is foreground when its
//     squared distance from the mean exceeds `var_threshold` times the
//     learned variance, so the sensitivity scales with local noise.
// 2.  **Bounded memory**: The learning rate is `1 / frames_seen`, with
//     `frames_seen` capped at `history`. Early frames adapt quickly; once
//     warmed up, a stationary object is absorbed into the background over
//     roughly `history` frames and stops registering as motion.
// 3.  **Shadow suppression**: A pixel that is merely a darker copy of its
//     learned color (same chromaticity, 50..95% brightness) scores 127
//     instead of 255. The binary cutoff above 200 then drops shadows from
//     the final mask without a second pass.

use crate::error::{EngineError, EngineResult};
use crate::frame::{Frame, Mask};

const INITIAL_VARIANCE: f32 = 15.0;
const VARIANCE_FLOOR: f32 = 4.0;
const VARIANCE_CEILING: f32 = 75.0;
const FOREGROUND_SCORE: u8 = 255;
const SHADOW_SCORE: u8 = 127;
const BINARY_CUTOFF: u8 = 200;
const SHADOW_RATIO_LOW: f32 = 0.5;
const SHADOW_RATIO_HIGH: f32 = 0.95;

/// Running background statistics for one pixel.
struct PixelGaussian {
    mean: [f32; 3],
    variance: f32,
}

/// Learns a per-pixel background model and masks the pixels that deviate
/// from it.
pub struct MotionModel {
    history: usize,
    var_threshold: f32,
    dims: Option<(u32, u32)>,
    models: Vec<PixelGaussian>,
    frames_seen: usize,
}

impl MotionModel {
    pub fn new(history: usize, var_threshold: f64) -> Self {
        Self {
            history,
            var_threshold: var_threshold as f32,
            dims: None,
            models: Vec::new(),
            frames_seen: 0,
        }
    }

    /// Scores the frame against the learned background, updates the model,
    /// and returns the binary motion mask.
    ///
    /// The first frame seeds the model and comes back fully set, since there
    /// is no background yet to disagree with.
    pub fn apply(&mut self, frame: &Frame) -> EngineResult<Mask> {
        frame.validate()?;

        match self.dims {
            None => Ok(self.seed(frame)),
            Some((width, height)) if (width, height) != (frame.width, frame.height) => {
                Err(EngineError::invalid_frame(format!(
                    "frame size changed from {}x{} to {}x{}",
                    width, height, frame.width, frame.height
                )))
            }
            Some(_) => Ok(self.score_and_update(frame)),
        }
    }

    /// Forgets the learned background entirely. The next frame seeds a fresh
    /// model, exactly as if this instance were newly constructed.
    pub fn reset(&mut self) {
        self.dims = None;
        self.models.clear();
        self.frames_seen = 0;
    }

    fn seed(&mut self, frame: &Frame) -> Mask {
        self.dims = Some((frame.width, frame.height));
        self.models = frame
            .data
            .chunks_exact(3)
            .map(|pixel| PixelGaussian {
                mean: [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32],
                variance: INITIAL_VARIANCE,
            })
            .collect();
        self.frames_seen = 1;

        let mut mask = Mask::new(frame.width, frame.height);
        mask.data.fill(Mask::SET);
        mask
    }

    fn score_and_update(&mut self, frame: &Frame) -> Mask {
        self.frames_seen = (self.frames_seen + 1).min(self.history);
        let alpha = 1.0 / self.frames_seen as f32;

        let mut mask = Mask::new(frame.width, frame.height);
        for (index, pixel) in frame.data.chunks_exact(3).enumerate() {
            let model = &mut self.models[index];
            let px = [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32];

            let delta = [
                px[0] - model.mean[0],
                px[1] - model.mean[1],
                px[2] - model.mean[2],
            ];
            let distance = delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2];
            let threshold = self.var_threshold * model.variance;

            let score = if distance > threshold {
                if is_shadow(&px, &model.mean, threshold) {
                    SHADOW_SCORE
                } else {
                    FOREGROUND_SCORE
                }
            } else {
                0
            };

            model.mean[0] += alpha * delta[0];
            model.mean[1] += alpha * delta[1];
            model.mean[2] += alpha * delta[2];
            model.variance = (model.variance + alpha * (distance - model.variance))
                .clamp(VARIANCE_FLOOR, VARIANCE_CEILING);

            if score > BINARY_CUTOFF {
                mask.data[index] = Mask::SET;
            }
        }
        mask
    }
}

/// A shadow is a uniformly dimmed copy of the background: the pixel projects
/// onto the learned color at 50..95% brightness and the residual off that
/// axis stays within the motion threshold.
fn is_shadow(px: &[f32; 3], mean: &[f32; 3], threshold: f32) -> bool {
    let mean_energy = mean[0] * mean[0] + mean[1] * mean[1] + mean[2] * mean[2];
    if mean_energy < 1e-6 {
        return false;
    }

    let ratio = (px[0] * mean[0] + px[1] * mean[1] + px[2] * mean[2]) / mean_energy;
    if !(SHADOW_RATIO_LOW..=SHADOW_RATIO_HIGH).contains(&ratio) {
        return false;
    }

    let residual = [
        px[0] - ratio * mean[0],
        px[1] - ratio * mean[1],
        px[2] - ratio * mean[2],
    ];
    residual[0] * residual[0] + residual[1] * residual[1] + residual[2] * residual[2] <= threshold
}
