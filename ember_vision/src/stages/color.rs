// THEORY:
// Color is the cheapest cue for flame. Fire occupies a narrow band of the HSV
// cylinder: hues from red through orange, strong saturation, and high value.
// Scanning every pixel against that band produces a binary mask of "fire
// colored" regions in a single pass over the frame.
//
// Key architectural principles:
// 1.  **Stateless**: The segmenter holds only its configured band. Two calls
//     with the same frame always produce the same mask, which keeps this stage
//     trivially testable and safe to reuse after an engine reset.
// 2.  **Inclusive band test**: A pixel belongs to the mask when every HSV
//     channel lies within `[lower, upper]`, boundaries included. Hue is stored
//     on the half-degree scale (0..=179) so the whole triplet fits in `u8`s.
// 3.  **Deliberately permissive**: Headlights, sunsets, and orange clothing all
//     pass this stage. Later stages carry the burden of rejecting them; this
//     one only has to never miss real flame.

use crate::config::ColorBand;
use crate::error::EngineResult;
use crate::frame::{Frame, Mask};

/// Marks every pixel whose HSV value falls inside a configured color band.
pub struct ColorSegmenter {
    band: ColorBand,
}

impl ColorSegmenter {
    pub fn new(band: ColorBand) -> Self {
        Self { band }
    }

    /// Produces a binary mask of the frame's fire-colored pixels.
    pub fn segment(&self, frame: &Frame) -> EngineResult<Mask> {
        frame.validate()?;

        let mut mask = Mask::new(frame.width, frame.height);
        for (index, pixel) in frame.data.chunks_exact(3).enumerate() {
            let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
            if self.contains(h, s, v) {
                mask.data[index] = Mask::SET;
            }
        }
        Ok(mask)
    }

    fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        let lower = &self.band.lower;
        let upper = &self.band.upper;
        h >= lower[0]
            && h <= upper[0]
            && s >= lower[1]
            && s <= upper[1]
            && v >= lower[2]
            && v <= upper[2]
    }
}

/// Converts an RGB triplet to HSV with hue on the half-degree scale (0..=179)
/// and saturation and value on 0..=255.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let value = r.max(g).max(b);
    let chroma = value - r.min(g).min(b);

    let saturation = if value == 0 {
        0
    } else {
        (255.0 * chroma as f64 / value as f64).round() as u8
    };

    if chroma == 0 {
        return (0, saturation, value);
    }

    let max_is_red = value == r;
    let max_is_green = value == g;
    let (r, g, b, chroma) = (r as f64, g as f64, b as f64, chroma as f64);

    // Sector math: each branch maps its 60 degree slice of the hue wheel,
    // checked red first so ties resolve toward the red sector.
    let mut degrees = if max_is_red {
        60.0 * (g - b) / chroma
    } else if max_is_green {
        60.0 * ((b - r) / chroma + 2.0)
    } else {
        60.0 * ((r - g) / chroma + 4.0)
    };
    if degrees < 0.0 {
        degrees += 360.0;
    }

    let hue = (degrees * 0.5).round().min(179.0) as u8;
    (hue, saturation, value)
}
