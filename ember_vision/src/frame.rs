// THEORY:
// `Frame` and `Mask` are the two dumb data containers the whole pipeline is
// built on. A `Frame` is a tightly packed RGB8 buffer plus the capture
// timestamp the temporal stages reason about; a `Mask` is a byte grid aligned
// to a frame where 255 marks a set pixel and 0 an unset one. Neither type
// carries any analysis logic. Anything that compares pixels across space or
// time lives in the `stages` modules.

use crate::error::{EngineError, EngineResult};

const CHANNELS: usize = 3;

/// A single captured video frame in packed RGB8 layout.
///
/// Timestamps are seconds (wall-clock or monotonic, the source decides) and
/// must be non-decreasing across the frames of one stream. The engine borrows
/// a frame only for the duration of one `process_frame` call and never keeps
/// a reference to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Packed RGB8 pixel data, row-major, `width * height * 3` bytes.
    pub data: Vec<u8>,
    /// Capture time in seconds.
    pub timestamp: f64,
    /// Position of this frame within its stream, starting at 0.
    pub frame_number: u64,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, timestamp: f64, frame_number: u64) -> Self {
        Self {
            width,
            height,
            data,
            timestamp,
            frame_number,
        }
    }

    /// Builds a frame from a decoded [`image::RgbImage`].
    pub fn from_rgb_image(image: &image::RgbImage, timestamp: f64, frame_number: u64) -> Self {
        Self::new(
            image.width(),
            image.height(),
            image.as_raw().clone(),
            timestamp,
            frame_number,
        )
    }

    /// Checks that the buffer length matches the declared geometry.
    pub fn validate(&self) -> EngineResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::invalid_frame(format!(
                "zero dimension ({}x{})",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * CHANNELS;
        if self.data.len() != expected {
            return Err(EngineError::invalid_frame(format!(
                "pixel buffer holds {} bytes, expected {} for {}x{} rgb",
                self.data.len(),
                expected,
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    /// Number of pixels in the frame.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Reads the RGB triple at (x, y). Caller guarantees the coordinates are
    /// in bounds and the frame has been validated.
    #[inline]
    pub fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        (self.data[i], self.data[i + 1], self.data[i + 2])
    }
}

/// A binary pixel grid aligned to a frame's dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    /// Mask width in pixels.
    pub width: u32,
    /// Mask height in pixels.
    pub height: u32,
    /// One byte per pixel, row-major; [`Mask::SET`] or 0.
    pub data: Vec<u8>,
}

impl Mask {
    /// Byte value of a set pixel.
    pub const SET: u8 = 255;

    /// Creates an all-unset mask of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y)] != 0
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32) {
        let i = self.index(x, y);
        self.data[i] = Self::SET;
    }

    /// Number of set pixels.
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}
