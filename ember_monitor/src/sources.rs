// Frame suppliers for the monitor. The synthetic source renders a noisy
// indoor scene that ignites after a couple of seconds, which gives the full
// pipeline something real to chew on with no camera attached. The directory
// source replays captured stills, resized to the configured resolution.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use image::imageops::FilterType;

use ember_vision::error::{EngineError, EngineResult};
use ember_vision::{Frame, VideoSource};

/// Seconds of quiet scene before the synthetic fire appears.
const IGNITION_SECONDS: f64 = 2.0;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Procedurally generated test footage: sensor noise over a dark room, then
/// a flickering flame. Timestamps follow a virtual clock at the configured
/// frame rate, so detection behaves identically at any processing speed.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    fps: f64,
    frame_limit: Option<u64>,
    ignition_frame: u64,
    frame_number: u64,
    rng_state: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, fps: f64, frame_limit: Option<u64>) -> Self {
        Self {
            width,
            height,
            fps,
            frame_limit,
            ignition_frame: (fps * IGNITION_SECONDS) as u64,
            frame_number: 0,
            rng_state: 0x243F_6A88_85A3_08D3,
        }
    }

    fn next_random(&mut self) -> u64 {
        // xorshift64: fast, deterministic, plenty for pixel noise.
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        x
    }

    /// A random byte in `base..base + spread`.
    fn noise(&mut self, base: u8, spread: u8) -> u8 {
        base + (self.next_random() % spread.max(1) as u64) as u8
    }

    fn render(&mut self) -> Frame {
        let (width, height) = (self.width, self.height);
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            let r = self.noise(24, 8);
            let g = self.noise(22, 8);
            let b = self.noise(20, 8);
            data.extend_from_slice(&[r, g, b]);
        }

        if self.frame_number >= self.ignition_frame {
            self.paint_flame(&mut data);
        }

        let timestamp = self.frame_number as f64 / self.fps;
        let frame = Frame::new(width, height, data, timestamp, self.frame_number);
        self.frame_number += 1;
        frame
    }

    /// A flame with a ragged, flickering boundary and strongly varying
    /// color, centered low in the scene.
    fn paint_flame(&mut self, data: &mut [u8]) {
        let center_x = self.width as i64 / 2;
        let center_y = (self.height as f64 * 0.6) as i64;
        let radius = (self.width.min(self.height) / 5) as i64;
        let radius_sq = (radius * radius) as f64;

        for y in (center_y - radius).max(0)..(center_y + radius).min(self.height as i64) {
            for x in (center_x - radius).max(0)..(center_x + radius).min(self.width as i64) {
                let (dx, dy) = (x - center_x, y - center_y);
                let distance_sq = (dx * dx + dy * dy) as f64;
                let edge = 0.55 + 0.55 * (self.next_random() % 1000) as f64 / 1000.0;
                if distance_sq < radius_sq * edge {
                    let index = ((y as u32 * self.width + x as u32) * 3) as usize;
                    data[index] = self.noise(225, 30);
                    data[index + 1] = self.noise(60, 140);
                    data[index + 2] = self.noise(0, 80);
                }
            }
        }
    }
}

impl VideoSource for SyntheticSource {
    fn start(&mut self) -> EngineResult<()> {
        Ok(())
    }

    fn read(&mut self) -> EngineResult<Option<Frame>> {
        if let Some(limit) = self.frame_limit {
            if self.frame_number >= limit {
                return Ok(None);
            }
        }
        Ok(Some(self.render()))
    }

    fn stop(&mut self) {}

    fn describe(&self) -> String {
        format!("synthetic {}x{}", self.width, self.height)
    }
}

/// Plays every image in a directory in filename order, resized to the
/// configured resolution and stamped with the wall clock.
pub struct ImageDirSource {
    directory: PathBuf,
    width: u32,
    height: u32,
    files: Vec<PathBuf>,
    cursor: usize,
    frame_number: u64,
}

impl ImageDirSource {
    pub fn new(directory: PathBuf, width: u32, height: u32) -> Self {
        Self {
            directory,
            width,
            height,
            files: Vec::new(),
            cursor: 0,
            frame_number: 0,
        }
    }
}

impl VideoSource for ImageDirSource {
    fn start(&mut self) -> EngineResult<()> {
        let entries = std::fs::read_dir(&self.directory).map_err(|error| {
            EngineError::source(format!("opening {}: {error}", self.directory.display()))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(EngineError::source(format!(
                "no image files in {}",
                self.directory.display()
            )));
        }
        self.files = files;
        self.cursor = 0;
        Ok(())
    }

    fn read(&mut self) -> EngineResult<Option<Frame>> {
        while let Some(path) = self.files.get(self.cursor) {
            self.cursor += 1;
            match image::open(path) {
                Ok(decoded) => {
                    let rgb = decoded
                        .resize_exact(self.width, self.height, FilterType::Triangle)
                        .to_rgb8();
                    let timestamp = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map(|elapsed| elapsed.as_secs_f64())
                        .unwrap_or(0.0);
                    let frame = Frame::from_rgb_image(&rgb, timestamp, self.frame_number);
                    self.frame_number += 1;
                    return Ok(Some(frame));
                }
                Err(error) => {
                    tracing::warn!(%error, path = %path.display(), "skipping unreadable image");
                }
            }
        }
        Ok(None)
    }

    fn stop(&mut self) {
        self.files.clear();
        self.cursor = 0;
    }

    fn describe(&self) -> String {
        format!("frames:{}", self.directory.display())
    }
}
