// Runtime configuration for the monitor, merged from an optional TOML file
// over built-in defaults. Detection parameters are handed to the engine
// unchecked; it validates them itself at startup.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use ember_vision::EngineConfig;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub detection: EngineConfig,
    pub stream: StreamConfig,
    /// Where FIRE and OFF commands go, as `host:port`. `None` runs without
    /// alarm hardware.
    pub actuator_address: Option<String>,
    pub log_path: PathBuf,
    /// How many recent log entries to show again at startup.
    pub replay_limit: usize,
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub source: StreamSource,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Stop after this many frames. `None` streams until interrupted.
    pub frame_limit: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum StreamSource {
    /// A built-in animated scene that ignites after a couple of seconds.
    Synthetic,
    /// A directory of still images, played in filename order.
    Directory(PathBuf),
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            detection: EngineConfig::default(),
            stream: StreamConfig {
                source: StreamSource::Synthetic,
                width: 640,
                height: 480,
                fps: 30.0,
                frame_limit: None,
            },
            actuator_address: None,
            log_path: PathBuf::from("fire_events.csv"),
            replay_limit: 100,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    detection: Option<DetectionSection>,
    stream: Option<StreamSection>,
    actuator: Option<ActuatorSection>,
    log: Option<LogSection>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionSection {
    hue_range: Option<[u8; 2]>,
    saturation_range: Option<[u8; 2]>,
    value_range: Option<[u8; 2]>,
    history: Option<usize>,
    var_threshold: Option<f64>,
    min_fire_area: Option<usize>,
    min_fire_duration: Option<f64>,
    confidence_threshold: Option<f64>,
    smoothing_window: Option<usize>,
    persistence_ratio: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct StreamSection {
    /// `"synthetic"` or a directory path.
    source: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<f64>,
    frame_limit: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ActuatorSection {
    address: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LogSection {
    path: Option<String>,
    replay_limit: Option<usize>,
}

impl MonitorConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let file: MonitorConfigFile = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: MonitorConfigFile) -> Self {
        let defaults = Self::default();

        let detection = {
            let section = file.detection.unwrap_or_default();
            let mut detection = defaults.detection;
            if let Some([lower, upper]) = section.hue_range {
                detection.color_band.lower[0] = lower;
                detection.color_band.upper[0] = upper;
            }
            if let Some([lower, upper]) = section.saturation_range {
                detection.color_band.lower[1] = lower;
                detection.color_band.upper[1] = upper;
            }
            if let Some([lower, upper]) = section.value_range {
                detection.color_band.lower[2] = lower;
                detection.color_band.upper[2] = upper;
            }
            detection.history = section.history.unwrap_or(detection.history);
            detection.var_threshold = section.var_threshold.unwrap_or(detection.var_threshold);
            detection.min_fire_area = section.min_fire_area.unwrap_or(detection.min_fire_area);
            detection.min_fire_duration = section
                .min_fire_duration
                .unwrap_or(detection.min_fire_duration);
            detection.confidence_threshold = section
                .confidence_threshold
                .unwrap_or(detection.confidence_threshold);
            detection.smoothing_window = section
                .smoothing_window
                .unwrap_or(detection.smoothing_window);
            detection.persistence_ratio = section
                .persistence_ratio
                .unwrap_or(detection.persistence_ratio);
            detection
        };

        let stream = {
            let section = file.stream.unwrap_or_default();
            let source = match section.source.as_deref() {
                None | Some("synthetic") => StreamSource::Synthetic,
                Some(path) => StreamSource::Directory(PathBuf::from(path)),
            };
            StreamConfig {
                source,
                width: section.width.unwrap_or(defaults.stream.width),
                height: section.height.unwrap_or(defaults.stream.height),
                fps: section.fps.unwrap_or(defaults.stream.fps),
                frame_limit: section.frame_limit,
            }
        };

        let log = file.log.unwrap_or_default();
        Self {
            detection,
            stream,
            actuator_address: file.actuator.and_then(|a| a.address),
            log_path: log.path.map(PathBuf::from).unwrap_or(defaults.log_path),
            replay_limit: log.replay_limit.unwrap_or(defaults.replay_limit),
        }
    }
}
