#![allow(dead_code)]

// Shared scaffolding for the integration suites: deterministic scenes with a
// known flame geometry, a scripted video source, and sinks that record every
// call they receive.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ember_vision::error::{EngineError, EngineResult, SinkError, SinkResult};
use ember_vision::{DetectionResult, DisplaySink, EventLog, Frame, LogEntry, NotificationSink, VideoSource};

pub const CANVAS_WIDTH: u32 = 120;
pub const CANVAS_HEIGHT: u32 = 60;

/// Left and right flame positions, far enough apart that the regions never
/// touch. Alternating between them keeps the flame moving forever.
pub const LEFT: u32 = 5;
pub const RIGHT: u32 = 60;

/// The test flame is a plus shape, 50 pixels across with 20 pixel arms:
/// 1600 pixels of area against a 2050 pixel convex hull.
pub const FLAME_AREA: usize = 1600;

const BACKGROUND: [u8; 3] = [25, 25, 25];
const FLAME: [u8; 3] = [255, 120, 40];

pub fn empty_frame(timestamp: f64, number: u64) -> Frame {
    let mut data = Vec::with_capacity((CANVAS_WIDTH * CANVAS_HEIGHT * 3) as usize);
    for _ in 0..CANVAS_WIDTH * CANVAS_HEIGHT {
        data.extend_from_slice(&BACKGROUND);
    }
    Frame::new(CANVAS_WIDTH, CANVAS_HEIGHT, data, timestamp, number)
}

/// A background frame with the plus-shaped flame at `origin_x`.
pub fn fire_frame(origin_x: u32, timestamp: f64, number: u64) -> Frame {
    let mut frame = empty_frame(timestamp, number);
    let mut paint = |x: u32, y: u32| {
        let index = ((y * CANVAS_WIDTH + x) * 3) as usize;
        frame.data[index..index + 3].copy_from_slice(&FLAME);
    };
    for y in 5..55 {
        for x in origin_x + 15..origin_x + 35 {
            paint(x, y);
        }
    }
    for y in 20..40 {
        for x in origin_x..origin_x + 50 {
            paint(x, y);
        }
    }
    frame
}

/// Flame frames alternating between the two positions, left first.
pub fn ping_pong_fire(count: usize) -> Vec<Frame> {
    (0..count)
        .map(|n| {
            let origin = if n % 2 == 0 { LEFT } else { RIGHT };
            fire_frame(origin, 0.0, 0)
        })
        .collect()
}

/// Plays a fixed list of frame templates, restamping each with a virtual
/// clock that advances `tick` seconds per frame. Optionally loops back to a
/// template index instead of ending, for streams that must outlive the test
/// logic driving them.
pub struct ScriptedSource {
    frames: Vec<Frame>,
    cursor: usize,
    loop_from: Option<usize>,
    tick: f64,
    clock: f64,
    number: u64,
    fail_start: bool,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            cursor: 0,
            loop_from: None,
            tick: 0.1,
            clock: 0.0,
            number: 0,
            fail_start: false,
        }
    }

    /// Once the templates run out, continue from `index` forever.
    pub fn with_loop(mut self, index: usize) -> Self {
        self.loop_from = Some(index);
        self
    }

    pub fn with_tick(mut self, tick: f64) -> Self {
        self.tick = tick;
        self
    }

    /// A source whose `start` always fails.
    pub fn failing() -> Self {
        let mut source = Self::new(Vec::new());
        source.fail_start = true;
        source
    }
}

impl VideoSource for ScriptedSource {
    fn start(&mut self) -> EngineResult<()> {
        if self.fail_start {
            return Err(EngineError::source("scripted start failure"));
        }
        Ok(())
    }

    fn read(&mut self) -> EngineResult<Option<Frame>> {
        if self.cursor >= self.frames.len() {
            match self.loop_from {
                Some(index) => self.cursor = index,
                None => return Ok(None),
            }
        }

        let mut frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        self.clock += self.tick;
        self.number += 1;
        frame.timestamp = self.clock;
        frame.frame_number = self.number;
        Ok(Some(frame))
    }

    fn stop(&mut self) {}

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// One sink wearing every hat, recording calls for later assertions.
#[derive(Default)]
pub struct RecordingSinks {
    events: Mutex<Vec<String>>,
    notifications: Mutex<Vec<String>>,
    banners: Mutex<Vec<String>>,
    frames_shown: AtomicUsize,
}

impl RecordingSinks {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn banners(&self) -> Vec<String> {
        self.banners.lock().unwrap().clone()
    }

    pub fn frames_shown(&self) -> usize {
        self.frames_shown.load(Ordering::SeqCst)
    }
}

impl NotificationSink for RecordingSinks {
    fn send_fire_alert(&self, confidence: f64, _timestamp: f64) -> SinkResult {
        self.notifications
            .lock()
            .unwrap()
            .push(format!("FIRE {confidence:.2}"));
        Ok(())
    }

    fn deactivate(&self) -> SinkResult {
        self.notifications.lock().unwrap().push("OFF".to_string());
        Ok(())
    }
}

impl DisplaySink for RecordingSinks {
    fn display_log(&self, _entry: &LogEntry) -> SinkResult {
        Ok(())
    }

    fn fire_detected(&self, _confidence: f64) -> SinkResult {
        self.banners.lock().unwrap().push("raised".to_string());
        Ok(())
    }

    fn clear_alert(&self) -> SinkResult {
        self.banners.lock().unwrap().push("cleared".to_string());
        Ok(())
    }

    fn show_frame(&self, _frame: &Frame, _result: &DetectionResult) -> SinkResult {
        self.frames_shown.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl EventLog for RecordingSinks {
    fn log(&self, message: &str) -> Result<LogEntry, SinkError> {
        let entry = LogEntry {
            timestamp: "2026-01-01 00:00:00".to_string(),
            message: message.to_string(),
        };
        self.events.lock().unwrap().push(message.to_string());
        Ok(entry)
    }

    fn read_all(&self, limit: usize) -> Result<Vec<LogEntry>, SinkError> {
        let events = self.events.lock().unwrap();
        let skip = events.len().saturating_sub(limit);
        Ok(events[skip..]
            .iter()
            .map(|message| LogEntry {
                timestamp: "2026-01-01 00:00:00".to_string(),
                message: message.clone(),
            })
            .collect())
    }
}
