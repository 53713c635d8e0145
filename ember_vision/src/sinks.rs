// THEORY:
// The engine decides; everything else reacts. This module defines the seams
// between the detection loop and the outside world: where frames come from,
// where alarms go, what the operator sees, and what gets written down. The
// loop only ever talks to these traits, so a deployment can swap a camera
// for a directory of stills or a hardware siren for a test double without
// touching the pipeline.
//
// Every sink method is synchronous and MUST NOT block. The processing loop
// calls them between frames; an implementation that needs I/O should hand
// the work to a channel or a background task and return immediately. A sink
// failure is the sink's problem: the loop logs it and keeps detecting.

use crate::engine::DetectionResult;
use crate::error::{EngineResult, SinkError, SinkResult};
use crate::frame::Frame;

/// One line of the persistent event log: a formatted local time plus the
/// event text.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
}

/// A sequential supplier of frames.
pub trait VideoSource: Send {
    /// Acquires the underlying device or data. Called once, before the
    /// first `read`.
    fn start(&mut self) -> EngineResult<()>;

    /// Returns the next frame, stamped with its capture time. `Ok(None)`
    /// means the stream ended cleanly; an error means it broke.
    fn read(&mut self) -> EngineResult<Option<Frame>>;

    /// Releases the underlying device. Safe to call more than once.
    fn stop(&mut self);

    /// A short human-readable label for log lines.
    fn describe(&self) -> String {
        "video source".to_string()
    }
}

/// The downstream alarm channel (a siren, a relay, a message queue).
pub trait NotificationSink: Send + Sync {
    /// Fire was confirmed. Sent once per alert, on the rising edge.
    fn send_fire_alert(&self, confidence: f64, timestamp: f64) -> SinkResult;

    /// An operator stood the alarm down.
    fn deactivate(&self) -> SinkResult;
}

/// The operator-facing surface (a dashboard, a console, a recorder).
pub trait DisplaySink: Send + Sync {
    /// Mirrors one event log line to the operator.
    fn display_log(&self, entry: &LogEntry) -> SinkResult;

    /// Raises the alert banner.
    fn fire_detected(&self, confidence: f64) -> SinkResult;

    /// Clears the alert banner.
    fn clear_alert(&self) -> SinkResult;

    /// Offers the latest frame and its verdict for rendering. Implementations
    /// are free to drop frames; detection never waits for drawing.
    fn show_frame(&self, frame: &Frame, result: &DetectionResult) -> SinkResult;
}

/// The persistent record of notable events.
pub trait EventLog: Send + Sync {
    /// Appends one event, returning the entry as written (with its
    /// timestamp).
    fn log(&self, message: &str) -> Result<LogEntry, SinkError>;

    /// Returns up to `limit` most recent entries, oldest first.
    fn read_all(&self, limit: usize) -> Result<Vec<LogEntry>, SinkError>;
}

/// Writes an event to the log and mirrors the written entry to the display.
/// Either half may fail independently; failures are logged and swallowed so
/// the detection loop never stalls on a sink.
pub(crate) fn record_event(event_log: &dyn EventLog, display: &dyn DisplaySink, message: &str) {
    match event_log.log(message) {
        Ok(entry) => {
            if let Err(error) = display.display_log(&entry) {
                tracing::warn!(%error, "display sink rejected a log entry");
            }
        }
        Err(error) => {
            tracing::warn!(%error, message, "event log write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FlakyLog {
        fail: bool,
        written: Mutex<Vec<String>>,
    }

    impl EventLog for FlakyLog {
        fn log(&self, message: &str) -> Result<LogEntry, SinkError> {
            if self.fail {
                return Err(SinkError::new("disk full"));
            }
            self.written.lock().unwrap().push(message.to_string());
            Ok(LogEntry {
                timestamp: "2026-01-01 00:00:00".to_string(),
                message: message.to_string(),
            })
        }

        fn read_all(&self, _limit: usize) -> Result<Vec<LogEntry>, SinkError> {
            Ok(Vec::new())
        }
    }

    struct FlakyDisplay {
        fail: bool,
        shown: Mutex<Vec<String>>,
    }

    impl DisplaySink for FlakyDisplay {
        fn display_log(&self, entry: &LogEntry) -> SinkResult {
            if self.fail {
                return Err(SinkError::new("display offline"));
            }
            self.shown.lock().unwrap().push(entry.message.clone());
            Ok(())
        }

        fn fire_detected(&self, _confidence: f64) -> SinkResult {
            Ok(())
        }

        fn clear_alert(&self) -> SinkResult {
            Ok(())
        }

        fn show_frame(&self, _frame: &Frame, _result: &DetectionResult) -> SinkResult {
            Ok(())
        }
    }

    #[test]
    fn written_entries_are_mirrored_to_the_display() {
        let log = FlakyLog { fail: false, written: Mutex::new(Vec::new()) };
        let display = FlakyDisplay { fail: false, shown: Mutex::new(Vec::new()) };

        record_event(&log, &display, "Stream started (test)");

        assert_eq!(log.written.lock().unwrap().as_slice(), ["Stream started (test)"]);
        assert_eq!(display.shown.lock().unwrap().as_slice(), ["Stream started (test)"]);
    }

    #[test]
    fn a_failed_write_skips_the_display_mirror() {
        let log = FlakyLog { fail: true, written: Mutex::new(Vec::new()) };
        let display = FlakyDisplay { fail: false, shown: Mutex::new(Vec::new()) };

        record_event(&log, &display, "Stream started (test)");

        assert!(display.shown.lock().unwrap().is_empty());
    }

    #[test]
    fn a_failed_display_still_keeps_the_written_entry() {
        let log = FlakyLog { fail: false, written: Mutex::new(Vec::new()) };
        let display = FlakyDisplay { fail: true, shown: Mutex::new(Vec::new()) };

        record_event(&log, &display, "Fire condition cleared");

        assert_eq!(log.written.lock().unwrap().len(), 1);
    }
}
