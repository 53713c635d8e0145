// Durable record of stream and alert events, one CSV row per event. The
// file survives restarts and the tail is replayed to the console on startup
// so an operator can see what happened while nobody was watching.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use ember_vision::error::SinkError;
use ember_vision::{EventLog, LogEntry};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only CSV log with a `timestamp,event` header.
pub struct CsvEventLog {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl CsvEventLog {
    /// Opens the log for appending, creating it with a header row if the
    /// file is new or empty.
    pub fn open(path: PathBuf) -> Result<Self, SinkError> {
        let is_new = std::fs::metadata(&path).map(|meta| meta.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer
                .write_record(["timestamp", "event"])
                .map_err(|error| SinkError::new(error.to_string()))?;
            writer.flush()?;
        }

        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }
}

impl EventLog for CsvEventLog {
    fn log(&self, message: &str) -> Result<LogEntry, SinkError> {
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::new("event log lock poisoned"))?;
        writer
            .write_record([timestamp.as_str(), message])
            .map_err(|error| SinkError::new(error.to_string()))?;
        writer.flush()?;

        Ok(LogEntry {
            timestamp,
            message: message.to_string(),
        })
    }

    fn read_all(&self, limit: usize) -> Result<Vec<LogEntry>, SinkError> {
        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|error| SinkError::new(error.to_string()))?;

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|error| SinkError::new(error.to_string()))?;
            entries.push(LogEntry {
                timestamp: record.get(0).unwrap_or_default().to_string(),
                message: record.get(1).unwrap_or_default().to_string(),
            });
        }

        // Keep the newest `limit` entries, oldest first.
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.split_off(skip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ember_log_{}_{}.csv", name, std::process::id()))
    }

    #[test]
    fn events_round_trip_through_the_file() {
        let path = temp_log("round_trip");
        let _ = std::fs::remove_file(&path);

        let log = CsvEventLog::open(path.clone()).unwrap();
        log.log("Stream started (synthetic 640x480)").unwrap();
        log.log("Fire detected (confidence 0.97)").unwrap();

        let entries = log.read_all(100).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Stream started (synthetic 640x480)");
        assert_eq!(entries[1].message, "Fire detected (confidence 0.97)");
        assert!(!entries[0].timestamp.is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reopening_appends_without_a_second_header() {
        let path = temp_log("reopen");
        let _ = std::fs::remove_file(&path);

        {
            let log = CsvEventLog::open(path.clone()).unwrap();
            log.log("first run").unwrap();
        }
        let log = CsvEventLog::open(path.clone()).unwrap();
        log.log("second run").unwrap();

        let entries = log.read_all(100).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first run");
        assert_eq!(entries[1].message, "second run");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("timestamp,event").count(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn read_all_returns_the_newest_entries() {
        let path = temp_log("tail");
        let _ = std::fs::remove_file(&path);

        let log = CsvEventLog::open(path.clone()).unwrap();
        for n in 0..10 {
            log.log(&format!("event {n}")).unwrap();
        }

        let tail = log.read_all(3).unwrap();
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].message, "event 7");
        assert_eq!(tail[2].message, "event 9");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn concurrent_writers_are_serialized() {
        let path = temp_log("concurrent");
        let _ = std::fs::remove_file(&path);

        let log = std::sync::Arc::new(CsvEventLog::open(path.clone()).unwrap());
        let mut writers = Vec::new();
        for writer in 0..4 {
            let log = log.clone();
            writers.push(std::thread::spawn(move || {
                for n in 0..25 {
                    log.log(&format!("writer {writer} event {n}")).unwrap();
                }
            }));
        }
        for writer in writers {
            writer.join().unwrap();
        }

        let entries = log.read_all(1000).unwrap();
        assert_eq!(entries.len(), 100, "every row should parse back intact");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn fields_with_commas_survive_the_csv_layer() {
        let path = temp_log("quoting");
        let _ = std::fs::remove_file(&path);

        let log = CsvEventLog::open(path.clone()).unwrap();
        log.log("halted, operator request").unwrap();

        let entries = log.read_all(10).unwrap();
        assert_eq!(entries[0].message, "halted, operator request");

        let _ = std::fs::remove_file(&path);
    }
}
