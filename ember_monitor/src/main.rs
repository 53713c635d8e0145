mod actuator;
mod config;
mod display;
mod event_log;
mod sources;

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::EnvFilter;

use ember_vision::{runtime, DisplaySink, EventLog, NotificationSink, VideoSource};

use crate::actuator::{NullActuator, TcpActuator};
use crate::config::{MonitorConfig, StreamSource};
use crate::display::{ConsoleDisplay, FrameBus};
use crate::event_log::CsvEventLog;
use crate::sources::{ImageDirSource, SyntheticSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Logging & Configuration ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match args.len() {
        1 => MonitorConfig::default(),
        2 => MonitorConfig::load(Path::new(&args[1]))?,
        _ => {
            println!("Usage: ember_monitor [config.toml]");
            return Ok(());
        }
    };

    // --- 2. Sinks ---
    let event_log: Arc<dyn EventLog> =
        Arc::new(CsvEventLog::open(config.log_path.clone()).context("opening the event log")?);
    let bus = FrameBus::new(8);
    let live_frames = bus.subscribe();
    let display: Arc<dyn DisplaySink> = Arc::new(ConsoleDisplay::new(bus));
    let notifier: Arc<dyn NotificationSink> = match &config.actuator_address {
        Some(address) => Arc::new(TcpActuator::new(address.clone())),
        None => Arc::new(NullActuator),
    };
    tokio::spawn(heartbeat(live_frames));

    // --- 3. Event Replay ---
    match event_log.read_all(config.replay_limit) {
        Ok(entries) => {
            for entry in &entries {
                let _ = display.display_log(entry);
            }
        }
        Err(error) => tracing::warn!(%error, "could not replay the event log"),
    }

    // --- 4. Detection Loop ---
    let source = build_source(&config);
    let handle = runtime::start(
        config.detection.clone(),
        source,
        notifier,
        display,
        event_log,
    )?;

    // --- 5. Operator Commands & Shutdown ---
    let mut commands = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.stop();
                break;
            }
            line = commands.next_line(), if stdin_open => {
                match line {
                    Ok(Some(command)) => match command.trim() {
                        "deactivate" => handle.deactivate(),
                        "quit" => {
                            handle.stop();
                            break;
                        }
                        "" => {}
                        other => println!("unknown command {other:?} (try: deactivate | quit)"),
                    },
                    // Detached stdin: fall back to signals and end-of-stream.
                    _ => stdin_open = false,
                }
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                if handle.is_finished() {
                    break;
                }
            }
        }
    }

    handle.join().await;
    Ok(())
}

/// Counts annotated frames off the bus and reports at debug level, so
/// `RUST_LOG=debug` shows whether the pipeline is actually moving.
async fn heartbeat(mut live_frames: broadcast::Receiver<display::FramePacket>) {
    let mut seen: u64 = 0;
    loop {
        match live_frames.recv().await {
            Ok(packet) => {
                seen += 1;
                if seen % 100 == 0 {
                    tracing::debug!(frames = seen, timestamp = packet.timestamp, "stream heartbeat");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "heartbeat lagging behind the stream");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn build_source(config: &MonitorConfig) -> Box<dyn VideoSource> {
    let stream = &config.stream;
    match &stream.source {
        StreamSource::Synthetic => Box::new(SyntheticSource::new(
            stream.width,
            stream.height,
            stream.fps,
            stream.frame_limit,
        )),
        StreamSource::Directory(path) => {
            Box::new(ImageDirSource::new(path.clone(), stream.width, stream.height))
        }
    }
}
