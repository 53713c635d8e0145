// THEORY:
// One stream, one loop, one thread. The monitor runs the read/process/alert
// cycle on a dedicated blocking task so the pipeline's per-frame CPU work
// never stalls the async executor. Control flows in over channels: a watch
// flag for "stop" and an unbounded inbox for operator commands, both checked
// once per iteration so the loop stays a straight line.
//
// The loop owns everything mutable (engine, controller, source). Callers
// keep only a `MonitorHandle`, which makes the shutdown story trivial:
// flip the flag, await the task.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::alert::AlertLifecycleController;
use crate::config::EngineConfig;
use crate::engine::FireDetectionEngine;
use crate::error::EngineResult;
use crate::sinks::{self, DisplaySink, EventLog, NotificationSink, VideoSource};

/// Pause between frames, tuned for roughly thirty frames per second.
const FRAME_PACING: Duration = Duration::from_millis(30);

/// Operator commands accepted while the monitor runs.
#[derive(Debug)]
pub enum MonitorCommand {
    /// Stand the alarm down and start detection over from a clean slate.
    Deactivate,
}

/// The caller's grip on a running monitor.
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    command_tx: mpsc::UnboundedSender<MonitorCommand>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Asks the loop to finish after its current iteration.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Queues an alarm deactivation. The loop applies it before reading the
    /// next frame.
    pub fn deactivate(&self) {
        let _ = self.command_tx.send(MonitorCommand::Deactivate);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the loop to finish. Call `stop` first unless the source is
    /// expected to end on its own.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Starts the monitor: validates the configuration, opens the source, and
/// spawns the processing loop. Must be called from within a Tokio runtime.
///
/// A source that fails to open is recorded in the event log and the error is
/// returned; nothing is spawned.
pub fn start(
    config: EngineConfig,
    mut source: Box<dyn VideoSource>,
    notifier: Arc<dyn NotificationSink>,
    display: Arc<dyn DisplaySink>,
    event_log: Arc<dyn EventLog>,
) -> EngineResult<MonitorHandle> {
    let engine = FireDetectionEngine::new(config)?;

    if let Err(error) = source.start() {
        record(&event_log, &display, &format!("Stream error: {error}"));
        return Err(error);
    }
    record(
        &event_log,
        &display,
        &format!("Stream started ({})", source.describe()),
    );

    let controller =
        AlertLifecycleController::new(notifier, display.clone(), event_log.clone());

    let (stop_tx, stop_rx) = watch::channel(false);
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let task = tokio::task::spawn_blocking(move || {
        run_loop(engine, controller, source, stop_rx, command_rx, display, event_log);
    });

    Ok(MonitorHandle {
        stop_tx,
        command_tx,
        task,
    })
}

fn run_loop(
    mut engine: FireDetectionEngine,
    mut controller: AlertLifecycleController,
    mut source: Box<dyn VideoSource>,
    stop_rx: watch::Receiver<bool>,
    mut command_rx: mpsc::UnboundedReceiver<MonitorCommand>,
    display: Arc<dyn DisplaySink>,
    event_log: Arc<dyn EventLog>,
) {
    loop {
        if *stop_rx.borrow() {
            break;
        }

        while let Ok(command) = command_rx.try_recv() {
            match command {
                MonitorCommand::Deactivate => {
                    engine.reset();
                    controller.deactivate();
                }
            }
        }

        match source.read() {
            Ok(Some(frame)) => match engine.process_frame(&frame) {
                Ok(result) => {
                    controller.process(&result, frame.timestamp);
                    if let Err(error) = display.show_frame(&frame, &result) {
                        tracing::warn!(%error, "frame display failed");
                    }
                    thread::sleep(FRAME_PACING);
                }
                Err(error) => {
                    record(&event_log, &display, &format!("Frame rejected: {error}"));
                    break;
                }
            },
            Ok(None) => {
                tracing::info!(source = source.describe(), "video stream ended");
                break;
            }
            Err(error) => {
                record(&event_log, &display, &format!("Stream error: {error}"));
                break;
            }
        }
    }

    source.stop();
    engine.reset();
    controller.force_idle();
    record(&event_log, &display, "Stream stopped");
}

fn record(event_log: &Arc<dyn EventLog>, display: &Arc<dyn DisplaySink>, message: &str) {
    sinks::record_event(event_log.as_ref(), display.as_ref(), message);
}
