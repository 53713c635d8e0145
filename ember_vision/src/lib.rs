// THEORY:
// This file is the main entry point for the `ember_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the `ember_monitor`
// application).
//
// The primary goal is to export the `FireDetectionEngine`, the
// `AlertLifecycleController` and the runtime that drives them, together with
// the collaborator traits a host application implements (`VideoSource`,
// `NotificationSink`, `DisplaySink`, `EventLog`). The individual analysis
// stages live under `stages` and are public for testing and reuse, but the
// engine facade is the intended entry point for the whole classifier.

pub mod alert;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod runtime;
pub mod sinks;
pub mod stages;

pub use crate::alert::{AlertLifecycleController, AlertState, AlertTransition};
pub use crate::config::{ColorBand, EngineConfig};
pub use crate::engine::{DetectionResult, FireDetectionEngine, Region};
pub use crate::error::{EngineError, EngineResult, SinkError, SinkResult};
pub use crate::frame::{Frame, Mask};
pub use crate::runtime::{MonitorCommand, MonitorHandle};
pub use crate::sinks::{DisplaySink, EventLog, LogEntry, NotificationSink, VideoSource};
