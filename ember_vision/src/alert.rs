// THEORY:
// Detection is level-based (every frame gets a verdict) but alarms are
// event-based (a siren is switched on once, not thirty times a second).
// This module is the edge detector between the two worlds. It watches the
// stream of per-frame verdicts and emits a transition only when the level
// actually changes, so every external effect happens exactly once per
// episode.
//
// Key architectural principles:
// 1.  **Decide, then act**: `observe` is a pure state machine with no side
//     effects; `dispatch` performs them. Tests drive the machine without
//     sinks, and the loop gets exactly-once semantics for free.
// 2.  **Failure isolation**: Each sink is invoked independently. A dead
//     notifier never stops the dashboard from updating or the event from
//     being written down.
// 3.  **The alarm outlives the flame**: A falling edge updates the display
//     and the log but does not touch the notifier. Hardware stands down
//     only when an operator calls `deactivate`.

use std::sync::Arc;

use crate::engine::DetectionResult;
use crate::sinks::{self, DisplaySink, EventLog, NotificationSink};

/// Where the controller currently is in the alert lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Idle,
    Alerting,
}

/// A change of alert level, produced on the frame where the level flips.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertTransition {
    FireDetected { confidence: f64, timestamp: f64 },
    FireCleared,
}

/// Turns per-frame verdicts into exactly-once alert side effects.
pub struct AlertLifecycleController {
    state: AlertState,
    notifier: Arc<dyn NotificationSink>,
    display: Arc<dyn DisplaySink>,
    event_log: Arc<dyn EventLog>,
}

impl AlertLifecycleController {
    pub fn new(
        notifier: Arc<dyn NotificationSink>,
        display: Arc<dyn DisplaySink>,
        event_log: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            state: AlertState::Idle,
            notifier,
            display,
            event_log,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Advances the state machine by one verdict. Returns the transition if
    /// this verdict flipped the alert level, with no side effects.
    pub fn observe(
        &mut self,
        result: &DetectionResult,
        timestamp: f64,
    ) -> Option<AlertTransition> {
        match (self.state, result.fire_present) {
            (AlertState::Idle, true) => {
                self.state = AlertState::Alerting;
                Some(AlertTransition::FireDetected {
                    confidence: result.smoothed_confidence,
                    timestamp,
                })
            }
            (AlertState::Alerting, false) => {
                self.state = AlertState::Idle;
                Some(AlertTransition::FireCleared)
            }
            _ => None,
        }
    }

    /// Performs the side effects for one transition. Sinks fail
    /// independently: each failure is logged and the rest still run.
    pub fn dispatch(&self, transition: &AlertTransition) {
        match transition {
            AlertTransition::FireDetected { confidence, timestamp } => {
                if let Err(error) = self.notifier.send_fire_alert(*confidence, *timestamp) {
                    tracing::warn!(%error, "fire notification failed");
                }
                if let Err(error) = self.display.fire_detected(*confidence) {
                    tracing::warn!(%error, "display alert failed");
                }
                self.record(&format!("Fire detected (confidence {confidence:.2})"));
            }
            AlertTransition::FireCleared => {
                if let Err(error) = self.display.clear_alert() {
                    tracing::warn!(%error, "display clear failed");
                }
                self.record("Fire condition cleared");
            }
        }
    }

    /// Observes the verdict and dispatches any resulting transition.
    pub fn process(&mut self, result: &DetectionResult, timestamp: f64) {
        if let Some(transition) = self.observe(result, timestamp) {
            self.dispatch(&transition);
        }
    }

    /// Stands the alarm down on an operator's order. Always tells the
    /// notifier, even from `Idle`: the hardware may be latched on from an
    /// alert the controller has since forgotten.
    pub fn deactivate(&mut self) {
        self.state = AlertState::Idle;
        if let Err(error) = self.notifier.deactivate() {
            tracing::warn!(%error, "alarm deactivation failed");
        }
        if let Err(error) = self.display.clear_alert() {
            tracing::warn!(%error, "display clear failed");
        }
        self.record("Alarm deactivated");
    }

    /// Drops back to `Idle` without side effects. Used when the stream ends
    /// and the alert level is simply no longer known.
    pub(crate) fn force_idle(&mut self) {
        self.state = AlertState::Idle;
    }

    fn record(&self, message: &str) {
        sinks::record_event(self.event_log.as_ref(), self.display.as_ref(), message);
    }
}
