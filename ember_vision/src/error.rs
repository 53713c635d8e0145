// THEORY:
// The error taxonomy for the detection engine is intentionally small. Only
// three things can go wrong from the engine's point of view: a frame with
// broken geometry (`InvalidFrame`), a video source that cannot be opened or
// read (`Source`), and an out-of-range parameter at construction
// (`Configuration`). "No fire detected" is a normal classification outcome
// and never travels through this type.
//
// Collaborator sinks (actuator, display, event log) fail independently of the
// engine and of each other, so their failures use a separate `SinkError` that
// is logged at the dispatch site and never propagated into the frame loop.

use thiserror::Error;

/// A specialized `Result` type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// A specialized `Result` type for collaborator sink dispatches.
pub type SinkResult = Result<(), SinkError>;

/// Errors produced by the detection engine and the processing runtime.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    /// The frame's geometry does not match its pixel data. Fatal to the call
    /// that received it; the caller is expected to stop the stream.
    #[error("invalid frame: {reason}")]
    InvalidFrame {
        /// What was wrong with the frame
        reason: String,
    },

    /// The video source failed to open or read. Terminates the processing
    /// loop; reconnection is the caller's responsibility.
    #[error("video source error: {message}")]
    Source {
        /// Description of the source failure
        message: String,
    },

    /// A construction-time parameter was out of range.
    #[error("configuration error: {message}")]
    Configuration {
        /// Which parameter and why
        message: String,
    },
}

impl EngineError {
    /// Creates a new invalid frame error.
    #[must_use]
    pub fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame {
            reason: reason.into(),
        }
    }

    /// Creates a new source error.
    #[must_use]
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Failure reported by a collaborator sink (actuator, display, event log).
///
/// These are dispatch-site failures: the controller logs them and carries on,
/// so that one misbehaving collaborator never suppresses the side effects
/// owed to the others.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct SinkError {
    message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}
