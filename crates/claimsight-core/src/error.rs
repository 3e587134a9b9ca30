//! Unified Error Model
use crate::stage::StageKind;
use std::time::Duration;
use thiserror::Error;

/// Failures absorbed by the orchestrator. None of these escape a claim run:
/// each one becomes a log entry, an `error_message` and an empty stage result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClaimError {
    #[error("DET/UNAVAILABLE: {stage}: {message}")]
    DetectionUnavailable { stage: StageKind, message: String },

    #[error("STAGE/EXEC: {stage}: {message}")]
    StageInvocation { stage: StageKind, message: String },

    #[error("STAGE/TIMEOUT: {stage} after {}ms", .after.as_millis())]
    Timeout { stage: StageKind, after: Duration },

    #[error("STAGE/CANCELLED: {0}")]
    Cancelled(StageKind),

    #[error("FSM/TRANSITION: no edge from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

impl ClaimError {
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            Self::DetectionUnavailable { stage, .. }
            | Self::StageInvocation { stage, .. }
            | Self::Timeout { stage, .. } => Some(*stage),
            Self::Cancelled(stage) => Some(*stage),
            Self::InvalidTransition { .. } => None,
        }
    }
}

/// Configuration loading and validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG/IO: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CONFIG/PARSE: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("CONFIG/INVALID: {0}")]
    Invalid(String),
}
