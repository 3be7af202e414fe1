//! Error types for the DAA core.
//!
//! Only configuration errors are fatal. Merge and frame errors are surfaced to
//! the caller so an upstream geometry or ingest bug is never silently clamped.

use thiserror::Error;

/// Rejected threshold or axis configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Threshold '{name}' must be a finite non-negative number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Activation time B ({activation}) exceeds lookahead time T ({lookahead})")]
    ActivationAfterLookahead { activation: f64, lookahead: f64 },

    #[error("Non-hazard zone height {znhz} exceeds vertical threshold {zthr}")]
    NonHazardZoneTooTall { znhz: f64, zthr: f64 },

    #[error("Axis '{axis}' is malformed: {reason}")]
    InvalidAxis { axis: &'static str, reason: String },

    #[error("Alert level {region} is invalid: {reason}")]
    InvalidAlertLevel { region: String, reason: String },

    #[error("Malformed parameter line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Failed to decode configuration: {0}")]
    Decode(String),

    #[error("Failed to read configuration {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Invalid input handed to the colored-interval merger.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    #[error("Interval bounds are reversed: [{lower}, {upper}]")]
    ReversedBounds { lower: f64, upper: f64 },

    #[error("Interval bound is not finite: [{lower}, {upper}]")]
    NonFiniteBound { lower: f64, upper: f64 },

    #[error("Working list has {0} breakpoints, at least two are required")]
    DegenerateList(usize),

    #[error("Unknown region '{0}'")]
    UnknownRegion(String),
}

/// Malformed traffic snapshot for one monitoring cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("Expected exactly one ownship, found {0}")]
    OwnshipCount(usize),

    #[error("Aircraft {index} has a non-finite position or velocity")]
    NonFiniteState { index: usize },
}

/// Umbrella error for callers that don't need to distinguish sources.
#[derive(Debug, Error)]
pub enum DaaError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umbrella_error_keeps_message() {
        let err: DaaError = ConfigError::ActivationAfterLookahead {
            activation: 70.0,
            lookahead: 60.0,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Activation time B (70) exceeds lookahead time T (60)"
        );
        let err: DaaError = FrameError::OwnshipCount(2).into();
        assert!(matches!(err, DaaError::Frame(FrameError::OwnshipCount(2))));
    }
}
