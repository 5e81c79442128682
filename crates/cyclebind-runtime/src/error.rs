#![forbid(unsafe_code)]

//! Errors surfaced by the engine.
//!
//! | Failure | Raised by | Effect |
//! |---------|-----------|--------|
//! | Missing observer locator / signaler | driver creation | mount aborted |
//! | Unknown custom creator | assembly | mount aborted |
//! | Host observation failure | two-way driver | mount aborted |
//! | Unmatched / mismatched sink | engine, strict mode only | mount aborted |
//! | Transformation panic | engine | mount aborted, siblings unaffected |
//!
//! A redundant mount is not an error: it is reported through
//! [`MountOutcome::AlreadyMounted`](crate::engine::MountOutcome).

use crate::ports::SinkKind;

/// Errors from the cycle engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    /// A two-way driver was requested but no observer locator is installed.
    MissingObserverLocator {
        component: &'static str,
        property: String,
    },
    /// A signal driver was requested but no signaler is installed.
    MissingSignaler {
        component: &'static str,
        property: String,
    },
    /// A custom driver kind names a creator the engine does not know.
    UnknownDriverCreator {
        component: &'static str,
        property: String,
        creator: String,
    },
    /// The host failed to observe a property.
    ObservationFailed {
        component: &'static str,
        property: String,
        reason: String,
    },
    /// A sink has no driver to consume it (strict mode).
    UnmatchedSink {
        component: &'static str,
        key: String,
    },
    /// A sink carries a different payload than its driver consumes (strict
    /// mode).
    SinkKindMismatch {
        component: &'static str,
        key: String,
        expected: SinkKind,
        found: SinkKind,
    },
    /// The transformation panicked while building its sinks.
    TransformPanicked {
        component: &'static str,
        message: String,
    },
    /// Configuration could not be parsed or is out of range.
    InvalidConfig(String),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingObserverLocator {
                component,
                property,
            } => write!(
                f,
                "{component}.{property}: two-way driver needs an observer locator"
            ),
            Self::MissingSignaler {
                component,
                property,
            } => write!(f, "{component}.{property}: signal driver needs a signaler"),
            Self::UnknownDriverCreator {
                component,
                property,
                creator,
            } => write!(
                f,
                "{component}.{property}: no driver creator registered as '{creator}'"
            ),
            Self::ObservationFailed {
                component,
                property,
                reason,
            } => write!(f, "{component}.{property}: observation failed: {reason}"),
            Self::UnmatchedSink { component, key } => {
                write!(f, "{component}: sink '{key}' has no driver")
            }
            Self::SinkKindMismatch {
                component,
                key,
                expected,
                found,
            } => write!(
                f,
                "{component}: sink '{key}' carries {found} but its driver consumes {expected}"
            ),
            Self::TransformPanicked { component, message } => {
                write!(f, "{component}: transformation panicked: {message}")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid cycle config: {msg}"),
        }
    }
}

impl std::error::Error for CycleError {}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, CycleError>;
