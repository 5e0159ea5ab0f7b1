//! Typed per-page failures and driver error classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::driver::DriverError;

/// Why a single page produced no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Navigation did not settle within its bound.
    Timeout,
    /// Anti-automation interstitial (CAPTCHA, verification page).
    ChallengeDetected,
    /// Redirected to a login page; the session must be refreshed out-of-band.
    SessionExpired,
    /// The data table never appeared.
    TableNotFound,
    /// Anything else, including a driver crash.
    Unknown,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::ChallengeDetected => "challenge_detected",
            FailureKind::SessionExpired => "session_expired",
            FailureKind::TableNotFound => "table_not_found",
            FailureKind::Unknown => "unknown",
        }
    }

    /// Conditions the runner cannot fix itself; an operator has to act.
    pub fn needs_operator(self) -> bool {
        matches!(self, FailureKind::ChallengeDetected | FailureKind::SessionExpired)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn from_driver(e: &DriverError) -> Self {
        Self::new(classify_driver_error(e), e.to_string())
    }
}

/// Maps a driver error onto a failure kind. Only timeouts are distinguished;
/// everything else is `Unknown`.
pub fn classify_driver_error(e: &DriverError) -> FailureKind {
    match e {
        DriverError::Timeout(_) => FailureKind::Timeout,
        DriverError::Navigation(_)
        | DriverError::NoPage
        | DriverError::Selector(_)
        | DriverError::Other(_) => FailureKind::Unknown,
    }
}
