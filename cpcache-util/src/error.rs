use std::fmt;

use serde::Serialize;
use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Acquisition strategy that produced a failure.
#[derive(Serialize, Display, IntoStaticStr, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: FetchError,
}

impl StageFailure {
    pub fn new(stage: Stage, error: FetchError) -> Self {
        Self { stage, error }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.stage, self.error)
    }
}

/// Everything that can go wrong while acquiring data from the origin.
///
/// `Transport` and `Shape` from the direct strategy escalate to the fallback
/// strategy. `Configuration` is raised before any network call and is never
/// retried. `Challenge` is terminal once seen by the browser strategy.
/// `Aggregate` is what callers see after both strategies failed.
#[derive(Error, IntoStaticStr, Debug, Clone, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum FetchError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Challenge not cleared: {0}")]
    Challenge(String),
    #[error("Unexpected response shape: {reason} (body: {snippet:?})")]
    Shape { reason: String, snippet: String },
    #[error("No live contest data available: {}", join_failures(.0))]
    Aggregate(Vec<StageFailure>),
}

impl FetchError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn transport(message: impl fmt::Display) -> Self {
        Self::Transport(message.to_string())
    }

    /// Stable machine readable name of the variant.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    pub fn stage_failures(&self) -> &[StageFailure] {
        match self {
            Self::Aggregate(failures) => failures,
            _ => &[],
        }
    }
}

fn join_failures(failures: &[StageFailure]) -> String {
    if failures.is_empty() {
        return String::from("no strategy was attempted");
    }
    failures
        .iter()
        .map(StageFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
