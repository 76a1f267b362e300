use std::path::PathBuf;

use thiserror::Error;

use crate::clock::Tick;
use crate::host::SessionId;

/// Failure reported by a scheduled task.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskError {
    message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A task failed under the fail-fast policy. `discarded` counts the
    /// tasks of the same tick that were dropped without running.
    #[error("task #{index} at tick {tick} failed ({discarded} remaining tasks discarded): {source}")]
    TaskFailed {
        tick: Tick,
        index: usize,
        discarded: usize,
        #[source]
        source: TaskError,
    },
}

#[derive(Debug, Error)]
pub enum EpisodeError {
    /// The activating session's host context could not be resolved.
    /// Nothing was delivered or scheduled.
    #[error("host context for session {0} is unavailable; episode aborted")]
    UnresolvedHost(SessionId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
