//! Errors reported by the host framework.

use std::{error::Error as StdError, fmt};

use thiserror::Error;

use crate::context::TaskAttemptId;

/// Boxed error used for failures raised by pluggable code.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors of the host framework itself.
#[derive(Debug, Error)]
pub enum HostError {
    /// Configuration entry can't be read as the requested type.
    #[error("value {value:?} of {key} is not a valid {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
    /// No class with such name is known.
    #[error("unknown {kind} class {name}")]
    UnknownClass { kind: &'static str, name: String },
    /// Configuration can't be serialized or deserialized.
    #[error("configuration serialization failed: {0}")]
    Serialization(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of a task attempt.
///
/// The framework treats it as a failed attempt and reschedules the task with a fresh attempt.
#[derive(Debug)]
pub struct TaskError {
    attempt: Option<TaskAttemptId>,
    message: String,
    source: Option<BoxError>,
}

impl TaskError {
    /// Creates failure with a message only.
    pub fn new(attempt: Option<TaskAttemptId>, message: impl Into<String>) -> Self {
        TaskError {
            attempt,
            message: message.into(),
            source: None,
        }
    }

    /// Creates failure caused by `source`, its message is used as the failure message.
    pub fn from_source(attempt: Option<TaskAttemptId>, source: impl Into<BoxError>) -> Self {
        let source = source.into();
        TaskError {
            attempt,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Attempt which failed, absent for job-level operations such as split computation.
    pub fn attempt(&self) -> Option<&TaskAttemptId> {
        self.attempt.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attempt {
            Some(attempt) => write!(f, "task attempt {} failed: {}", attempt, self.message),
            None => write!(f, "job task failed: {}", self.message),
        }
    }
}

impl StdError for TaskError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn StdError + 'static))
    }
}

/// Formats an error followed by its chain of causes.
///
/// A cause is skipped when the message so far already ends with it, as happens for errors which embed their source.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut report = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !report.ends_with(&message) {
            report.push_str(": ");
            report.push_str(&message);
        }
        source = cause.source();
    }
    report
}
