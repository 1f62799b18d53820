//! Errors of job assembly in the driver and of adapters in tasks.

use jobwire_host::{BoxError, HostError, TaskAttemptId, TaskError};
use thiserror::Error;

use crate::role::Role;

/// Errors raised while assembling jobs in the driver.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Role identifier without a registered adapter.
    #[error("unknown role {0}")]
    UnknownRole(String),
    /// Symbolic format name which doesn't correspond to a known format class.
    #[error("format {symbol} resolves to {class_name} which is not a known format")]
    UnknownFormat { symbol: String, class_name: String },
    /// Script refers to a driver argument which wasn't passed.
    #[error("argument ${index} is referenced but only {available} arguments were passed")]
    MissingArgument { index: usize, available: usize },
    #[error("can't parse job script: {0}")]
    Script(#[from] serde_yaml::Error),
    /// Submitted job ran and failed.
    #[error("job {name} failed")]
    JobFailed { name: String },
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by adapters inside task attempts.
///
/// Every variant converts into the framework's [TaskError], so the failed attempt is retried by the framework with a
/// fresh adapter.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Class name is missing from configuration or isn't registered in this process.
    #[error(
        "can't resolve {role} class {} from `{key}`{}",
        .class.as_deref().unwrap_or("(missing)"),
        attempt_suffix(.attempt)
    )]
    ClassResolution {
        role: Role,
        key: &'static str,
        class: Option<String>,
        attempt: Option<TaskAttemptId>,
    },
    /// User component failed.
    #[error("{role} {operation} failed{}: {source}", attempt_suffix(.attempt))]
    DelegateInvocation {
        role: Role,
        operation: &'static str,
        attempt: Option<TaskAttemptId>,
        #[source]
        source: BoxError,
    },
    /// Value produced by a component can't be represented natively.
    #[error("{role} produced unsupported value{}: {message}", attempt_suffix(.attempt))]
    Conversion {
        role: Role,
        attempt: Option<TaskAttemptId>,
        message: String,
    },
    /// Job configuration entry used by the adapter is malformed.
    #[error("{role} can't read job configuration{}: {source}", attempt_suffix(.attempt))]
    Configuration {
        role: Role,
        attempt: Option<TaskAttemptId>,
        #[source]
        source: HostError,
    },
    /// Adapter was finalized or its component failed to resolve.
    #[error("{role} adapter is no longer usable{}", attempt_suffix(.attempt))]
    Finalized { role: Role, attempt: Option<TaskAttemptId> },
    /// Another thread panicked while holding the adapter.
    #[error("{role} adapter is poisoned")]
    Poisoned { role: Role },
}

impl BridgeError {
    /// Role of the failed adapter.
    pub fn role(&self) -> Role {
        match self {
            BridgeError::ClassResolution { role, .. }
            | BridgeError::DelegateInvocation { role, .. }
            | BridgeError::Conversion { role, .. }
            | BridgeError::Configuration { role, .. }
            | BridgeError::Finalized { role, .. }
            | BridgeError::Poisoned { role } => *role,
        }
    }

    /// Attempt in which the failure happened.
    pub fn attempt(&self) -> Option<&TaskAttemptId> {
        match self {
            BridgeError::ClassResolution { attempt, .. }
            | BridgeError::DelegateInvocation { attempt, .. }
            | BridgeError::Conversion { attempt, .. }
            | BridgeError::Configuration { attempt, .. }
            | BridgeError::Finalized { attempt, .. } => attempt.as_ref(),
            BridgeError::Poisoned { .. } => None,
        }
    }
}

impl From<BridgeError> for TaskError {
    fn from(err: BridgeError) -> Self {
        TaskError::from_source(err.attempt().cloned(), err)
    }
}

fn attempt_suffix(attempt: &Option<TaskAttemptId>) -> String {
    match attempt {
        Some(attempt) => format!(" in {}", attempt),
        None => String::new(),
    }
}
