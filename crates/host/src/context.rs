//! Contexts passed by the framework to native role implementations.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{configuration::Configuration, datum::Datum, job};

/// Kind of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Map,
    Reduce,
}

/// Identity of one execution attempt of a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskAttemptId {
    pub job: String,
    pub kind: TaskKind,
    pub task: u32,
    pub attempt: u32,
}

impl TaskAttemptId {
    pub fn new(job: impl Into<String>, kind: TaskKind, task: u32, attempt: u32) -> Self {
        TaskAttemptId {
            job: job.into(),
            kind,
            task,
            attempt,
        }
    }
}

impl fmt::Display for TaskAttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TaskKind::Map => 'm',
            TaskKind::Reduce => 'r',
        };
        write!(f, "attempt_{}_{}_{:06}_{}", self.job, kind, self.task, self.attempt)
    }
}

/// Read-only view of a submitted job.
#[derive(Debug, Clone)]
pub struct JobContext {
    job_name: String,
    configuration: Arc<Configuration>,
    attempt: Option<TaskAttemptId>,
}

impl JobContext {
    /// Creates job-level context, job name is taken from configuration.
    pub fn new(configuration: Arc<Configuration>) -> Self {
        JobContext {
            job_name: configuration.get(job::JOB_NAME).unwrap_or_default().to_string(),
            configuration,
            attempt: None,
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Attempt which runs the current code, absent outside of tasks.
    pub fn attempt(&self) -> Option<&TaskAttemptId> {
        self.attempt.as_ref()
    }
}

/// Context of a running task attempt.
#[derive(Debug)]
pub struct TaskContext {
    job: JobContext,
    output: Vec<(Datum, Datum)>,
}

impl TaskContext {
    pub fn new(configuration: Arc<Configuration>, attempt: TaskAttemptId) -> Self {
        let mut job = JobContext::new(configuration);
        job.attempt = Some(attempt);
        TaskContext { job, output: Vec::new() }
    }

    pub fn job(&self) -> &JobContext {
        &self.job
    }

    pub fn configuration(&self) -> &Configuration {
        self.job.configuration()
    }

    pub fn attempt(&self) -> Option<&TaskAttemptId> {
        self.job.attempt()
    }

    /// Writes output record of the task.
    pub fn write(&mut self, key: Datum, value: Datum) {
        self.output.push((key, value));
    }

    /// Records written so far.
    pub fn output(&self) -> &[(Datum, Datum)] {
        &self.output
    }

    /// Takes all written records out of the context.
    pub fn take_output(&mut self) -> Vec<(Datum, Datum)> {
        std::mem::take(&mut self.output)
    }
}
