//! Submission of assembled jobs.

use crate::{error::HostError, job::Job};

/// Client which runs submitted jobs on a cluster.
pub trait JobClient {
    /// Submits job and waits for its completion. Returns whether the job succeeded.
    fn submit(&mut self, job: &Job) -> Result<bool, HostError>;
}
