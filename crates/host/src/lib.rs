//! Interface of the batch-processing framework that executes bridged jobs.
//!
//! Only the surface which job assembly and task-side adapters touch is modeled here: the configuration store,
//! native jobs, task contexts, native role traits and the catalog used by workers to instantiate classes by name.

pub mod catalog;
pub mod client;
pub mod configuration;
pub mod context;
pub mod datum;
pub mod error;
pub mod formats;
pub mod job;
pub mod native;
pub mod split;

pub use configuration::Configuration;
pub use context::{JobContext, TaskAttemptId, TaskContext, TaskKind};
pub use datum::{Datum, DatumType};
pub use error::{error_chain, BoxError, HostError, TaskError};
pub use job::Job;
pub use split::InputSplit;
