//! Programming model of user components.
//!
//! Components exchange dynamic [serde_json::Value]s instead of the framework's native datums, adapters translate
//! between the two representations.

use std::cmp::Ordering;

use jobwire_host::{BoxError, JobContext};
use serde_json::Value;

/// Optional lifecycle hooks implemented by a component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hooks {
    pub setup: bool,
    pub cleanup: bool,
}

impl Hooks {
    pub const NONE: Hooks = Hooks {
        setup: false,
        cleanup: false,
    };
    pub const SETUP: Hooks = Hooks {
        setup: true,
        cleanup: false,
    };
    pub const CLEANUP: Hooks = Hooks {
        setup: false,
        cleanup: true,
    };
    pub const ALL: Hooks = Hooks {
        setup: true,
        cleanup: true,
    };
}

/// Base trait of every component.
pub trait Component: Send {
    /// Hooks the component implements.
    ///
    /// Queried once right after the component is instantiated; [setup](Component::setup) and
    /// [cleanup](Component::cleanup) are never called unless declared here.
    fn hooks(&self) -> Hooks {
        Hooks::NONE
    }

    /// Called once per task attempt before the first record.
    fn setup(&mut self, _ctx: &JobContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called once per task attempt when the task is torn down.
    fn cleanup(&mut self, _ctx: &JobContext) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Collects records emitted by a component.
#[derive(Debug, Default)]
pub struct Emitter {
    records: Vec<(Value, Value)>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        self.records.push((key.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops all emitted records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Takes emitted records out, keeping the allocated buffer.
    pub fn drain(&mut self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.records.drain(..)
    }
}

pub trait Map: Component {
    fn map(&mut self, key: Value, value: Value, out: &mut Emitter) -> Result<(), BoxError>;
}

/// Reducer or combiner.
pub trait Reduce: Component {
    fn reduce(&mut self, key: Value, values: &mut dyn Iterator<Item = Value>, out: &mut Emitter)
        -> Result<(), BoxError>;
}

pub trait Partition: Component {
    /// Returns reduce task for a record, in `0..num_partitions`.
    fn partition(&mut self, key: &Value, value: &Value, num_partitions: u32) -> Result<u32, BoxError>;
}

/// Sort or grouping comparator.
pub trait Compare: Component {
    fn compare(&mut self, a: &Value, b: &Value) -> Result<Ordering, BoxError>;
}

/// Computes input splits of a job.
///
/// Each split is either a path string or an object with `path`, `start`, `length` and `hosts` fields.
pub trait SplitSource: Component {
    fn get_splits(&mut self, ctx: &JobContext) -> Result<Vec<Value>, BoxError>;
}
