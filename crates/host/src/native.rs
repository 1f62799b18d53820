//! Interfaces which pluggable job classes implement.
//!
//! The framework instantiates implementations by class name inside task processes, see
//! [NativeCatalog](crate::catalog::NativeCatalog).

use std::cmp::Ordering;

use crate::{
    context::{JobContext, TaskContext},
    datum::Datum,
    error::TaskError,
    split::InputSplit,
};

/// Splits job input and creates readers for the splits.
pub trait InputFormat: Send {
    /// Computes splits of the job input. Called once per job.
    fn get_splits(&mut self, ctx: &JobContext) -> Result<Vec<InputSplit>, TaskError>;

    /// Creates reader for a single split. Called once per split.
    fn create_record_reader(&self, split: &InputSplit, ctx: &TaskContext) -> Result<Box<dyn RecordReader>, TaskError>;

    /// Called after splits are computed.
    fn cleanup(&mut self, _ctx: &JobContext) -> Result<(), TaskError> {
        Ok(())
    }
}

/// Reads records of one split.
pub trait RecordReader: Send {
    fn initialize(&mut self, split: &InputSplit, ctx: &TaskContext) -> Result<(), TaskError>;

    /// Returns next record or `None` when the split is exhausted.
    fn next_key_value(&mut self) -> Result<Option<(Datum, Datum)>, TaskError>;

    fn close(&mut self) -> Result<(), TaskError> {
        Ok(())
    }
}

pub trait Mapper: Send {
    /// Called once at the beginning of the task.
    fn setup(&mut self, _ctx: &mut TaskContext) -> Result<(), TaskError> {
        Ok(())
    }

    /// Called once for each input record.
    fn map(&mut self, key: Datum, value: Datum, ctx: &mut TaskContext) -> Result<(), TaskError>;

    /// Called once at the end of the task.
    fn cleanup(&mut self, _ctx: &mut TaskContext) -> Result<(), TaskError> {
        Ok(())
    }

    /// Runs the whole task over records of `reader`.
    fn run(&mut self, reader: &mut dyn RecordReader, ctx: &mut TaskContext) -> Result<(), TaskError> {
        self.setup(ctx)?;
        while let Some((key, value)) = reader.next_key_value()? {
            self.map(key, value, ctx)?;
        }
        self.cleanup(ctx)
    }
}

/// Reducer, also used for combiners.
pub trait Reducer: Send {
    fn setup(&mut self, _ctx: &mut TaskContext) -> Result<(), TaskError> {
        Ok(())
    }

    /// Called once for each group of values sharing a key.
    fn reduce(&mut self, key: Datum, values: &mut dyn Iterator<Item = Datum>, ctx: &mut TaskContext)
        -> Result<(), TaskError>;

    fn cleanup(&mut self, _ctx: &mut TaskContext) -> Result<(), TaskError> {
        Ok(())
    }
}

/// Assigns map output records to reduce tasks.
///
/// One instance may be shared by several threads of a task.
pub trait Partitioner: Send + Sync {
    fn get_partition(&self, key: &Datum, value: &Datum, num_partitions: u32, ctx: &TaskContext)
        -> Result<u32, TaskError>;

    fn close(&self, _ctx: &TaskContext) -> Result<(), TaskError> {
        Ok(())
    }
}

/// Orders keys for sorting and grouping.
///
/// One instance may be shared by several threads of a task.
pub trait RawComparator: Send + Sync {
    fn compare(&self, a: &Datum, b: &Datum, ctx: &TaskContext) -> Result<Ordering, TaskError>;

    fn close(&self, _ctx: &TaskContext) -> Result<(), TaskError> {
        Ok(())
    }
}
