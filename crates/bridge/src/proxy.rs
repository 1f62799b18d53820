//! Native adapters which forward framework calls to user components.
//!
//! The framework instantiates adapters by name in task processes, see [install_adapters]. Every adapter owns an
//! [InstanceContainer] which resolves the user component from the class name persisted in job configuration.

use std::{cmp::Ordering, sync::Arc};

use jobwire_host::{
    catalog::NativeCatalog,
    job,
    native::{InputFormat, Mapper, Partitioner, RawComparator, RecordReader, Reducer},
    Configuration, Datum, DatumType, HostError, InputSplit, JobContext, TaskContext, TaskError,
};
use log::debug;

use crate::{
    component::{Compare, Emitter, Reduce},
    container::{
        attempt_label, CombinerRole, GroupingComparatorRole, InputFormatRole, InstanceContainer, MapperRole,
        PartitionerRole, ReducerRole, RoleBinding, SortComparatorRole,
    },
    convert::{to_datum, to_split, to_value},
    error::BridgeError,
    registry::Registry,
    role::{Role, RECORD_READER_CLASS},
};

pub const INPUT_FORMAT_PROXY: &str = "jobwire.InputFormatProxy";
pub const MAPPER_PROXY: &str = "jobwire.MapperProxy";
pub const COMBINER_PROXY: &str = "jobwire.CombinerProxy";
pub const PARTITIONER_PROXY: &str = "jobwire.PartitionerProxy";
pub const SORT_COMPARATOR_PROXY: &str = "jobwire.SortComparatorProxy";
pub const GROUPING_COMPARATOR_PROXY: &str = "jobwire.GroupingComparatorProxy";
pub const REDUCER_PROXY: &str = "jobwire.ReducerProxy";

/// Native class name of the adapter for `role`.
pub fn adapter_name(role: Role) -> &'static str {
    match role {
        Role::InputFormat => INPUT_FORMAT_PROXY,
        Role::Mapper => MAPPER_PROXY,
        Role::Combiner => COMBINER_PROXY,
        Role::Partitioner => PARTITIONER_PROXY,
        Role::SortComparator => SORT_COMPARATOR_PROXY,
        Role::GroupingComparator => GROUPING_COMPARATOR_PROXY,
        Role::Reducer => REDUCER_PROXY,
    }
}

/// Registers adapters of all roles in `catalog`, each resolving components from `registry`.
pub fn install_adapters(catalog: &mut NativeCatalog, registry: Arc<Registry>) {
    let r = registry.clone();
    catalog.register_input_format(INPUT_FORMAT_PROXY, move || Box::new(InputFormatProxy::new(r.clone())));
    let r = registry.clone();
    catalog.register_mapper(MAPPER_PROXY, move || Box::new(MapperProxy::new(r.clone())));
    let r = registry.clone();
    catalog.register_reducer(COMBINER_PROXY, move || Box::new(CombinerProxy::new(r.clone())));
    let r = registry.clone();
    catalog.register_partitioner(PARTITIONER_PROXY, move || Box::new(PartitionerProxy::new(r.clone())));
    let r = registry.clone();
    catalog.register_comparator(SORT_COMPARATOR_PROXY, move || {
        Box::new(SortComparatorProxy::new(r.clone()))
    });
    let r = registry.clone();
    catalog.register_comparator(GROUPING_COMPARATOR_PROXY, move || {
        Box::new(GroupingComparatorProxy::new(r.clone()))
    });
    catalog.register_reducer(REDUCER_PROXY, move || Box::new(ReducerProxy::new(registry.clone())));
}

/// Converts emitted records into native output of the task.
#[derive(Default)]
struct OutputWriter {
    emitter: Emitter,
    classes: Option<(Option<DatumType>, Option<DatumType>)>,
}

impl OutputWriter {
    /// Writes emitted records to `ctx`. Either every record is written or none, the emitter is empty afterwards.
    fn flush(
        &mut self,
        role: Role,
        read_classes: fn(&Configuration) -> Result<(Option<DatumType>, Option<DatumType>), HostError>,
        ctx: &mut TaskContext,
    ) -> Result<(), BridgeError> {
        if self.emitter.is_empty() {
            return Ok(());
        }
        let emitted = self.emitter.drain().collect::<Vec<_>>();
        let (key_class, value_class) = match self.classes {
            Some(classes) => classes,
            None => {
                let classes = read_classes(ctx.configuration()).map_err(|source| BridgeError::Configuration {
                    role,
                    attempt: ctx.attempt().cloned(),
                    source,
                })?;
                *self.classes.insert(classes)
            }
        };
        let conversion = |message: String| BridgeError::Conversion {
            role,
            attempt: ctx.attempt().cloned(),
            message,
        };
        let records = emitted
            .into_iter()
            .map(|(key, value)| {
                let key = to_datum(key, key_class).map_err(|e| conversion(format!("key {e}")))?;
                let value = to_datum(value, value_class).map_err(|e| conversion(format!("value {e}")))?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>, BridgeError>>()?;
        for (key, value) in records {
            ctx.write(key, value);
        }
        Ok(())
    }

    /// Drops records emitted by a failed call.
    fn discard(&mut self) {
        self.emitter.clear();
    }
}

/// Adapter of the mapper role.
pub struct MapperProxy {
    container: InstanceContainer<MapperRole>,
    output: OutputWriter,
}

impl MapperProxy {
    pub fn new(registry: Arc<Registry>) -> Self {
        MapperProxy {
            container: InstanceContainer::new(registry),
            output: OutputWriter::default(),
        }
    }

    pub fn container(&self) -> &InstanceContainer<MapperRole> {
        &self.container
    }
}

impl Mapper for MapperProxy {
    fn map(&mut self, key: Datum, value: Datum, ctx: &mut TaskContext) -> Result<(), TaskError> {
        let emitter = &mut self.output.emitter;
        let result = self
            .container
            .invoke(ctx.job(), "map", |mapper| mapper.map(to_value(&key), to_value(&value), emitter));
        if let Err(err) = result {
            self.output.discard();
            return Err(err.into());
        }
        self.output.flush(Role::Mapper, job::map_output_classes, ctx)?;
        Ok(())
    }

    fn cleanup(&mut self, ctx: &mut TaskContext) -> Result<(), TaskError> {
        Ok(self.container.finalize(ctx.job())?)
    }
}

/// Adapter of a reducing role, either reducer or combiner.
pub struct ReduceProxy<B: RoleBinding<Component = dyn Reduce>> {
    container: InstanceContainer<B>,
    output: OutputWriter,
}

pub type ReducerProxy = ReduceProxy<ReducerRole>;
pub type CombinerProxy = ReduceProxy<CombinerRole>;

impl<B: RoleBinding<Component = dyn Reduce>> ReduceProxy<B> {
    pub fn new(registry: Arc<Registry>) -> Self {
        ReduceProxy {
            container: InstanceContainer::new(registry),
            output: OutputWriter::default(),
        }
    }

    pub fn container(&self) -> &InstanceContainer<B> {
        &self.container
    }
}

impl<B: RoleBinding<Component = dyn Reduce>> Reducer for ReduceProxy<B> {
    fn reduce(
        &mut self,
        key: Datum,
        values: &mut dyn Iterator<Item = Datum>,
        ctx: &mut TaskContext,
    ) -> Result<(), TaskError> {
        let emitter = &mut self.output.emitter;
        let mut values = values.map(|value| to_value(&value));
        let result = self
            .container
            .invoke(ctx.job(), "reduce", |reducer| reducer.reduce(to_value(&key), &mut values, emitter));
        if let Err(err) = result {
            self.output.discard();
            return Err(err.into());
        }
        // Combiner output is map output again.
        let read_classes = match B::ROLE {
            Role::Combiner => job::map_output_classes,
            _ => job::output_classes,
        };
        self.output.flush(B::ROLE, read_classes, ctx)?;
        Ok(())
    }

    fn cleanup(&mut self, ctx: &mut TaskContext) -> Result<(), TaskError> {
        Ok(self.container.finalize(ctx.job())?)
    }
}

/// Adapter of the partitioner role.
pub struct PartitionerProxy {
    container: InstanceContainer<PartitionerRole>,
}

impl PartitionerProxy {
    pub fn new(registry: Arc<Registry>) -> Self {
        PartitionerProxy {
            container: InstanceContainer::new(registry),
        }
    }

    pub fn container(&self) -> &InstanceContainer<PartitionerRole> {
        &self.container
    }
}

impl Partitioner for PartitionerProxy {
    fn get_partition(
        &self,
        key: &Datum,
        value: &Datum,
        num_partitions: u32,
        ctx: &TaskContext,
    ) -> Result<u32, TaskError> {
        let (key, value) = (to_value(key), to_value(value));
        let partition = self
            .container
            .invoke(ctx.job(), "partition", |partitioner| partitioner.partition(&key, &value, num_partitions))?;
        if partition >= num_partitions {
            return Err(BridgeError::Conversion {
                role: Role::Partitioner,
                attempt: ctx.attempt().cloned(),
                message: format!("partition {} not in 0..{}", partition, num_partitions),
            }
            .into());
        }
        Ok(partition)
    }

    fn close(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        Ok(self.container.finalize(ctx.job())?)
    }
}

/// Adapter of a comparing role, either sort or grouping comparator.
pub struct CompareProxy<B: RoleBinding<Component = dyn Compare>> {
    container: InstanceContainer<B>,
}

pub type SortComparatorProxy = CompareProxy<SortComparatorRole>;
pub type GroupingComparatorProxy = CompareProxy<GroupingComparatorRole>;

impl<B: RoleBinding<Component = dyn Compare>> CompareProxy<B> {
    pub fn new(registry: Arc<Registry>) -> Self {
        CompareProxy {
            container: InstanceContainer::new(registry),
        }
    }

    pub fn container(&self) -> &InstanceContainer<B> {
        &self.container
    }
}

impl<B: RoleBinding<Component = dyn Compare>> RawComparator for CompareProxy<B> {
    fn compare(&self, a: &Datum, b: &Datum, ctx: &TaskContext) -> Result<Ordering, TaskError> {
        let (a, b) = (to_value(a), to_value(b));
        Ok(self.container.invoke(ctx.job(), "compare", |comparator| comparator.compare(&a, &b))?)
    }

    fn close(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        Ok(self.container.finalize(ctx.job())?)
    }
}

/// Adapter of the input format role.
///
/// Splits come from the user component, while record readers are native classes named by
/// [RECORD_READER_CLASS] and created fresh for every split without lifecycle bridging.
pub struct InputFormatProxy {
    container: InstanceContainer<InputFormatRole>,
}

impl InputFormatProxy {
    pub fn new(registry: Arc<Registry>) -> Self {
        InputFormatProxy {
            container: InstanceContainer::new(registry),
        }
    }

    pub fn container(&self) -> &InstanceContainer<InputFormatRole> {
        &self.container
    }
}

impl InputFormat for InputFormatProxy {
    fn get_splits(&mut self, ctx: &JobContext) -> Result<Vec<InputSplit>, TaskError> {
        let values = self.container.invoke(ctx, "get_splits", |source| source.get_splits(ctx))?;
        let splits = values
            .into_iter()
            .map(|value| {
                to_split(value).map_err(|e| BridgeError::Conversion {
                    role: Role::InputFormat,
                    attempt: ctx.attempt().cloned(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("{} splits computed for {}", splits.len(), attempt_label(ctx));
        Ok(splits)
    }

    fn create_record_reader(&self, _split: &InputSplit, ctx: &TaskContext) -> Result<Box<dyn RecordReader>, TaskError> {
        let unresolved = |class: Option<&str>| BridgeError::ClassResolution {
            role: Role::InputFormat,
            key: RECORD_READER_CLASS,
            class: class.map(str::to_string),
            attempt: ctx.attempt().cloned(),
        };
        let name = ctx
            .configuration()
            .get(RECORD_READER_CLASS)
            .ok_or_else(|| unresolved(None))?;
        let reader = self
            .container
            .registry()
            .new_record_reader(name)
            .ok_or_else(|| unresolved(Some(name)))?;
        debug!("created record reader {} in {}", name, attempt_label(ctx.job()));
        Ok(reader)
    }

    fn cleanup(&mut self, ctx: &JobContext) -> Result<(), TaskError> {
        Ok(self.container.finalize(ctx)?)
    }
}
