//! Name to constructor registry of components a task process can run.

use std::{any, collections::HashMap, sync::Arc};

use jobwire_host::native::RecordReader;

use crate::{
    component::{Compare, Map, Partition, Reduce, SplitSource},
    role::Role,
};

type Constructor<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

/// Registry of component constructors.
///
/// Every process which runs tasks populates a registry at startup with all components the deployment supports.
/// Names default to [std::any::type_name] of the component type, matching
/// [ComponentClass::of](crate::role::ComponentClass::of) used by job definitions.
#[derive(Default, Clone)]
pub struct Registry {
    mappers: HashMap<String, Constructor<dyn Map>>,
    reducers: HashMap<String, Constructor<dyn Reduce>>,
    partitioners: HashMap<String, Constructor<dyn Partition>>,
    comparators: HashMap<String, Constructor<dyn Compare>>,
    split_sources: HashMap<String, Constructor<dyn SplitSource>>,
    record_readers: HashMap<String, Constructor<dyn RecordReader>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_mapper<M: Map + Default + 'static>(&mut self) -> &mut Self {
        self.register_mapper_with(any::type_name::<M>(), || Box::new(M::default()) as Box<dyn Map>)
    }

    pub fn register_mapper_with<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Map> + Send + Sync + 'static,
    {
        self.mappers.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Registers reducer, which may also be used as a combiner.
    pub fn register_reducer<R: Reduce + Default + 'static>(&mut self) -> &mut Self {
        self.register_reducer_with(any::type_name::<R>(), || Box::new(R::default()) as Box<dyn Reduce>)
    }

    pub fn register_reducer_with<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Reduce> + Send + Sync + 'static,
    {
        self.reducers.insert(name.into(), Arc::new(constructor));
        self
    }

    pub fn register_partitioner<P: Partition + Default + 'static>(&mut self) -> &mut Self {
        self.register_partitioner_with(any::type_name::<P>(), || Box::new(P::default()) as Box<dyn Partition>)
    }

    pub fn register_partitioner_with<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Partition> + Send + Sync + 'static,
    {
        self.partitioners.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Registers comparator, usable both as sort and grouping comparator.
    pub fn register_comparator<C: Compare + Default + 'static>(&mut self) -> &mut Self {
        self.register_comparator_with(any::type_name::<C>(), || Box::new(C::default()) as Box<dyn Compare>)
    }

    pub fn register_comparator_with<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Compare> + Send + Sync + 'static,
    {
        self.comparators.insert(name.into(), Arc::new(constructor));
        self
    }

    pub fn register_split_source<S: SplitSource + Default + 'static>(&mut self) -> &mut Self {
        self.register_split_source_with(any::type_name::<S>(), || Box::new(S::default()) as Box<dyn SplitSource>)
    }

    pub fn register_split_source_with<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn SplitSource> + Send + Sync + 'static,
    {
        self.split_sources.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Registers native record reader created for splits of bridged input formats.
    pub fn register_record_reader<R: RecordReader + Default + 'static>(&mut self) -> &mut Self {
        self.register_record_reader_with(any::type_name::<R>(), || Box::new(R::default()) as Box<dyn RecordReader>)
    }

    pub fn register_record_reader_with<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn RecordReader> + Send + Sync + 'static,
    {
        self.record_readers.insert(name.into(), Arc::new(constructor));
        self
    }

    pub fn new_mapper(&self, name: &str) -> Option<Box<dyn Map>> {
        self.mappers.get(name).map(|constructor| constructor())
    }

    pub fn new_reducer(&self, name: &str) -> Option<Box<dyn Reduce>> {
        self.reducers.get(name).map(|constructor| constructor())
    }

    pub fn new_partitioner(&self, name: &str) -> Option<Box<dyn Partition>> {
        self.partitioners.get(name).map(|constructor| constructor())
    }

    pub fn new_comparator(&self, name: &str) -> Option<Box<dyn Compare>> {
        self.comparators.get(name).map(|constructor| constructor())
    }

    pub fn new_split_source(&self, name: &str) -> Option<Box<dyn SplitSource>> {
        self.split_sources.get(name).map(|constructor| constructor())
    }

    pub fn new_record_reader(&self, name: &str) -> Option<Box<dyn RecordReader>> {
        self.record_readers.get(name).map(|constructor| constructor())
    }

    /// Whether a component with `name` can be resolved for `role`.
    pub fn contains(&self, role: Role, name: &str) -> bool {
        match role {
            Role::Mapper => self.mappers.contains_key(name),
            Role::Reducer | Role::Combiner => self.reducers.contains_key(name),
            Role::Partitioner => self.partitioners.contains_key(name),
            Role::SortComparator | Role::GroupingComparator => self.comparators.contains_key(name),
            Role::InputFormat => self.split_sources.contains_key(name),
        }
    }
}
