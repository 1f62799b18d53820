//! Instantiation of native classes by name.
//!
//! Class names are the only thing shipped to tasks, every task process registers the classes it can run in a
//! [NativeCatalog] at startup and the framework creates a fresh instance for every task attempt.

use std::{collections::HashMap, sync::Arc};

use crate::{
    error::HostError,
    native::{InputFormat, Mapper, Partitioner, RawComparator, Reducer},
};

type Factory<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

/// Catalog of native classes known to a process.
#[derive(Default, Clone)]
pub struct NativeCatalog {
    input_formats: HashMap<String, Factory<dyn InputFormat>>,
    mappers: HashMap<String, Factory<dyn Mapper>>,
    reducers: HashMap<String, Factory<dyn Reducer>>,
    partitioners: HashMap<String, Factory<dyn Partitioner>>,
    comparators: HashMap<String, Factory<dyn RawComparator>>,
}

impl NativeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_input_format<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn InputFormat> + Send + Sync + 'static,
    {
        self.input_formats.insert(name.into(), Arc::new(factory));
    }

    pub fn register_mapper<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Mapper> + Send + Sync + 'static,
    {
        self.mappers.insert(name.into(), Arc::new(factory));
    }

    /// Registers reducer class, combiners are registered here too.
    pub fn register_reducer<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Reducer> + Send + Sync + 'static,
    {
        self.reducers.insert(name.into(), Arc::new(factory));
    }

    pub fn register_partitioner<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Partitioner> + Send + Sync + 'static,
    {
        self.partitioners.insert(name.into(), Arc::new(factory));
    }

    /// Registers comparator class usable both for sorting and grouping.
    pub fn register_comparator<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn RawComparator> + Send + Sync + 'static,
    {
        self.comparators.insert(name.into(), Arc::new(factory));
    }

    pub fn new_input_format(&self, name: &str) -> Result<Box<dyn InputFormat>, HostError> {
        instantiate(&self.input_formats, "input format", name)
    }

    pub fn new_mapper(&self, name: &str) -> Result<Box<dyn Mapper>, HostError> {
        instantiate(&self.mappers, "mapper", name)
    }

    pub fn new_reducer(&self, name: &str) -> Result<Box<dyn Reducer>, HostError> {
        instantiate(&self.reducers, "reducer", name)
    }

    pub fn new_partitioner(&self, name: &str) -> Result<Box<dyn Partitioner>, HostError> {
        instantiate(&self.partitioners, "partitioner", name)
    }

    pub fn new_comparator(&self, name: &str) -> Result<Box<dyn RawComparator>, HostError> {
        instantiate(&self.comparators, "comparator", name)
    }
}

fn instantiate<T: ?Sized>(
    factories: &HashMap<String, Factory<T>>,
    kind: &'static str,
    name: &str,
) -> Result<Box<T>, HostError> {
    let factory = factories.get(name).ok_or_else(|| HostError::UnknownClass {
        kind,
        name: name.to_string(),
    })?;
    log::debug!("instantiating {} {}", kind, name);
    Ok(factory())
}
