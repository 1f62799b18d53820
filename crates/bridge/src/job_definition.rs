//! Declarative assembly of a single job.

use std::{
    cell::{Ref, RefCell},
    fmt,
    rc::Rc,
};

use itertools::Itertools;
use jobwire_host::{
    formats::{self, InputFormatClass, OutputFormatClass},
    DatumType, Job,
};
use log::{debug, info};

use crate::{
    context::{JobSpec, ProxyAdapters},
    error::ConfigError,
    format::{resolve_input_format, resolve_output_format},
    role::{ComponentClass, Role, RECORD_READER_CLASS},
};

/// Separator of multiple input paths in configuration.
pub const PATH_SEPARATOR: &str = ",";

/// Input paths of a job, either one already delimited string or a list of paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths(Vec<String>);

impl InputPaths {
    pub fn joined(&self) -> String {
        self.0.iter().join(PATH_SEPARATOR)
    }
}

impl From<&str> for InputPaths {
    fn from(paths: &str) -> Self {
        InputPaths(vec![paths.to_string()])
    }
}

impl From<String> for InputPaths {
    fn from(paths: String) -> Self {
        InputPaths(vec![paths])
    }
}

impl From<Vec<String>> for InputPaths {
    fn from(paths: Vec<String>) -> Self {
        InputPaths(paths)
    }
}

impl From<&[String]> for InputPaths {
    fn from(paths: &[String]) -> Self {
        InputPaths(paths.to_vec())
    }
}

impl From<Vec<&str>> for InputPaths {
    fn from(paths: Vec<&str>) -> Self {
        InputPaths(paths.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for InputPaths {
    fn from(paths: &[&str]) -> Self {
        InputPaths(paths.iter().map(|path| path.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for InputPaths {
    fn from(paths: [&str; N]) -> Self {
        InputPaths(paths.into_iter().map(str::to_string).collect())
    }
}

/// Format of job input or output, given by a native descriptor or a symbolic name like `sequence_file`.
#[derive(Debug, Clone, PartialEq)]
pub enum Format<C: 'static> {
    Named(String),
    Class(&'static C),
}

impl<C: 'static> Default for Format<C> {
    fn default() -> Self {
        Format::Named("text".to_string())
    }
}

impl<C: 'static> From<&str> for Format<C> {
    fn from(symbol: &str) -> Self {
        Format::Named(symbol.to_string())
    }
}

impl<C: 'static> From<String> for Format<C> {
    fn from(symbol: String) -> Self {
        Format::Named(symbol)
    }
}

impl From<&'static InputFormatClass> for Format<InputFormatClass> {
    fn from(class: &'static InputFormatClass) -> Self {
        Format::Class(class)
    }
}

impl From<&'static OutputFormatClass> for Format<OutputFormatClass> {
    fn from(class: &'static OutputFormatClass) -> Self {
        Format::Class(class)
    }
}

/// Value of a job property. The variant selects the typed configuration setter.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl PropertyValue {
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(x) => write!(f, "{}", x),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! integer_property {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PropertyValue {
                fn from(value: $t) -> Self {
                    PropertyValue::Integer(value as i64)
                }
            }
        )*
    };
}

integer_property!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(x) => PropertyValue::Integer(x),
            Err(_) => PropertyValue::Text(value.to_string()),
        }
    }
}

impl From<usize> for PropertyValue {
    fn from(value: usize) -> Self {
        PropertyValue::from(value as u64)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        PropertyValue::Float(value as f64)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

/// Assembly surface of one job.
///
/// Registering a component for a role persists its class name under the role key and installs the role adapter as
/// the native class, so tasks reconstruct the component from configuration alone.
pub struct JobDefinition {
    spec: Rc<RefCell<JobSpec>>,
    adapters: Rc<ProxyAdapters>,
}

impl JobDefinition {
    pub fn new(spec: Rc<RefCell<JobSpec>>, adapters: Rc<ProxyAdapters>) -> Self {
        JobDefinition { spec, adapters }
    }

    pub fn name(&self) -> String {
        self.spec.borrow().name().to_string()
    }

    pub fn spec(&self) -> &Rc<RefCell<JobSpec>> {
        &self.spec
    }

    /// Native job assembled so far.
    pub fn job(&self) -> Ref<'_, Job> {
        Ref::map(self.spec.borrow(), JobSpec::job)
    }

    /// Sets input paths and input format.
    ///
    /// Paths are passed to the format's path setter if it has one, the input format class is set in any case.
    pub fn input(
        &mut self,
        paths: impl Into<InputPaths>,
        format: impl Into<Format<InputFormatClass>>,
    ) -> Result<&mut Self, ConfigError> {
        let format = resolve_input_format(&format.into())?;
        let paths = paths.into().joined();
        {
            let mut spec = self.spec.borrow_mut();
            let job = spec.job_mut();
            if let Some(set_input_paths) = format.set_input_paths {
                set_input_paths(job, &paths);
            }
            job.set_input_format_class(format.name);
            info!("job {}: input {} from {}", job.name(), format.simple_name(), paths);
        }
        Ok(self)
    }

    /// Sets output format and, if `dir` is given, output directory.
    pub fn output(
        &mut self,
        dir: Option<&str>,
        format: impl Into<Format<OutputFormatClass>>,
    ) -> Result<&mut Self, ConfigError> {
        let format = resolve_output_format(&format.into())?;
        {
            let mut spec = self.spec.borrow_mut();
            let job = spec.job_mut();
            if let Some(dir) = dir {
                let set_output_path = format.set_output_path.unwrap_or(formats::set_output_path);
                set_output_path(job, dir);
            }
            job.set_output_format_class(format.name);
            info!("job {}: output {} to {}", job.name(), format.simple_name(), dir.unwrap_or("(format managed)"));
        }
        Ok(self)
    }

    /// Sets job property with the setter matching the value type.
    pub fn set(&mut self, property: &str, value: impl Into<PropertyValue>) -> &mut Self {
        {
            let mut spec = self.spec.borrow_mut();
            let configuration = spec.job_mut().configuration_mut();
            match value.into() {
                PropertyValue::Integer(x) => configuration.set_int(property, x),
                PropertyValue::Float(x) => configuration.set_float(property, x),
                PropertyValue::Boolean(b) => configuration.set_boolean(property, b),
                PropertyValue::Text(s) => configuration.set(property, s),
            }
        }
        self
    }

    /// Registers component class for `role`.
    pub fn register(&mut self, role: Role, class: ComponentClass) -> Result<&mut Self, ConfigError> {
        let adapter = self.adapters.get(role)?;
        {
            let mut spec = self.spec.borrow_mut();
            let job = spec.job_mut();
            job.configuration_mut().set(role.key(), class.name());
            install_adapter(job, role, adapter);
            debug!("job {}: {} {} bridged through {}", job.name(), role, class, adapter);
            spec.classes.insert(role, class);
        }
        Ok(self)
    }

    /// Component class registered for `role`.
    pub fn registered(&self, role: Role) -> Option<ComponentClass> {
        self.spec.borrow().class(role).cloned()
    }

    pub fn mapper(&mut self, class: ComponentClass) -> Result<&mut Self, ConfigError> {
        self.register(Role::Mapper, class)
    }

    pub fn mapper_class(&self) -> Option<ComponentClass> {
        self.registered(Role::Mapper)
    }

    pub fn reducer(&mut self, class: ComponentClass) -> Result<&mut Self, ConfigError> {
        self.register(Role::Reducer, class)
    }

    pub fn reducer_class(&self) -> Option<ComponentClass> {
        self.registered(Role::Reducer)
    }

    pub fn combiner(&mut self, class: ComponentClass) -> Result<&mut Self, ConfigError> {
        self.register(Role::Combiner, class)
    }

    pub fn combiner_class(&self) -> Option<ComponentClass> {
        self.registered(Role::Combiner)
    }

    pub fn partitioner(&mut self, class: ComponentClass) -> Result<&mut Self, ConfigError> {
        self.register(Role::Partitioner, class)
    }

    pub fn partitioner_class(&self) -> Option<ComponentClass> {
        self.registered(Role::Partitioner)
    }

    pub fn grouping_comparator(&mut self, class: ComponentClass) -> Result<&mut Self, ConfigError> {
        self.register(Role::GroupingComparator, class)
    }

    pub fn grouping_comparator_class(&self) -> Option<ComponentClass> {
        self.registered(Role::GroupingComparator)
    }

    pub fn sort_comparator(&mut self, class: ComponentClass) -> Result<&mut Self, ConfigError> {
        self.register(Role::SortComparator, class)
    }

    pub fn sort_comparator_class(&self) -> Option<ComponentClass> {
        self.registered(Role::SortComparator)
    }

    /// Registers split source as the input format.
    ///
    /// Records of its splits are read by the reader set with [record_reader](Self::record_reader).
    pub fn input_format(&mut self, class: ComponentClass) -> Result<&mut Self, ConfigError> {
        self.register(Role::InputFormat, class)
    }

    pub fn input_format_class(&self) -> Option<ComponentClass> {
        self.registered(Role::InputFormat)
    }

    /// Sets native record reader created for every split of a bridged input format.
    pub fn record_reader(&mut self, class: ComponentClass) -> &mut Self {
        {
            let mut spec = self.spec.borrow_mut();
            spec.job_mut().configuration_mut().set(RECORD_READER_CLASS, class.name());
            spec.record_reader = Some(class);
        }
        self
    }

    pub fn record_reader_class(&self) -> Option<ComponentClass> {
        self.spec.borrow().record_reader.clone()
    }

    pub fn map_output_key(&mut self, datum_type: DatumType) -> &mut Self {
        {
            let mut spec = self.spec.borrow_mut();
            spec.job_mut().set_map_output_key_class(datum_type);
            spec.map_output_key = Some(datum_type);
        }
        self
    }

    pub fn map_output_key_class(&self) -> Option<DatumType> {
        self.spec.borrow().map_output_key
    }

    pub fn map_output_value(&mut self, datum_type: DatumType) -> &mut Self {
        {
            let mut spec = self.spec.borrow_mut();
            spec.job_mut().set_map_output_value_class(datum_type);
            spec.map_output_value = Some(datum_type);
        }
        self
    }

    pub fn map_output_value_class(&self) -> Option<DatumType> {
        self.spec.borrow().map_output_value
    }

    pub fn output_key(&mut self, datum_type: DatumType) -> &mut Self {
        {
            let mut spec = self.spec.borrow_mut();
            spec.job_mut().set_output_key_class(datum_type);
            spec.output_key = Some(datum_type);
        }
        self
    }

    pub fn output_key_class(&self) -> Option<DatumType> {
        self.spec.borrow().output_key
    }

    pub fn output_value(&mut self, datum_type: DatumType) -> &mut Self {
        {
            let mut spec = self.spec.borrow_mut();
            spec.job_mut().set_output_value_class(datum_type);
            spec.output_value = Some(datum_type);
        }
        self
    }

    pub fn output_value_class(&self) -> Option<DatumType> {
        self.spec.borrow().output_value
    }

    /// Gives direct access to the native job for settings not modeled here.
    pub fn raw<R>(&mut self, block: impl FnOnce(&mut Job) -> R) -> R {
        block(self.spec.borrow_mut().job_mut())
    }
}

fn install_adapter(job: &mut Job, role: Role, adapter: &str) {
    match role {
        Role::InputFormat => job.set_input_format_class(adapter),
        Role::Mapper => job.set_mapper_class(adapter),
        Role::Combiner => job.set_combiner_class(adapter),
        Role::Partitioner => job.set_partitioner_class(adapter),
        Role::SortComparator => job.set_sort_comparator_class(adapter),
        Role::GroupingComparator => job.set_grouping_comparator_class(adapter),
        Role::Reducer => job.set_reducer_class(adapter),
    }
}
