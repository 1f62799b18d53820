#![doc = include_str!("../../../README.md")]

pub mod component;
pub mod container;
pub mod context;
pub mod convert;
pub mod definition;
pub mod error;
pub mod format;
pub mod job_definition;
pub mod proxy;
pub mod registry;
pub mod role;
pub mod script;

pub use component::{Compare, Component, Emitter, Hooks, Map, Partition, Reduce, SplitSource};
pub use context::{ConfigurationContext, JobSpec};
pub use definition::ConfigurationDefinition;
pub use error::{BridgeError, ConfigError};
pub use job_definition::{Format, InputPaths, JobDefinition, PropertyValue};
pub use proxy::install_adapters;
pub use registry::Registry;
pub use role::{ComponentClass, Role, RECORD_READER_CLASS};
