//! Bridgeable roles and references to the classes registered for them.

use std::{any, fmt, str::FromStr};

use crate::error::ConfigError;

/// Configuration key naming the record reader created for every split of a bridged input format.
pub const RECORD_READER_CLASS: &str = "record_reader_class";

/// Responsibility of a user component inside a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    InputFormat,
    Mapper,
    Combiner,
    Partitioner,
    SortComparator,
    GroupingComparator,
    Reducer,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::InputFormat,
        Role::Mapper,
        Role::Combiner,
        Role::Partitioner,
        Role::SortComparator,
        Role::GroupingComparator,
        Role::Reducer,
    ];

    /// Identifier used by job definitions and scripts.
    pub fn identifier(&self) -> &'static str {
        match self {
            Role::InputFormat => "input_format",
            Role::Mapper => "mapper",
            Role::Combiner => "combiner",
            Role::Partitioner => "partitioner",
            Role::SortComparator => "sort_comparator",
            Role::GroupingComparator => "grouping_comparator",
            Role::Reducer => "reducer",
        }
    }

    /// Configuration key under which the class name of the role is persisted.
    pub fn key(&self) -> &'static str {
        match self {
            Role::InputFormat => "input_format_class",
            Role::Mapper => "mapper_class",
            Role::Combiner => "combiner_class",
            Role::Partitioner => "partitioner_class",
            Role::SortComparator => "sort_comparator_class",
            Role::GroupingComparator => "grouping_comparator_class",
            Role::Reducer => "reducer_class",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for Role {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.identifier() == s)
            .ok_or_else(|| ConfigError::UnknownRole(s.to_string()))
    }
}

/// Reference to a user component class.
///
/// Only the name crosses the process boundary, tasks find the constructor by this name in their
/// [Registry](crate::registry::Registry). Names derived from Rust types use [std::any::type_name], so the driver and
/// the tasks must run the same build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentClass {
    name: String,
}

impl ComponentClass {
    /// Class of a Rust type.
    pub fn of<T: ?Sized + 'static>() -> Self {
        ComponentClass {
            name: any::type_name::<T>().to_string(),
        }
    }

    /// Class with an explicit name.
    pub fn named(name: impl Into<String>) -> Self {
        ComponentClass { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
