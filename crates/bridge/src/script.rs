//! Declarative job scripts in YAML.
//!
//! ```yaml
//! jobs:
//!   - name: wordcount
//!     input: { paths: $1, format: text }
//!     output: { dir: $2 }
//!     mapper: wordcount::WordMapper
//!     reducer: wordcount::SumReducer
//!     output_key: text
//!     output_value: long
//!     set:
//!       mapreduce.job.reduces: 4
//! ```
//!
//! A string of the form `$N` stands for the N-th driver argument, counting from 1. Role entries are keyed by role
//! identifier and hold component class names.

use std::{collections::BTreeMap, path::Path, str::FromStr};

use jobwire_host::DatumType;
use log::warn;
use serde::Deserialize;

use crate::{
    context::ConfigurationContext,
    definition::ConfigurationDefinition,
    error::ConfigError,
    job_definition::{InputPaths, JobDefinition, PropertyValue},
    role::{ComponentClass, Role},
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YamlScript {
    #[serde(default)]
    pub jobs: Vec<YamlJob>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YamlJob {
    pub name: String,
    #[serde(default)]
    pub input: Option<YamlInput>,
    #[serde(default)]
    pub output: Option<YamlOutput>,
    #[serde(default)]
    pub set: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub record_reader: Option<String>,
    #[serde(default)]
    pub map_output_key: Option<DatumType>,
    #[serde(default)]
    pub map_output_value: Option<DatumType>,
    #[serde(default)]
    pub output_key: Option<DatumType>,
    #[serde(default)]
    pub output_value: Option<DatumType>,
    /// Component classes keyed by role identifier.
    #[serde(flatten)]
    pub roles: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YamlInput {
    pub paths: YamlPaths,
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YamlOutput {
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YamlPaths {
    One(String),
    Many(Vec<String>),
}

fn default_format() -> String {
    "text".to_string()
}

impl FromStr for YamlScript {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(serde_yaml::from_str(text)?)
    }
}

impl YamlScript {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        std::fs::read_to_string(path)?.parse()
    }

    /// Defines all jobs of the script in `context`. Does nothing without a context.
    pub fn evaluate(&self, context: Option<&mut ConfigurationContext>) -> Result<(), ConfigError> {
        ConfigurationDefinition::new(context, |definition, arguments| {
            for job in &self.jobs {
                definition.job(&job.name, |builder| job.apply(builder, arguments))?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

impl YamlJob {
    fn apply(&self, builder: &mut JobDefinition, arguments: &[String]) -> Result<(), ConfigError> {
        if let Some(input) = &self.input {
            let paths = match &input.paths {
                YamlPaths::One(path) => InputPaths::from(substitute(path, arguments)?),
                YamlPaths::Many(paths) => InputPaths::from(
                    paths
                        .iter()
                        .map(|path| substitute(path, arguments))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
            };
            builder.input(paths, input.format.as_str())?;
        }
        if let Some(output) = &self.output {
            let dir = output.dir.as_deref().map(|dir| substitute(dir, arguments)).transpose()?;
            builder.output(dir.as_deref(), output.format.as_str())?;
        }
        for (property, value) in &self.set {
            builder.set(property, property_value(property, value, arguments)?);
        }
        for (identifier, class) in &self.roles {
            let role: Role = identifier.parse()?;
            builder.register(role, ComponentClass::named(class.as_str()))?;
        }
        if let Some(class) = &self.record_reader {
            builder.record_reader(ComponentClass::named(class.as_str()));
        }
        if let Some(datum_type) = self.map_output_key {
            builder.map_output_key(datum_type);
        }
        if let Some(datum_type) = self.map_output_value {
            builder.map_output_value(datum_type);
        }
        if let Some(datum_type) = self.output_key {
            builder.output_key(datum_type);
        }
        if let Some(datum_type) = self.output_value {
            builder.output_value(datum_type);
        }
        Ok(())
    }
}

/// Replaces `$N` with the N-th argument, other strings are kept as is.
pub fn substitute(value: &str, arguments: &[String]) -> Result<String, ConfigError> {
    let Some(index) = value.strip_prefix('$').and_then(|index| index.parse::<usize>().ok()) else {
        return Ok(value.to_string());
    };
    index
        .checked_sub(1)
        .and_then(|i| arguments.get(i))
        .cloned()
        .ok_or(ConfigError::MissingArgument {
            index,
            available: arguments.len(),
        })
}

fn property_value(
    property: &str,
    value: &serde_yaml::Value,
    arguments: &[String],
) -> Result<PropertyValue, ConfigError> {
    use serde_yaml::Value;

    let value = match value {
        Value::Bool(b) => PropertyValue::Boolean(*b),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(x), _) => PropertyValue::Integer(x),
            (None, Some(x)) => PropertyValue::from(x),
            _ => PropertyValue::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => PropertyValue::Text(substitute(s, arguments)?),
        other => {
            let text = serde_yaml::to_string(other)?.trim_end().to_string();
            warn!("property {} has no scalar value, storing it as {:?}", property, text);
            PropertyValue::Text(text)
        }
    };
    Ok(value)
}
