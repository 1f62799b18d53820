//! Native job definition.

use crate::{configuration::Configuration, datum::DatumType, error::HostError};

pub const JOB_NAME: &str = "mapreduce.job.name";
pub const NUM_REDUCES: &str = "mapreduce.job.reduces";
pub const INPUT_FORMAT_CLASS: &str = "mapreduce.job.inputformat.class";
pub const OUTPUT_FORMAT_CLASS: &str = "mapreduce.job.outputformat.class";
pub const MAPPER_CLASS: &str = "mapreduce.job.map.class";
pub const COMBINER_CLASS: &str = "mapreduce.job.combine.class";
pub const REDUCER_CLASS: &str = "mapreduce.job.reduce.class";
pub const PARTITIONER_CLASS: &str = "mapreduce.job.partitioner.class";
pub const GROUPING_COMPARATOR_CLASS: &str = "mapreduce.job.output.group.comparator.class";
pub const SORT_COMPARATOR_CLASS: &str = "mapreduce.job.output.key.comparator.class";
pub const MAP_OUTPUT_KEY_CLASS: &str = "mapreduce.map.output.key.class";
pub const MAP_OUTPUT_VALUE_CLASS: &str = "mapreduce.map.output.value.class";
pub const OUTPUT_KEY_CLASS: &str = "mapreduce.job.output.key.class";
pub const OUTPUT_VALUE_CLASS: &str = "mapreduce.job.output.value.class";
pub const INPUT_DIR: &str = "mapreduce.input.fileinputformat.inputdir";
pub const OUTPUT_DIR: &str = "mapreduce.output.fileoutputformat.outputdir";

/// Native job.
///
/// Every choice made for a job is stored in its configuration, so tasks can be reconstructed from the serialized
/// configuration alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    configuration: Configuration,
}

impl Job {
    /// Creates job with a copy of `base` configuration.
    pub fn new(base: &Configuration, name: &str) -> Self {
        let mut configuration = base.clone();
        configuration.set(JOB_NAME, name);
        Job { configuration }
    }

    /// Restores job from a shipped configuration.
    pub fn from_configuration(configuration: Configuration) -> Self {
        Job { configuration }
    }

    pub fn name(&self) -> &str {
        self.configuration.get(JOB_NAME).unwrap_or_default()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    pub fn into_configuration(self) -> Configuration {
        self.configuration
    }

    pub fn set_num_reduce_tasks(&mut self, count: u32) {
        self.configuration.set_int(NUM_REDUCES, count as i64);
    }

    pub fn num_reduce_tasks(&self) -> Result<u32, HostError> {
        let count = self.configuration.get_int(NUM_REDUCES)?.unwrap_or(1);
        u32::try_from(count).map_err(|_| HostError::InvalidValue {
            key: NUM_REDUCES.to_string(),
            value: count.to_string(),
            expected: "task count",
        })
    }

    pub fn set_input_format_class(&mut self, name: &str) {
        self.configuration.set(INPUT_FORMAT_CLASS, name);
    }

    pub fn input_format_class(&self) -> Option<&str> {
        self.configuration.get(INPUT_FORMAT_CLASS)
    }

    pub fn set_output_format_class(&mut self, name: &str) {
        self.configuration.set(OUTPUT_FORMAT_CLASS, name);
    }

    pub fn output_format_class(&self) -> Option<&str> {
        self.configuration.get(OUTPUT_FORMAT_CLASS)
    }

    pub fn set_mapper_class(&mut self, name: &str) {
        self.configuration.set(MAPPER_CLASS, name);
    }

    pub fn mapper_class(&self) -> Option<&str> {
        self.configuration.get(MAPPER_CLASS)
    }

    pub fn set_combiner_class(&mut self, name: &str) {
        self.configuration.set(COMBINER_CLASS, name);
    }

    pub fn combiner_class(&self) -> Option<&str> {
        self.configuration.get(COMBINER_CLASS)
    }

    pub fn set_reducer_class(&mut self, name: &str) {
        self.configuration.set(REDUCER_CLASS, name);
    }

    pub fn reducer_class(&self) -> Option<&str> {
        self.configuration.get(REDUCER_CLASS)
    }

    pub fn set_partitioner_class(&mut self, name: &str) {
        self.configuration.set(PARTITIONER_CLASS, name);
    }

    pub fn partitioner_class(&self) -> Option<&str> {
        self.configuration.get(PARTITIONER_CLASS)
    }

    pub fn set_grouping_comparator_class(&mut self, name: &str) {
        self.configuration.set(GROUPING_COMPARATOR_CLASS, name);
    }

    pub fn grouping_comparator_class(&self) -> Option<&str> {
        self.configuration.get(GROUPING_COMPARATOR_CLASS)
    }

    pub fn set_sort_comparator_class(&mut self, name: &str) {
        self.configuration.set(SORT_COMPARATOR_CLASS, name);
    }

    pub fn sort_comparator_class(&self) -> Option<&str> {
        self.configuration.get(SORT_COMPARATOR_CLASS)
    }

    pub fn set_map_output_key_class(&mut self, datum_type: DatumType) {
        self.configuration.set(MAP_OUTPUT_KEY_CLASS, datum_type.name());
    }

    /// Key class of map output, falls back to the output key class like the framework does.
    pub fn map_output_key_class(&self) -> Result<Option<DatumType>, HostError> {
        match datum_class(&self.configuration, MAP_OUTPUT_KEY_CLASS)? {
            Some(datum_type) => Ok(Some(datum_type)),
            None => self.output_key_class(),
        }
    }

    pub fn set_map_output_value_class(&mut self, datum_type: DatumType) {
        self.configuration.set(MAP_OUTPUT_VALUE_CLASS, datum_type.name());
    }

    /// Value class of map output, falls back to the output value class.
    pub fn map_output_value_class(&self) -> Result<Option<DatumType>, HostError> {
        match datum_class(&self.configuration, MAP_OUTPUT_VALUE_CLASS)? {
            Some(datum_type) => Ok(Some(datum_type)),
            None => self.output_value_class(),
        }
    }

    pub fn set_output_key_class(&mut self, datum_type: DatumType) {
        self.configuration.set(OUTPUT_KEY_CLASS, datum_type.name());
    }

    pub fn output_key_class(&self) -> Result<Option<DatumType>, HostError> {
        datum_class(&self.configuration, OUTPUT_KEY_CLASS)
    }

    pub fn set_output_value_class(&mut self, datum_type: DatumType) {
        self.configuration.set(OUTPUT_VALUE_CLASS, datum_type.name());
    }

    pub fn output_value_class(&self) -> Result<Option<DatumType>, HostError> {
        datum_class(&self.configuration, OUTPUT_VALUE_CLASS)
    }

    /// Input paths set by a file-based input format.
    pub fn input_paths(&self) -> Vec<String> {
        self.configuration.get_strings(INPUT_DIR)
    }

    pub fn output_path(&self) -> Option<&str> {
        self.configuration.get(OUTPUT_DIR)
    }
}

/// Reads a key or value class stored under `key`.
pub fn datum_class(configuration: &Configuration, key: &str) -> Result<Option<DatumType>, HostError> {
    configuration.get(key).map(str::parse).transpose()
}

/// Key and value classes of map output, each falling back to the corresponding job output class.
pub fn map_output_classes(configuration: &Configuration) -> Result<(Option<DatumType>, Option<DatumType>), HostError> {
    let key = match datum_class(configuration, MAP_OUTPUT_KEY_CLASS)? {
        Some(datum_type) => Some(datum_type),
        None => datum_class(configuration, OUTPUT_KEY_CLASS)?,
    };
    let value = match datum_class(configuration, MAP_OUTPUT_VALUE_CLASS)? {
        Some(datum_type) => Some(datum_type),
        None => datum_class(configuration, OUTPUT_VALUE_CLASS)?,
    };
    Ok((key, value))
}

/// Key and value classes of the job output.
pub fn output_classes(configuration: &Configuration) -> Result<(Option<DatumType>, Option<DatumType>), HostError> {
    Ok((
        datum_class(configuration, OUTPUT_KEY_CLASS)?,
        datum_class(configuration, OUTPUT_VALUE_CLASS)?,
    ))
}
