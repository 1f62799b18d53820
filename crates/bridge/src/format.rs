//! Resolution of symbolic format names.
//!
//! `sequence_file` used as an input format stands for `SequenceFileInputFormat`.

use jobwire_host::formats::{self, InputFormatClass, OutputFormatClass};

use crate::{error::ConfigError, job_definition::Format};

pub const INPUT_FORMAT_SUFFIX: &str = "InputFormat";
pub const OUTPUT_FORMAT_SUFFIX: &str = "OutputFormat";

/// Converts symbol to a simple class name: segments split on `_` are capitalized and `suffix` is appended.
pub fn class_name(symbol: &str, suffix: &str) -> String {
    let mut name = symbol
        .split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<String>();
    name.push_str(suffix);
    name
}

pub fn resolve_input_format(format: &Format<InputFormatClass>) -> Result<&'static InputFormatClass, ConfigError> {
    match format {
        Format::Class(class) => Ok(*class),
        Format::Named(symbol) => {
            let name = class_name(symbol, INPUT_FORMAT_SUFFIX);
            formats::input_format(&name).ok_or_else(|| ConfigError::UnknownFormat {
                symbol: symbol.clone(),
                class_name: name,
            })
        }
    }
}

pub fn resolve_output_format(format: &Format<OutputFormatClass>) -> Result<&'static OutputFormatClass, ConfigError> {
    match format {
        Format::Class(class) => Ok(*class),
        Format::Named(symbol) => {
            let name = class_name(symbol, OUTPUT_FORMAT_SUFFIX);
            formats::output_format(&name).ok_or_else(|| ConfigError::UnknownFormat {
                symbol: symbol.clone(),
                class_name: name,
            })
        }
    }
}

