//! Input and output formats shipped with the framework.

use std::fmt;

use crate::job::{Job, INPUT_DIR, OUTPUT_DIR};

/// Descriptor of a native input format.
#[derive(Clone, Copy)]
pub struct InputFormatClass {
    /// Fully qualified class name.
    pub name: &'static str,
    /// Static operation setting input paths of a job, present for file-based formats.
    pub set_input_paths: Option<fn(&mut Job, &str)>,
}

/// Descriptor of a native output format.
#[derive(Clone, Copy)]
pub struct OutputFormatClass {
    /// Fully qualified class name.
    pub name: &'static str,
    /// Static operation setting output directory of a job, present for file-based formats.
    pub set_output_path: Option<fn(&mut Job, &str)>,
}

pub static TEXT_INPUT_FORMAT: InputFormatClass = InputFormatClass {
    name: "jobwire.lib.input.TextInputFormat",
    set_input_paths: Some(set_input_paths),
};

pub static SEQUENCE_FILE_INPUT_FORMAT: InputFormatClass = InputFormatClass {
    name: "jobwire.lib.input.SequenceFileInputFormat",
    set_input_paths: Some(set_input_paths),
};

pub static KEY_VALUE_TEXT_INPUT_FORMAT: InputFormatClass = InputFormatClass {
    name: "jobwire.lib.input.KeyValueTextInputFormat",
    set_input_paths: Some(set_input_paths),
};

pub static N_LINE_INPUT_FORMAT: InputFormatClass = InputFormatClass {
    name: "jobwire.lib.input.NLineInputFormat",
    set_input_paths: Some(set_input_paths),
};

pub static TEXT_OUTPUT_FORMAT: OutputFormatClass = OutputFormatClass {
    name: "jobwire.lib.output.TextOutputFormat",
    set_output_path: Some(set_output_path),
};

pub static SEQUENCE_FILE_OUTPUT_FORMAT: OutputFormatClass = OutputFormatClass {
    name: "jobwire.lib.output.SequenceFileOutputFormat",
    set_output_path: Some(set_output_path),
};

pub static NULL_OUTPUT_FORMAT: OutputFormatClass = OutputFormatClass {
    name: "jobwire.lib.output.NullOutputFormat",
    set_output_path: None,
};

static INPUT_FORMATS: [&InputFormatClass; 4] = [
    &TEXT_INPUT_FORMAT,
    &SEQUENCE_FILE_INPUT_FORMAT,
    &KEY_VALUE_TEXT_INPUT_FORMAT,
    &N_LINE_INPUT_FORMAT,
];

static OUTPUT_FORMATS: [&OutputFormatClass; 3] =
    [&TEXT_OUTPUT_FORMAT, &SEQUENCE_FILE_OUTPUT_FORMAT, &NULL_OUTPUT_FORMAT];

/// Sets comma separated input paths of a job.
pub fn set_input_paths(job: &mut Job, paths: &str) {
    job.configuration_mut().set(INPUT_DIR, paths);
}

/// Sets output directory of a job.
pub fn set_output_path(job: &mut Job, dir: &str) {
    job.configuration_mut().set(OUTPUT_DIR, dir);
}

/// Finds input format by its simple class name, e.g. `TextInputFormat`.
pub fn input_format(simple_name: &str) -> Option<&'static InputFormatClass> {
    INPUT_FORMATS.iter().copied().find(|format| format.simple_name() == simple_name)
}

/// Finds output format by its simple class name, e.g. `TextOutputFormat`.
pub fn output_format(simple_name: &str) -> Option<&'static OutputFormatClass> {
    OUTPUT_FORMATS.iter().copied().find(|format| format.simple_name() == simple_name)
}

impl InputFormatClass {
    /// Class name without the package part.
    pub fn simple_name(&self) -> &'static str {
        simple_name(self.name)
    }
}

impl OutputFormatClass {
    /// Class name without the package part.
    pub fn simple_name(&self) -> &'static str {
        simple_name(self.name)
    }
}

impl PartialEq for InputFormatClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl PartialEq for OutputFormatClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for InputFormatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFormatClass").field("name", &self.name).finish()
    }
}

impl fmt::Debug for OutputFormatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputFormatClass").field("name", &self.name).finish()
    }
}

fn simple_name(name: &'static str) -> &'static str {
    name.rsplit('.').next().unwrap_or(name)
}
