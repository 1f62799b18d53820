use std::{
    io::Write,
    path::{Path, PathBuf},
};

use clap::Parser;
use env_logger::Builder;
use log::{error, info};

use jobwire::{script::YamlScript, ConfigError, ConfigurationContext};
use jobwire_host::{client::JobClient, error_chain, Configuration, HostError, Job};

/// Assembles jobs from a YAML job script and writes the configuration shipped with every job.
#[derive(Parser, Debug)]
struct Args {
    /// Generic option merged into the base configuration of every job.
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_property)]
    define: Vec<(String, String)>,

    /// Path to job script.
    #[arg(short, long)]
    script: PathBuf,

    /// Folder where job configurations are written.
    #[arg(short, long)]
    output: PathBuf,

    /// Arguments passed to the job script as $1, $2, ...
    #[arg(trailing_var_arg = true)]
    arguments: Vec<String>,
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or(format!("expected KEY=VALUE, got {s}"))?;
    Ok((key.trim().to_string(), value.to_string()))
}

/// Client which records jobs as YAML files instead of running them.
struct ConfigurationWriter {
    dir: PathBuf,
}

impl ConfigurationWriter {
    fn new(dir: &Path) -> Result<Self, HostError> {
        std::fs::create_dir_all(dir)?;
        Ok(ConfigurationWriter { dir: dir.to_path_buf() })
    }
}

impl JobClient for ConfigurationWriter {
    fn submit(&mut self, job: &Job) -> Result<bool, HostError> {
        let path = self.dir.join(format!("{}.yaml", job.name()));
        std::fs::write(&path, job.configuration().to_yaml()?)?;
        info!("job {} written to {}", job.name(), path.display());
        Ok(true)
    }
}

fn run(args: Args) -> Result<(), ConfigError> {
    let base = args.define.into_iter().collect::<Configuration>();
    let script = YamlScript::from_file(&args.script)?;
    let mut context = ConfigurationContext::new(base, args.arguments);
    script.evaluate(Some(&mut context))?;
    info!("{} jobs defined by {}", context.jobs().len(), args.script.display());
    context.submit_all(&mut ConfigurationWriter::new(&args.output)?)
}

fn main() {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    if let Err(err) = run(Args::parse()) {
        error!("{}", error_chain(&err));
        std::process::exit(1);
    }
}
