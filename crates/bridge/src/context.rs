//! Driver-side registry of jobs being assembled.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use jobwire_host::{client::JobClient, Configuration, DatumType, Job};
use log::info;

use crate::{
    error::ConfigError,
    proxy::adapter_name,
    role::{ComponentClass, Role},
};

/// Native adapter class installed for each role.
///
/// Fixed when the context is created.
#[derive(Debug, Clone)]
pub struct ProxyAdapters {
    names: HashMap<Role, &'static str>,
}

impl Default for ProxyAdapters {
    fn default() -> Self {
        Role::ALL.into_iter().map(|role| (role, adapter_name(role))).collect()
    }
}

impl FromIterator<(Role, &'static str)> for ProxyAdapters {
    fn from_iter<I: IntoIterator<Item = (Role, &'static str)>>(iter: I) -> Self {
        ProxyAdapters {
            names: iter.into_iter().collect(),
        }
    }
}

impl ProxyAdapters {
    pub fn get(&self, role: Role) -> Result<&'static str, ConfigError> {
        self.names
            .get(&role)
            .copied()
            .ok_or_else(|| ConfigError::UnknownRole(role.identifier().to_string()))
    }
}

/// Native job together with the component classes registered for it.
///
/// Cached classes only serve getters in the driver, tasks see the persisted configuration alone.
#[derive(Debug)]
pub struct JobSpec {
    job: Job,
    pub(crate) classes: BTreeMap<Role, ComponentClass>,
    pub(crate) record_reader: Option<ComponentClass>,
    pub(crate) map_output_key: Option<DatumType>,
    pub(crate) map_output_value: Option<DatumType>,
    pub(crate) output_key: Option<DatumType>,
    pub(crate) output_value: Option<DatumType>,
}

impl JobSpec {
    fn new(job: Job) -> Self {
        JobSpec {
            job,
            classes: BTreeMap::new(),
            record_reader: None,
            map_output_key: None,
            map_output_value: None,
            output_key: None,
            output_value: None,
        }
    }

    pub fn name(&self) -> &str {
        self.job.name()
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn job_mut(&mut self) -> &mut Job {
        &mut self.job
    }

    /// Component class registered for `role`.
    pub fn class(&self, role: Role) -> Option<&ComponentClass> {
        self.classes.get(&role)
    }
}

/// Registry of one driver invocation.
///
/// Holds driver arguments, the base configuration every job starts from and the jobs in the order they were created,
/// which is also the order they are submitted in.
pub struct ConfigurationContext {
    arguments: Vec<String>,
    configuration: Configuration,
    jobs: Vec<Rc<RefCell<JobSpec>>>,
    proxy_adapters: Rc<ProxyAdapters>,
}

impl ConfigurationContext {
    pub fn new(configuration: Configuration, arguments: Vec<String>) -> Self {
        Self::with_adapters(configuration, arguments, ProxyAdapters::default())
    }

    pub fn with_adapters(configuration: Configuration, arguments: Vec<String>, proxy_adapters: ProxyAdapters) -> Self {
        ConfigurationContext {
            arguments,
            configuration,
            jobs: Vec::new(),
            proxy_adapters: Rc::new(proxy_adapters),
        }
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Creates job from the base configuration and appends it to the job list.
    pub fn create_job(&mut self, name: &str) -> Rc<RefCell<JobSpec>> {
        let spec = Rc::new(RefCell::new(JobSpec::new(Job::new(&self.configuration, name))));
        self.jobs.push(spec.clone());
        info!("created job {} ({} jobs defined)", name, self.jobs.len());
        spec
    }

    /// Removes a job which failed to assemble.
    pub(crate) fn discard_job(&mut self, spec: &Rc<RefCell<JobSpec>>) {
        self.jobs.retain(|job| !Rc::ptr_eq(job, spec));
        info!("discarded job {} ({} jobs defined)", spec.borrow().name(), self.jobs.len());
    }

    /// Native adapter class for a role identifier.
    pub fn proxy_adapter(&self, role: &str) -> Result<&'static str, ConfigError> {
        self.proxy_adapters.get(role.parse()?)
    }

    pub fn proxy_adapters(&self) -> Rc<ProxyAdapters> {
        self.proxy_adapters.clone()
    }

    pub fn jobs(&self) -> &[Rc<RefCell<JobSpec>>] {
        &self.jobs
    }

    /// Submits jobs in the order they were created, stopping at the first failed job.
    pub fn submit_all(&self, client: &mut dyn JobClient) -> Result<(), ConfigError> {
        for spec in &self.jobs {
            let spec = spec.borrow();
            info!("submitting job {}", spec.name());
            if !client.submit(spec.job())? {
                return Err(ConfigError::JobFailed {
                    name: spec.name().to_string(),
                });
            }
            info!("job {} completed", spec.name());
        }
        Ok(())
    }
}
