//! Entry point of job configuration scripts.

use log::debug;

use crate::{context::ConfigurationContext, error::ConfigError, job_definition::JobDefinition};

/// Evaluates a configuration block against the driver context.
///
/// The same configuration code is linked into task processes, which have no driver context. Without a context the
/// block is never evaluated and every operation is a no-op.
pub struct ConfigurationDefinition<'a> {
    context: Option<&'a mut ConfigurationContext>,
}

impl<'a> ConfigurationDefinition<'a> {
    /// Evaluates `block` with driver arguments if `context` is present.
    pub fn new<F>(context: Option<&'a mut ConfigurationContext>, block: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&mut Self, &[String]) -> Result<(), ConfigError>,
    {
        let mut definition = ConfigurationDefinition { context };
        match definition.arguments().map(<[String]>::to_vec) {
            Some(arguments) => block(&mut definition, &arguments)?,
            None => debug!("no driver context, skipping configuration"),
        }
        Ok(definition)
    }

    pub fn is_active(&self) -> bool {
        self.context.is_some()
    }

    /// Driver arguments, absent without a context.
    pub fn arguments(&self) -> Option<&[String]> {
        self.context.as_deref().map(ConfigurationContext::arguments)
    }

    /// Creates job `name` and assembles it with `block`. A job whose block fails is removed from the context.
    pub fn job<F>(&mut self, name: &str, block: F) -> Result<Option<JobDefinition>, ConfigError>
    where
        F: FnOnce(&mut JobDefinition) -> Result<(), ConfigError>,
    {
        let Some(context) = self.context.as_deref_mut() else {
            return Ok(None);
        };
        let spec = context.create_job(name);
        let mut job = JobDefinition::new(spec.clone(), context.proxy_adapters());
        if let Err(err) = block(&mut job) {
            context.discard_job(&spec);
            return Err(err);
        }
        Ok(Some(job))
    }
}
