use std::collections::HashSet;

use tracing::{info, instrument};

use crate::{
    error::RegistryError,
    job::{JobRef, MetricJob},
};

/// Ordered collection of metric jobs.
///
/// Filled at startup, then moved into the [`Executor`](crate::Executor),
/// after which it is only read.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<JobRef>,
    names: HashSet<String>,
}

impl JobRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job, rejecting empty and duplicate names.
    #[instrument(level = "debug", skip_all, fields(job = job.name()))]
    pub fn register(&mut self, job: JobRef) -> Result<(), RegistryError> {
        let name = job.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if !self.names.insert(name.to_string()) {
            return Err(RegistryError::DuplicateJob(name.to_string()));
        }
        info!("registering metric job");
        self.jobs.push(job);
        Ok(())
    }

    /// Builder-style registration.
    pub fn with(mut self, job: JobRef) -> Result<Self, RegistryError> {
        self.register(job)?;
        Ok(self)
    }

    /// Jobs in registration order.
    #[inline]
    pub fn all_jobs(&self) -> &[JobRef] {
        &self.jobs
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.iter().map(|j| j.name())
    }

    pub fn get(&self, name: &str) -> Option<&JobRef> {
        self.jobs.iter().find(|j| j.name() == name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
