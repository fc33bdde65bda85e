//! Metric jobs of the exporter.
//!
//! Every job receives its collaborators through a [`JobContext`] and owns a
//! fixed set of gauges from the [`catalog`]. [`register_all`] wires them into
//! a [`JobRegistry`] in a stable order.

pub mod catalog;

mod context;
pub use context::JobContext;

mod connection;
pub use connection::{GraphConnectionJob, OpenShiftConnectionJob};

mod solver;
pub use solver::{SolverCountJob, SolverErrorJob, UnsolvedPackagesJob};

mod security;
pub use security::{
    CveUpdateDaysJob, GraphCountJob, GraphCountQuery, QuaySecurityDaysJob, SiUnanalyzedJob,
};

#[cfg(test)]
mod testing;

use std::sync::Arc;

use thoth_core::{JobRef, JobRegistry, RegistryError};

/// Connection checks first, then solver, security and prescription jobs.
pub fn all_jobs(ctx: &JobContext) -> Vec<JobRef> {
    vec![
        Arc::new(GraphConnectionJob::new(ctx.clone())),
        Arc::new(OpenShiftConnectionJob::new(ctx.clone())),
        Arc::new(SolverCountJob::new(ctx.clone())),
        Arc::new(UnsolvedPackagesJob::new(ctx.clone())),
        Arc::new(SolverErrorJob::new(ctx.clone())),
        Arc::new(SiUnanalyzedJob::new(ctx.clone())),
        Arc::new(GraphCountJob::new(ctx.clone(), GraphCountQuery::SiAnalyzed)),
        Arc::new(GraphCountJob::new(ctx.clone(), GraphCountQuery::SiNotAnalyzable)),
        Arc::new(GraphCountJob::new(ctx.clone(), GraphCountQuery::CveRecords)),
        Arc::new(CveUpdateDaysJob::new(ctx.clone())),
        Arc::new(QuaySecurityDaysJob::new(ctx.clone())),
    ]
}

pub fn register_all(registry: &mut JobRegistry, ctx: &JobContext) -> Result<(), RegistryError> {
    for job in all_jobs(ctx) {
        registry.register(job)?;
    }
    Ok(())
}
