use async_trait::async_trait;
use thoth_core::{CancellationToken, JobError, MetricJob};
use tracing::{debug, warn};

use crate::{
    catalog::{
        COMPONENT, GRAPH_DB_COMPONENT_REVISION_CHECK, GRAPHDB_CONNECTION_ERROR_STATUS,
        OPENSHIFT_CONNECTION_ERROR_STATUS,
    },
    context::JobContext,
};

/// Probes the graph database and its schema revision.
pub struct GraphConnectionJob {
    ctx: JobContext,
}

impl GraphConnectionJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl MetricJob for GraphConnectionJob {
    fn name(&self) -> &str {
        "graph_connection"
    }

    async fn collect(&self, _token: CancellationToken) -> Result<(), JobError> {
        if let Err(e) = self.ctx.graph.connect().await {
            self.ctx.set(GRAPHDB_CONNECTION_ERROR_STATUS, &[], 1.0)?;
            warn!(error = %e, "graph database connection failed");
            return Err(e.into());
        }
        self.ctx.set(GRAPHDB_CONNECTION_ERROR_STATUS, &[], 0.0)?;

        let up_to_date = self.ctx.graph.is_schema_up_to_date().await?;
        let labels = [COMPONENT, self.ctx.deployment.as_str()];
        self.ctx.set(
            GRAPH_DB_COMPONENT_REVISION_CHECK,
            &labels,
            if up_to_date { 0.0 } else { 1.0 },
        )?;
        debug!(up_to_date, "graph schema revision checked");

        if !up_to_date {
            return Err(JobError::DataAnomaly(
                "graph database schema is not up to date".into(),
            ));
        }
        Ok(())
    }
}

/// Probes the cluster API through the solver listing.
pub struct OpenShiftConnectionJob {
    ctx: JobContext,
}

impl OpenShiftConnectionJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl MetricJob for OpenShiftConnectionJob {
    fn name(&self) -> &str {
        "openshift_connection"
    }

    async fn collect(&self, _token: CancellationToken) -> Result<(), JobError> {
        match self.ctx.cluster.list_solver_names().await {
            Ok(_) => {
                self.ctx.set(OPENSHIFT_CONNECTION_ERROR_STATUS, &[], 0.0)?;
                Ok(())
            }
            Err(e) => {
                self.ctx.set(OPENSHIFT_CONNECTION_ERROR_STATUS, &[], 1.0)?;
                warn!(error = %e, "cluster API connection failed");
                Err(e.into())
            }
        }
    }
}
