use std::sync::Arc;

use thoth_clients::{ClusterClient, GraphClient, MetricHistory, PrescriptionClient};
use thoth_core::JobError;
use thoth_prometheus::GaugeStore;

/// Collaborators injected into every job.
#[derive(Clone)]
pub struct JobContext {
    pub gauges: GaugeStore,
    pub graph: Arc<dyn GraphClient>,
    pub cluster: Arc<dyn ClusterClient>,
    pub prescriptions: Arc<dyn PrescriptionClient>,
    /// Source of previously scraped values; the store's own last value is used without it.
    pub history: Option<Arc<dyn MetricHistory>>,
    /// Deployment name reported in the `env` label.
    pub deployment: String,
}

impl JobContext {
    pub fn new(
        gauges: GaugeStore,
        graph: Arc<dyn GraphClient>,
        cluster: Arc<dyn ClusterClient>,
        prescriptions: Arc<dyn PrescriptionClient>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            gauges,
            graph,
            cluster,
            prescriptions,
            history: None,
            deployment: deployment.into(),
        }
    }

    pub fn with_history(mut self, history: Arc<dyn MetricHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub(crate) fn set(&self, name: &str, labels: &[&str], value: f64) -> Result<(), JobError> {
        self.gauges
            .set(name, labels, value)
            .map_err(|e| JobError::Gauge(e.to_string()))
    }

    pub(crate) fn inc(&self, name: &str, labels: &[&str], by: f64) -> Result<(), JobError> {
        self.gauges
            .inc(name, labels, by)
            .map_err(|e| JobError::Gauge(e.to_string()))
    }

    /// Graph client, connecting first when the previous connection was lost.
    pub(crate) async fn graph(&self) -> Result<&dyn GraphClient, JobError> {
        if !self.graph.is_connected() {
            self.graph.connect().await?;
        }
        Ok(self.graph.as_ref())
    }

    /// Graph client with a current schema; stale schemas yield misleading counts.
    pub(crate) async fn graph_with_schema(&self) -> Result<&dyn GraphClient, JobError> {
        let graph = self.graph().await?;
        if !graph.is_schema_up_to_date().await? {
            return Err(JobError::DataAnomaly(
                "graph database schema is not up to date".into(),
            ));
        }
        Ok(graph)
    }
}
