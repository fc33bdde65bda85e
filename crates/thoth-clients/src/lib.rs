//! Clients for the backends the exporter reads from.
//!
//! Jobs only see the client traits, so tests can substitute in-memory fakes.
//! The HTTP implementations talk to the cluster API, the graph query
//! gateway, the prescriptions repository and Prometheus.

mod error;
pub use error::ClientError;

mod cluster;
pub use cluster::{ClusterClient, OpenShiftClient, OpenShiftConfig};

mod graph;
pub use graph::{ErrorFilter, GraphClient, HttpGraphClient, HttpGraphConfig};

mod history;
pub use history::{MetricHistory, PrometheusConfig, PrometheusHistory};

mod prescription;
pub use prescription::{
    DEFAULT_QUAY_SECURITY_URL, HttpPrescriptionClient, PrescriptionClient, PrescriptionConfig,
};

mod http;
