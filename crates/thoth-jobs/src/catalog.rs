//! Gauges published by the exporter, without the namespace prefix.

use thoth_prometheus::{GaugeError, GaugeStore, MetricKind};

pub const GRAPHDB_TOTAL_NUMBER_SOLVERS: &str = "graphdb_total_number_solvers";
pub const GRAPHDB_TOTAL_NUMBER_UNSOLVED_PYTHON_PACKAGES: &str =
    "graphdb_total_number_unsolved_python_packages";
pub const GRAPHDB_TOTAL_PYTHON_PACKAGES_SOLVED_WITH_NO_ERROR: &str =
    "graphdb_total_python_packages_solved_with_no_error";
pub const GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR: &str =
    "graphdb_total_python_packages_with_solver_error";
pub const GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR_UNPARSEABLE: &str =
    "graphdb_total_python_packages_with_solver_error_unparseable";
pub const GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR_UNSOLVABLE: &str =
    "graphdb_total_python_packages_with_solver_error_unsolvable";

pub const GRAPHDB_TOTAL_NUMBER_SI_ANALYZED_PYTHON_PACKAGES: &str =
    "graphdb_total_number_si_analyzed_python_packages";
pub const GRAPHDB_TOTAL_NUMBER_SI_UNANALYZED_PYTHON_PACKAGES: &str =
    "graphdb_total_number_si_unanalyzed_python_packages";
pub const GRAPHDB_TOTAL_NUMBER_SI_NOT_ANALYZABLE_PYTHON_PACKAGES: &str =
    "graphdb_total_number_si_not_analyzable_python_packages";
pub const GRAPHDB_SI_UNANALYZED_PYTHON_PACKAGE_VERSIONS_CHANGE: &str =
    "graphdb_si_unanalyzed_python_package_versions_change";
pub const GRAPHDB_TOTAL_NUMBER_CVE: &str = "graphdb_total_number_cve";
pub const GRAPHDB_CVE_UPDATE_DAYS: &str = "graphdb_cve_update_days";

pub const PRESCRIPTION_QUAY_SECURITY_UPDATE_DAYS: &str = "prescription_quay_security_update_days";

pub const GRAPHDB_CONNECTION_ERROR_STATUS: &str = "graphdb_connection_error_status";
pub const OPENSHIFT_CONNECTION_ERROR_STATUS: &str = "openshift_connection_error_status";
pub const GRAPH_DB_COMPONENT_REVISION_CHECK: &str = "graph_db_component_revision_check";

/// Value of the `component` label on the schema revision gauge.
pub const COMPONENT: &str = "metrics-exporter";

pub struct GaugeSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
    pub kind: MetricKind,
}

pub const CATALOG: &[GaugeSpec] = &[
    GaugeSpec {
        name: GRAPHDB_TOTAL_NUMBER_SOLVERS,
        help: "Number of solvers deployed in the infra namespace",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_TOTAL_NUMBER_UNSOLVED_PYTHON_PACKAGES,
        help: "Number of python package versions not yet solved, per solver",
        labels: &["solver_name"],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_TOTAL_PYTHON_PACKAGES_SOLVED_WITH_NO_ERROR,
        help: "Distinct python package versions solved without error",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR,
        help: "Distinct python package versions with a solver error",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR_UNPARSEABLE,
        help: "Distinct python package versions the solver could not parse",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR_UNSOLVABLE,
        help: "Distinct python package versions the solver could not resolve",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_TOTAL_NUMBER_SI_ANALYZED_PYTHON_PACKAGES,
        help: "Distinct python package versions with a security-indicator analysis",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_TOTAL_NUMBER_SI_UNANALYZED_PYTHON_PACKAGES,
        help: "Distinct python package versions waiting for a security-indicator analysis",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_TOTAL_NUMBER_SI_NOT_ANALYZABLE_PYTHON_PACKAGES,
        help: "Distinct python package versions without a source distribution to analyze",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_SI_UNANALYZED_PYTHON_PACKAGE_VERSIONS_CHANGE,
        help: "Python package versions that left the security-indicator backlog",
        labels: &[],
        kind: MetricKind::Counter,
    },
    GaugeSpec {
        name: GRAPHDB_TOTAL_NUMBER_CVE,
        help: "Number of python CVE records",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_CVE_UPDATE_DAYS,
        help: "Days since the CVE records were last updated",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: PRESCRIPTION_QUAY_SECURITY_UPDATE_DAYS,
        help: "Days since the Quay security data in the prescriptions were last updated",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPHDB_CONNECTION_ERROR_STATUS,
        help: "1 when the graph database is unreachable, 0 otherwise",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: OPENSHIFT_CONNECTION_ERROR_STATUS,
        help: "1 when the cluster API is unreachable, 0 otherwise",
        labels: &[],
        kind: MetricKind::Gauge,
    },
    GaugeSpec {
        name: GRAPH_DB_COMPONENT_REVISION_CHECK,
        help: "1 when the graph schema does not match the expected revision, 0 otherwise",
        labels: &["component", "env"],
        kind: MetricKind::Gauge,
    },
];

/// Register every catalog metric with `store`.
pub fn describe_all(store: &GaugeStore) -> Result<(), GaugeError> {
    for spec in CATALOG {
        match spec.kind {
            MetricKind::Gauge => store.describe(spec.name, spec.help, spec.labels)?,
            MetricKind::Counter => store.describe_counter(spec.name, spec.help, spec.labels)?,
        }
    }
    Ok(())
}
