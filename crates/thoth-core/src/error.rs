use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid executor config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("job already registered: {0}")]
    DuplicateJob(String),
    #[error("job name must not be empty")]
    EmptyName,
}

/// Failure of a single job run. Never propagates past the executor.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("backend unreachable: {0}")]
    Connectivity(String),
    #[error("malformed input: {0}")]
    Parse(String),
    #[error("inconsistent data: {0}")]
    DataAnomaly(String),
    #[error("gauge update failed: {0}")]
    Gauge(String),
    #[error("{failed} of {total} items failed")]
    Partial { failed: usize, total: usize },
    #[error("cancelled")]
    Cancelled,
}

impl JobError {
    /// Short symbolic identifier used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Connectivity(_) => "connectivity",
            JobError::Parse(_) => "parse",
            JobError::DataAnomaly(_) => "data_anomaly",
            JobError::Gauge(_) => "gauge",
            JobError::Partial { .. } => "partial",
            JobError::Cancelled => "cancelled",
        }
    }
}
