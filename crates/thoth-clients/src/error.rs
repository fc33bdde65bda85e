use thiserror::Error;
use thoth_core::JobError;
use thoth_model::SolverNameError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("backend unreachable: {0}")]
    Connectivity(String),

    #[error("request rejected as unauthorized: {0}")]
    Unauthorized(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Parse(#[from] SolverNameError),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else {
            ClientError::Connectivity(e.to_string())
        }
    }
}

impl From<ClientError> for JobError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Parse(e) => JobError::Parse(e.to_string()),
            ClientError::InvalidResponse(msg) => JobError::DataAnomaly(msg),
            other => JobError::Connectivity(other.to_string()),
        }
    }
}
