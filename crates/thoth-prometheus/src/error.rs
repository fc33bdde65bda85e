use thiserror::Error;

use crate::store::MetricKind;

#[derive(Debug, Error)]
pub enum GaugeError {
    #[error("gauge {0:?} is not described")]
    Unknown(String),
    #[error("gauge {0:?} is already described")]
    AlreadyDescribed(String),
    #[error("gauge {name:?} expects {expected} label values, got {got}")]
    LabelArity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("metric {name:?} is not a {expected}")]
    WrongKind { name: String, expected: MetricKind },
    #[error("counter {name:?} cannot be incremented by {by}")]
    InvalidIncrement { name: String, by: f64 },
    #[error("prometheus registration failed: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("text exposition failed: {0}")]
    Encode(String),
}

#[cfg(feature = "http")]
impl axum::response::IntoResponse for GaugeError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = %self, "metrics scrape failed");
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            self.to_string(),
        )
            .into_response()
    }
}
