use axum::{
    Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};

use crate::{error::GaugeError, store::GaugeStore};

/// Scrape endpoint builder.
pub struct ScrapeApi {
    store: GaugeStore,
}

impl ScrapeApi {
    pub fn new(store: GaugeStore) -> Self {
        Self { store }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - GET /metrics - Prometheus text exposition
    /// - GET /healthz - Liveness check
    pub fn router(self) -> Router {
        Router::new()
            .route("/metrics", get(metrics))
            .route("/healthz", get(healthz))
            .with_state(self.store)
    }
}

/// GET /metrics
async fn metrics(State(store): State<GaugeStore>) -> Result<impl IntoResponse, GaugeError> {
    let body = store.encode_text()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

/// GET /healthz
async fn healthz() -> &'static str {
    "ok"
}
