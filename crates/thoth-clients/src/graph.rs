use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use thoth_model::SolverInfo;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, instrument};

use crate::{
    error::ClientError,
    http::{endpoint, fetch_json, parse_base_url},
};

/// Which solver errors to count.
///
/// With neither `unparseable` nor `unsolvable` set, every package version
/// with a solver error is counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorFilter {
    /// Count each package-version identity once across solver runs.
    pub distinct: bool,
    pub unparseable: bool,
    pub unsolvable: bool,
}

impl ErrorFilter {
    pub fn all() -> Self {
        Self {
            distinct: true,
            ..Self::default()
        }
    }

    pub fn unparseable() -> Self {
        Self {
            distinct: true,
            unparseable: true,
            ..Self::default()
        }
    }

    pub fn unsolvable() -> Self {
        Self {
            distinct: true,
            unsolvable: true,
            ..Self::default()
        }
    }
}

/// Queries against the knowledge graph.
#[async_trait]
pub trait GraphClient: Send + Sync {
    fn is_connected(&self) -> bool;

    async fn connect(&self) -> Result<(), ClientError>;

    async fn is_schema_up_to_date(&self) -> Result<bool, ClientError>;

    fn parse_solver_name(&self, name: &str) -> Result<SolverInfo, ClientError> {
        Ok(SolverInfo::from_solver_name(name)?)
    }

    async fn count_unsolved_python_packages(&self, solver: &SolverInfo) -> Result<i64, ClientError>;

    async fn count_solved_python_packages(&self, distinct: bool) -> Result<i64, ClientError>;

    async fn count_error_python_packages(&self, filter: ErrorFilter) -> Result<i64, ClientError>;

    async fn count_si_analyzed_python_packages(&self, distinct: bool) -> Result<i64, ClientError>;

    /// Package versions without a security-indicator analysis.
    ///
    /// `provides_source_distro = false` narrows the count to versions that can
    /// not be analyzed because no source distribution is published.
    async fn count_si_unanalyzed_python_packages(
        &self,
        distinct: bool,
        provides_source_distro: bool,
    ) -> Result<i64, ClientError>;

    async fn count_python_cve_records(&self) -> Result<i64, ClientError>;

    /// Time of the last CVE database update, `None` if it was never recorded.
    async fn cve_timestamp(&self) -> Result<Option<OffsetDateTime>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpGraphConfig {
    /// Graph query gateway, e.g. `http://thoth-graph:8080`.
    pub base_url: String,
    pub timeout: Duration,
}

/// [`GraphClient`] over the graph query gateway's JSON API (`/graph/v1/...`).
pub struct HttpGraphClient {
    http: reqwest::Client,
    base: Url,
    connected: AtomicBool,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct SchemaResponse {
    up_to_date: bool,
}

#[derive(Debug, Deserialize)]
struct TimestampResponse {
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

fn flag(v: bool) -> String {
    v.to_string()
}

impl HttpGraphClient {
    pub fn new(cfg: HttpGraphConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base: parse_base_url(&cfg.base_url)?,
            connected: AtomicBool::new(false),
        })
    }

    fn url(&self, path: &[&str], query: &[(&str, String)]) -> Url {
        let mut segments = vec!["graph", "v1"];
        segments.extend_from_slice(path);
        endpoint(&self.base, &segments, query)
    }

    async fn count(&self, path: &[&str], query: &[(&str, String)]) -> Result<i64, ClientError> {
        let url = self.url(path, query);
        let result = fetch_json::<CountResponse>(self.http.get(url)).await;
        if matches!(result, Err(ClientError::Connectivity(_))) {
            self.connected.store(false, Ordering::Release);
        }
        let count = result?.count;
        debug!(path = ?path, count, "graph count fetched");
        Ok(count)
    }
}

#[async_trait]
impl GraphClient for HttpGraphClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    #[instrument(level = "debug", skip(self), fields(base = %self.base))]
    async fn connect(&self) -> Result<(), ClientError> {
        let result = fetch_json::<HealthResponse>(self.http.get(self.url(&["health"], &[])))
            .await
            .and_then(|health| match health.status.as_str() {
                "ok" => Ok(()),
                other => Err(ClientError::Connectivity(format!(
                    "graph gateway reports status {other:?}"
                ))),
            });
        self.connected.store(result.is_ok(), Ordering::Release);
        result
    }

    async fn is_schema_up_to_date(&self) -> Result<bool, ClientError> {
        let schema: SchemaResponse = fetch_json(self.http.get(self.url(&["schema"], &[]))).await?;
        Ok(schema.up_to_date)
    }

    async fn count_unsolved_python_packages(&self, solver: &SolverInfo) -> Result<i64, ClientError> {
        self.count(
            &["python", "unsolved", "count"],
            &[
                ("os_name", solver.os_name.clone()),
                ("os_version", solver.os_version.clone()),
                ("python_version", solver.python_version.clone()),
            ],
        )
        .await
    }

    async fn count_solved_python_packages(&self, distinct: bool) -> Result<i64, ClientError> {
        self.count(&["python", "solved", "count"], &[("distinct", flag(distinct))])
            .await
    }

    async fn count_error_python_packages(&self, filter: ErrorFilter) -> Result<i64, ClientError> {
        self.count(
            &["python", "solver-error", "count"],
            &[
                ("distinct", flag(filter.distinct)),
                ("unparseable", flag(filter.unparseable)),
                ("unsolvable", flag(filter.unsolvable)),
            ],
        )
        .await
    }

    async fn count_si_analyzed_python_packages(&self, distinct: bool) -> Result<i64, ClientError> {
        self.count(&["python", "si-analyzed", "count"], &[("distinct", flag(distinct))])
            .await
    }

    async fn count_si_unanalyzed_python_packages(
        &self,
        distinct: bool,
        provides_source_distro: bool,
    ) -> Result<i64, ClientError> {
        self.count(
            &["python", "si-unanalyzed", "count"],
            &[
                ("distinct", flag(distinct)),
                ("provides_source_distro", flag(provides_source_distro)),
            ],
        )
        .await
    }

    async fn count_python_cve_records(&self) -> Result<i64, ClientError> {
        self.count(&["python", "cve", "count"], &[]).await
    }

    async fn cve_timestamp(&self) -> Result<Option<OffsetDateTime>, ClientError> {
        let resp: TimestampResponse =
            fetch_json(self.http.get(self.url(&["cve", "timestamp"], &[]))).await?;
        resp.timestamp
            .map(|raw| {
                OffsetDateTime::parse(&raw, &Rfc3339).map_err(|e| {
                    ClientError::InvalidResponse(format!("bad cve timestamp {raw:?}: {e}"))
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::Query,
        http::StatusCode,
        response::IntoResponse,
        routing::get,
    };
    use serde_json::{Value, json};

    use super::*;

    async fn unsolved(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
        let count = match (
            q.get("os_name").map(String::as_str),
            q.get("os_version").map(String::as_str),
            q.get("python_version").map(String::as_str),
        ) {
            (Some("fedora"), Some("31"), Some("3.8")) => 11,
            (Some("fedora"), Some("32"), Some("3.9")) => 22,
            _ => -1,
        };
        Json(json!({ "count": count }))
    }

    async fn solver_errors(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
        let count = match (
            q.get("unparseable").map(String::as_str),
            q.get("unsolvable").map(String::as_str),
        ) {
            (Some("true"), _) => 10,
            (_, Some("true")) => 15,
            _ => 30,
        };
        Json(json!({ "count": count }))
    }

    async fn serve() -> String {
        let router = Router::new()
            .route("/graph/v1/health", get(|| async { Json(json!({"status": "ok"})) }))
            .route("/graph/v1/schema", get(|| async { Json(json!({"up_to_date": false})) }))
            .route("/graph/v1/python/unsolved/count", get(unsolved))
            .route(
                "/graph/v1/python/solved/count",
                get(|| async { Json(json!({"count": 100})) }),
            )
            .route("/graph/v1/python/solver-error/count", get(solver_errors))
            .route(
                "/graph/v1/python/cve/count",
                get(|| async { (StatusCode::OK, "not json").into_response() }),
            )
            .route(
                "/graph/v1/cve/timestamp",
                get(|| async { Json(json!({"timestamp": "2021-03-01T12:00:00Z"})) }),
            )
            .route(
                "/graph/v1/python/si-analyzed/count",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response() }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String) -> HttpGraphClient {
        HttpGraphClient::new(HttpGraphConfig {
            base_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn connect_marks_client_connected() {
        let graph = client(serve().await);
        assert!(!graph.is_connected());
        graph.connect().await.unwrap();
        assert!(graph.is_connected());
        assert!(!graph.is_schema_up_to_date().await.unwrap());
    }

    #[tokio::test]
    async fn unsolved_count_uses_solver_triple() {
        let graph = client(serve().await);
        let a = graph
            .count_unsolved_python_packages(&SolverInfo::new("fedora", "31", "3.8"))
            .await
            .unwrap();
        let b = graph
            .count_unsolved_python_packages(&SolverInfo::new("fedora", "32", "3.9"))
            .await
            .unwrap();
        assert_eq!((a, b), (11, 22));
    }

    #[tokio::test]
    async fn error_filters_are_forwarded() {
        let graph = client(serve().await);
        assert_eq!(graph.count_solved_python_packages(true).await.unwrap(), 100);
        assert_eq!(
            graph.count_error_python_packages(ErrorFilter::all()).await.unwrap(),
            30
        );
        assert_eq!(
            graph
                .count_error_python_packages(ErrorFilter::unparseable())
                .await
                .unwrap(),
            10
        );
        assert_eq!(
            graph
                .count_error_python_packages(ErrorFilter::unsolvable())
                .await
                .unwrap(),
            15
        );
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let graph = client(serve().await);
        let err = graph.count_python_cve_records().await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn server_error_keeps_status() {
        let graph = client(serve().await);
        let err = graph.count_si_analyzed_python_packages(true).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn cve_timestamp_is_parsed() {
        let graph = client(serve().await);
        let ts = graph.cve_timestamp().await.unwrap().unwrap();
        assert_eq!(ts.year(), 2021);
        assert_eq!(ts.day(), 1);
    }

    #[tokio::test]
    async fn connectivity_failure_resets_connected_flag() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let graph = client(format!("http://{addr}"));
        graph.connected.store(true, Ordering::Release);
        let err = graph.count_solved_python_packages(true).await.unwrap_err();
        assert!(matches!(err, ClientError::Connectivity(_)));
        assert!(!graph.is_connected());
    }

    #[tokio::test]
    async fn failed_connect_clears_connected_flag() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let graph = client(format!("http://{addr}"));
        graph.connected.store(true, Ordering::Release);
        let err = graph.connect().await.unwrap_err();
        assert!(matches!(err, ClientError::Connectivity(_)));
        assert!(!graph.is_connected());
    }

    #[test]
    fn default_parser_is_used() {
        let graph = client("http://localhost:1".into());
        let info = graph.parse_solver_name("solver-rhel-8-py36").unwrap();
        assert_eq!(info, SolverInfo::new("rhel", "8", "3.6"));
        assert!(matches!(
            graph.parse_solver_name("solver-f1-3.8"),
            Err(ClientError::Parse(_))
        ));
    }
}
