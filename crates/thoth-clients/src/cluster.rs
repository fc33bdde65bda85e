use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::ClientError,
    http::{endpoint, fetch_json, parse_base_url},
};

/// Label selector identifying solver templates in the infra namespace.
const SOLVER_SELECTOR: &str = "template=solver";

/// Cluster introspection used by the solver jobs.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Names of the solvers deployed in the infra namespace.
    async fn list_solver_names(&self) -> Result<Vec<String>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct OpenShiftConfig {
    /// API server, e.g. `https://kubernetes.default.svc`.
    pub api_url: String,
    /// Namespace holding the solver templates.
    pub namespace: String,
    /// Bearer token; requests are sent unauthenticated when `None`.
    pub token: Option<String>,
    pub timeout: Duration,
}

/// Reads solver templates through the OpenShift template API.
pub struct OpenShiftClient {
    http: reqwest::Client,
    api: Url,
    namespace: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TemplateList {
    #[serde(default)]
    items: Vec<TemplateItem>,
}

#[derive(Debug, Deserialize)]
struct TemplateItem {
    metadata: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    name: String,
}

impl OpenShiftClient {
    pub fn new(cfg: OpenShiftConfig) -> Result<Self, ClientError> {
        if cfg.namespace.trim().is_empty() {
            return Err(ClientError::InvalidConfig("namespace must not be empty".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            api: parse_base_url(&cfg.api_url)?,
            namespace: cfg.namespace,
            token: cfg.token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn templates_url(&self) -> Url {
        endpoint(
            &self.api,
            &[
                "apis",
                "template.openshift.io",
                "v1",
                "namespaces",
                self.namespace.as_str(),
                "templates",
            ],
            &[("labelSelector", SOLVER_SELECTOR.to_string())],
        )
    }
}

#[async_trait]
impl ClusterClient for OpenShiftClient {
    #[instrument(level = "debug", skip(self), fields(namespace = %self.namespace))]
    async fn list_solver_names(&self) -> Result<Vec<String>, ClientError> {
        let mut req = self.http.get(self.templates_url());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let list: TemplateList = fetch_json(req).await?;
        let names: Vec<String> = list.items.into_iter().map(|t| t.metadata.name).collect();
        debug!(solvers = names.len(), "solver templates listed");
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::{HeaderMap, StatusCode, header},
        response::IntoResponse,
        routing::get,
    };
    use serde_json::json;

    use super::*;

    const TOKEN: &str = "s3cr3t";

    async fn templates(
        Path(ns): Path<String>,
        Query(q): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some("Bearer s3cr3t");
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(json!({"message": "unauthorized"})));
        }
        if ns != "thoth-infra" || q.get("labelSelector").map(String::as_str) != Some("template=solver") {
            return (StatusCode::NOT_FOUND, Json(json!({"message": "not found"})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "kind": "TemplateList",
                "items": [
                    {"metadata": {"name": "solver-fedora-31-py38", "labels": {"template": "solver"}}},
                    {"metadata": {"name": "solver-fedora-32-py39"}}
                ]
            })),
        )
    }

    async fn serve() -> String {
        let router = Router::new().route(
            "/apis/template.openshift.io/v1/namespaces/{ns}/templates",
            get(templates),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(api_url: String, token: Option<&str>) -> OpenShiftClient {
        OpenShiftClient::new(OpenShiftConfig {
            api_url,
            namespace: "thoth-infra".into(),
            token: token.map(str::to_string),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn lists_solver_names_in_order() {
        let api = serve().await;
        let names = client(api, Some(TOKEN)).list_solver_names().await.unwrap();
        assert_eq!(names, vec!["solver-fedora-31-py38", "solver-fedora-32-py39"]);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let api = serve().await;
        let err = client(api, None).list_solver_names().await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn unreachable_api_is_connectivity_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}"), Some(TOKEN))
            .list_solver_names()
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Connectivity(_)));
    }

    #[test]
    fn empty_namespace_is_rejected() {
        let err = OpenShiftClient::new(OpenShiftConfig {
            api_url: "https://kubernetes.default.svc".into(),
            namespace: " ".into(),
            token: None,
            timeout: Duration::from_secs(1),
        })
        .err()
        .unwrap();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }
}
