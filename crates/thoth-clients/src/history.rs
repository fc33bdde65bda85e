use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::ClientError,
    http::{endpoint, fetch_json, parse_base_url},
};

/// Last value a monitoring server scraped for one of our metrics.
#[async_trait]
pub trait MetricHistory: Send + Sync {
    /// `None` when the server has no sample for `metric`.
    async fn current_value(&self, metric: &str) -> Result<Option<f64>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    pub url: String,
    /// Bearer token; requests are sent unauthenticated when `None`.
    pub token: Option<String>,
    /// Restricts queries to samples scraped from this exporter instance.
    pub instance: Option<String>,
    pub timeout: Duration,
}

/// [`MetricHistory`] over the Prometheus instant-query API.
pub struct PrometheusHistory {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
    instance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<Sample>,
}

#[derive(Debug, Deserialize)]
struct Sample {
    /// `[unix_time, "value"]`
    value: (f64, String),
}

impl PrometheusHistory {
    pub fn new(cfg: PrometheusConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base: parse_base_url(&cfg.url)?,
            token: cfg.token.filter(|t| !t.trim().is_empty()),
            instance: cfg.instance.filter(|i| !i.trim().is_empty()),
        })
    }

    fn selector(&self, metric: &str) -> String {
        match &self.instance {
            Some(instance) => format!("{metric}{{instance=\"{}\"}}", instance.replace('"', "\\\"")),
            None => metric.to_string(),
        }
    }
}

#[async_trait]
impl MetricHistory for PrometheusHistory {
    #[instrument(level = "debug", skip(self), fields(base = %self.base))]
    async fn current_value(&self, metric: &str) -> Result<Option<f64>, ClientError> {
        let url = endpoint(
            &self.base,
            &["api", "v1", "query"],
            &[("query", self.selector(metric))],
        );
        let mut req = self.http.get(url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp: QueryResponse = fetch_json(req).await?;
        if resp.status != "success" {
            return Err(ClientError::InvalidResponse(format!(
                "query {metric} failed: {}",
                resp.error.unwrap_or(resp.status)
            )));
        }

        let Some(sample) = resp.data.and_then(|d| d.result.into_iter().next()) else {
            return Ok(None);
        };
        let value = sample.value.1.parse::<f64>().map_err(|e| {
            ClientError::InvalidResponse(format!("sample {:?} of {metric}: {e}", sample.value.1))
        })?;
        debug!(metric, value, "previous sample read");
        Ok(Some(value))
    }
}
