use std::{net::SocketAddr, path::Path, time::Duration};

use thiserror::Error;
use thoth_clients::DEFAULT_QUAY_SECURITY_URL;
use thoth_observe::{LoggerError, LoggerFormat, LoggerLevel};

pub const SERVICE_ACCOUNT_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error(transparent)]
    Logger(#[from] LoggerError),
}

/// Process configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub listen: SocketAddr,
    pub interval: Duration,
    pub job_timeout: Duration,
    pub grace: Duration,
    pub concurrency: usize,
    /// Prefix of every published metric name.
    pub namespace: String,
    pub deployment: String,

    pub graph_url: String,
    pub graph_timeout: Duration,

    pub kubernetes_api_url: String,
    pub kubernetes_timeout: Duration,
    pub infra_namespace: String,
    pub kubernetes_token: Option<String>,

    /// Prescription YAML holding the Quay security refresh timestamp.
    pub quay_security_url: String,

    /// Prometheus answering for previously scraped values; unset means
    /// the exporter's own last values are used.
    pub prometheus_url: Option<String>,
    pub prometheus_token: Option<String>,
    /// `instance` label of this exporter in Prometheus.
    pub prometheus_instance: Option<String>,

    pub log_level: LoggerLevel,
    pub log_format: LoggerFormat,
    pub log_targets: bool,
}

impl ExporterConfig {
    /// Read the process environment, falling back to the mounted
    /// service-account token when no token variable is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::from_lookup(|key| std::env::var(key).ok())?;
        if cfg.kubernetes_token.is_none() {
            cfg.kubernetes_token = read_token(Path::new(SERVICE_ACCOUNT_TOKEN));
        }
        Ok(cfg)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let millis = |key: &'static str, default: u64| -> Result<Duration, ConfigError> {
            get(key)
                .map(|v| parse::<u64>(key, &v))
                .transpose()
                .map(|v| Duration::from_millis(v.unwrap_or(default)))
        };

        let cfg = Self {
            listen: get("THOTH_METRICS_EXPORTER_LISTEN")
                .map(|v| parse("THOTH_METRICS_EXPORTER_LISTEN", &v))
                .transpose()?
                .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080))),
            interval: millis("THOTH_METRICS_EXPORTER_INTERVAL_MS", 60_000)?,
            job_timeout: millis("THOTH_METRICS_EXPORTER_JOB_TIMEOUT_MS", 15_000)?,
            grace: millis("THOTH_METRICS_EXPORTER_GRACE_MS", 5_000)?,
            concurrency: get("THOTH_METRICS_EXPORTER_CONCURRENCY")
                .map(|v| parse("THOTH_METRICS_EXPORTER_CONCURRENCY", &v))
                .transpose()?
                .unwrap_or(4),
            namespace: get("THOTH_METRICS_EXPORTER_NAMESPACE").unwrap_or_else(|| "thoth".into()),
            deployment: required("THOTH_DEPLOYMENT_NAME")?,

            graph_url: required("THOTH_GRAPH_URL")?,
            graph_timeout: millis("THOTH_GRAPH_TIMEOUT_MS", 10_000)?,

            kubernetes_api_url: get("KUBERNETES_API_URL")
                .unwrap_or_else(|| "https://kubernetes.default.svc".into()),
            kubernetes_timeout: millis("KUBERNETES_API_TIMEOUT_MS", 10_000)?,
            infra_namespace: required("THOTH_INFRA_NAMESPACE")?,
            kubernetes_token: get("KUBERNETES_API_TOKEN"),

            quay_security_url: get("THOTH_METRICS_EXPORTER_QUAY_SECURITY_TIMESTAMP_PRESCRIPTION_URL")
                .unwrap_or_else(|| DEFAULT_QUAY_SECURITY_URL.into()),

            prometheus_url: get("THOTH_METRICS_EXPORTER_PROMETHEUS_URL"),
            prometheus_token: get("THOTH_METRICS_EXPORTER_PROMETHEUS_TOKEN"),
            prometheus_instance: get("METRICS_EXPORTER_INFRA_PROMETHEUS_INSTANCE"),

            log_level: get("THOTH_LOG_LEVEL")
                .map(|v| v.parse::<LoggerLevel>())
                .transpose()?
                .unwrap_or_default(),
            log_format: get("THOTH_LOG_FORMAT")
                .map(|v| v.parse::<LoggerFormat>())
                .transpose()?
                .unwrap_or_default(),
            log_targets: get("THOTH_LOG_TARGETS")
                .map(|v| parse("THOTH_LOG_TARGETS", &v))
                .transpose()?
                .unwrap_or(true),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("THOTH_METRICS_EXPORTER_INTERVAL_MS", self.interval),
            ("THOTH_METRICS_EXPORTER_JOB_TIMEOUT_MS", self.job_timeout),
            ("THOTH_METRICS_EXPORTER_GRACE_MS", self.grace),
            ("THOTH_GRAPH_TIMEOUT_MS", self.graph_timeout),
            ("KUBERNETES_API_TIMEOUT_MS", self.kubernetes_timeout),
        ];
        for (key, value) in positive {
            if value.is_zero() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "THOTH_METRICS_EXPORTER_CONCURRENCY",
                reason: "must be greater than zero".into(),
            });
        }
        if !self
            .namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::Invalid {
                key: "THOTH_METRICS_EXPORTER_NAMESPACE",
                reason: format!("{:?} is not a valid metric prefix", self.namespace),
            });
        }
        Ok(())
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn read_token(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
