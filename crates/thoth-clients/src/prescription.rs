use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
    macros::format_description,
};
use tracing::{debug, instrument};

use crate::{
    error::ClientError,
    http::{fetch_text, parse_base_url},
};

/// Published prescription recording the last Quay security scan.
pub const DEFAULT_QUAY_SECURITY_URL: &str = "https://raw.githubusercontent.com/thoth-station/prescriptions/master/prescriptions/_containers/quay_security.yaml";

/// Read access to published prescriptions.
#[async_trait]
pub trait PrescriptionClient: Send + Sync {
    /// When the Quay security data was last refreshed.
    async fn quay_security_timestamp(&self) -> Result<OffsetDateTime, ClientError>;
}

#[derive(Debug, Clone)]
pub struct PrescriptionConfig {
    pub quay_security_url: String,
    pub timeout: Duration,
}

pub struct HttpPrescriptionClient {
    http: reqwest::Client,
    quay_security: Url,
}

#[derive(Debug, Deserialize)]
struct Prescription {
    units: Units,
}

#[derive(Debug, Deserialize)]
struct Units {
    #[serde(default)]
    boots: Vec<Boot>,
}

#[derive(Debug, Deserialize)]
struct Boot {
    run: Run,
}

#[derive(Debug, Deserialize)]
struct Run {
    #[serde(default)]
    stack_info: Vec<StackInfo>,
}

#[derive(Debug, Deserialize)]
struct StackInfo {
    message: String,
}

impl HttpPrescriptionClient {
    pub fn new(cfg: PrescriptionConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            quay_security: parse_base_url(&cfg.quay_security_url)?,
        })
    }
}

#[async_trait]
impl PrescriptionClient for HttpPrescriptionClient {
    #[instrument(level = "debug", skip(self), fields(url = %self.quay_security))]
    async fn quay_security_timestamp(&self) -> Result<OffsetDateTime, ClientError> {
        let body = fetch_text(self.http.get(self.quay_security.clone())).await?;
        let ts = quay_timestamp_from_yaml(&body)?;
        debug!(timestamp = %ts, "quay security timestamp read");
        Ok(ts)
    }
}

/// The timestamp is the last, quoted word of the first boot's first stack message.
fn quay_timestamp_from_yaml(body: &str) -> Result<OffsetDateTime, ClientError> {
    let doc: Prescription = serde_yaml::from_str(body)
        .map_err(|e| ClientError::InvalidResponse(format!("prescription is not valid YAML: {e}")))?;

    let message = doc
        .units
        .boots
        .first()
        .and_then(|boot| boot.run.stack_info.first())
        .map(|info| info.message.as_str())
        .ok_or_else(|| {
            ClientError::InvalidResponse("prescription has no boot stack message".into())
        })?;

    let word = message
        .split_whitespace()
        .last()
        .map(|w| w.trim_matches(|c| c == '\'' || c == '"'))
        .unwrap_or_default();
    parse_timestamp(word).ok_or_else(|| {
        ClientError::InvalidResponse(format!("no timestamp at the end of {message:?}"))
    })
}

/// RFC 3339, or a naive `YYYY-MM-DD[THH:MM:SS[.f]]` taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    let naive = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    if let Ok(ts) = PrimitiveDateTime::parse(&raw.replacen(' ', "T", 1), naive) {
        return Some(ts.assume_utc());
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};

    use super::*;

    const PRESCRIPTION: &str = r#"
apiVersion: thoth-station.ninja/v1
kind: prescription
spec:
  name: quay_security
units:
  boots:
    - name: QuaySecurityTimestamp
      run:
        stack_info:
          - type: INFO
            message: 'Quay security data were last updated on ''2021-06-01T10:15:00'''
            link: https://quay.io
"#;

    async fn serve(body: &'static str, status: StatusCode) -> String {
        let router = Router::new().route(
            "/prescriptions/_containers/quay_security.yaml",
            get(move || async move { (status, body).into_response() }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/prescriptions/_containers/quay_security.yaml")
    }

    fn client(url: String) -> HttpPrescriptionClient {
        HttpPrescriptionClient::new(PrescriptionConfig {
            quay_security_url: url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn reads_timestamp_from_last_word() {
        let url = serve(PRESCRIPTION, StatusCode::OK).await;
        let ts = client(url).quay_security_timestamp().await.unwrap();
        assert_eq!(ts, time::macros::datetime!(2021-06-01 10:15 UTC));
    }

    #[tokio::test]
    async fn missing_prescription_keeps_status() {
        let url = serve("404: Not Found", StatusCode::NOT_FOUND).await;
        let err = client(url).quay_security_timestamp().await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 404, .. }));
    }

    #[test]
    fn prescription_without_stack_info_is_invalid() {
        let err = quay_timestamp_from_yaml("units:\n  boots: []\n").unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[test]
    fn message_without_timestamp_is_invalid() {
        let yaml = "units:\n  boots:\n    - run:\n        stack_info:\n          - message: not updated yet\n";
        assert!(matches!(
            quay_timestamp_from_yaml(yaml),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn timestamp_formats() {
        use time::macros::datetime;

        assert_eq!(
            parse_timestamp("2021-06-01T10:15:00Z"),
            Some(datetime!(2021-06-01 10:15 UTC))
        );
        assert_eq!(
            parse_timestamp("2021-06-01T10:15:00.250"),
            Some(datetime!(2021-06-01 10:15:00.25 UTC))
        );
        assert_eq!(
            parse_timestamp("2021-06-01 10:15:00"),
            Some(datetime!(2021-06-01 10:15 UTC))
        );
        assert_eq!(parse_timestamp("2021-06-01"), Some(datetime!(2021-06-01 0:00 UTC)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
