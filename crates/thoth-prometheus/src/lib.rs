//! Prometheus-backed gauge store for the metrics exporter.
//!
//! [`GaugeStore`] keeps named gauge families in a [`prometheus::Registry`].
//! A family is described once with its label names, after which jobs set
//! children by label values. Reads distinguish "never set" from zero.
//!
//! ## Example
//! ```rust
//! use thoth_prometheus::GaugeStore;
//!
//! # fn main() -> Result<(), thoth_prometheus::GaugeError> {
//! let store = GaugeStore::new(Some("thoth"));
//! store.describe("graphdb_total_number_solvers", "Number of solvers", &[])?;
//! store.set("graphdb_total_number_solvers", &[], 3.0)?;
//!
//! assert_eq!(store.get("graphdb_total_number_solvers", &[]), Some(3.0));
//! assert!(store.encode_text()?.contains("thoth_graphdb_total_number_solvers 3"));
//! # Ok(())
//! # }
//! ```
//!
//! ## HTTP Server
//! With the `http` feature, [`ScrapeApi`] mounts `GET /metrics` and
//! `GET /healthz` on an axum router.

mod error;
pub use error::GaugeError;

mod store;
pub use store::{GaugeStore, LabelValues, MetricKind};

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::ScrapeApi;

pub use prometheus::{Encoder, Registry, TextEncoder};
