//! Job registry and periodic executor for metric collection.
//!
//! A [`JobRegistry`] is filled at startup and moved into an [`Executor`],
//! which runs every job once per cycle with a per-job timeout, isolating
//! failures so one job never aborts the cycle.

pub mod error;
pub use error::{CoreError, JobError, RegistryError};

pub mod event;
pub use event::{Event, EventKind, Subscribe};

pub mod executor;
pub use executor::{CycleReport, Executor, ExecutorConfig, JobOutcome, JobReport};

pub mod job;
pub use job::{JobFn, JobRef, MetricJob};

pub mod registry;
pub use registry::JobRegistry;

pub use tokio_util::sync::CancellationToken;
