use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::JobError;

pub type JobRef = Arc<dyn MetricJob>;

/// A named, idempotent unit of collection work.
///
/// Implementations own the gauges they write and must not touch gauges of
/// other jobs. The token is cancelled when the process is shutting down.
#[async_trait]
pub trait MetricJob: Send + Sync {
    fn name(&self) -> &str;

    async fn collect(&self, token: CancellationToken) -> Result<(), JobError>;
}

/// Closure-backed job.
///
/// ```rust
/// use thoth_core::{JobFn, JobRef, MetricJob};
///
/// let job: JobRef = JobFn::arc("noop", |_token| async move { Ok(()) });
/// assert_eq!(job.name(), "noop");
/// ```
pub struct JobFn<F> {
    name: String,
    f: F,
}

impl<F> JobFn<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    pub fn arc<Fut>(name: impl Into<String>, f: F) -> JobRef
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> MetricJob for JobFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self, token: CancellationToken) -> Result<(), JobError> {
        (self.f)(token).await
    }
}
