use std::sync::Arc;

use async_trait::async_trait;

/// What happened inside the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // cycle
    CycleStarted,
    CycleFinished,

    // job lifecycle
    JobStarting,
    JobSucceeded,
    JobFailed,
    JobTimedOut,
    JobPanicked,

    // shutdown
    ShutdownRequested,
    AllStoppedWithinGrace,
    GraceExceeded,
}

/// Executor notification delivered to every [`Subscribe`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub cycle: u64,
    pub job: Option<String>,
    pub reason: Option<String>,
    pub elapsed_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl Event {
    pub fn new(kind: EventKind, cycle: u64) -> Self {
        Self {
            kind,
            cycle,
            job: None,
            reason: None,
            elapsed_ms: None,
            timeout_ms: None,
        }
    }

    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_elapsed_ms(mut self, ms: u64) -> Self {
        self.elapsed_ms = Some(ms);
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }
}

/// Observer of executor events (logging, bookkeeping, tests).
#[async_trait]
pub trait Subscribe: Send + Sync {
    async fn on_event(&self, event: &Event);

    fn name(&self) -> &'static str;
}

/// Fan-out to all subscribers, in registration order.
#[derive(Clone, Default)]
pub(crate) struct Bus {
    subscribers: Arc<Vec<Arc<dyn Subscribe>>>,
}

impl Bus {
    pub(crate) fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self {
            subscribers: Arc::new(subscribers),
        }
    }

    pub(crate) async fn publish(&self, event: Event) {
        for sub in self.subscribers.iter() {
            sub.on_event(&event).await;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}
