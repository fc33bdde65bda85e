use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{
    sync::Semaphore,
    task::{AbortHandle, JoinSet},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{CoreError, JobError},
    event::{Bus, Event, EventKind, Subscribe},
    job::JobRef,
    registry::JobRegistry,
};

/// Cadence and limits of the collection loop.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Delay between the starts of two cycles.
    pub interval: Duration,
    /// Upper bound for a single job run; exceeding it counts as a failure.
    pub job_timeout: Duration,
    /// How long an in-flight cycle may keep running after shutdown was requested.
    pub grace: Duration,
    /// Maximum number of jobs running at the same time within a cycle.
    pub concurrency: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            job_timeout: Duration::from_secs(15),
            grace: Duration::from_secs(5),
            concurrency: 4,
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval.is_zero() {
            return Err(CoreError::InvalidConfig("interval must be > 0".into()));
        }
        if self.job_timeout.is_zero() {
            return Err(CoreError::InvalidConfig("job_timeout must be > 0".into()));
        }
        if self.grace.is_zero() {
            return Err(CoreError::InvalidConfig("grace must be > 0".into()));
        }
        if self.concurrency == 0 {
            return Err(CoreError::InvalidConfig("concurrency must be > 0".into()));
        }
        Ok(())
    }
}

/// Result of one job run within a cycle.
#[derive(Debug)]
pub enum JobOutcome {
    Succeeded,
    Failed(JobError),
    TimedOut,
    Panicked(String),
}

impl JobOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded)
    }
}

#[derive(Debug)]
pub struct JobReport {
    pub name: String,
    pub outcome: JobOutcome,
    pub elapsed: Duration,
}

/// Outcomes of one cycle, in registration order.
#[derive(Debug)]
pub struct CycleReport {
    pub cycle: u64,
    pub jobs: Vec<JobReport>,
    pub elapsed: Duration,
}

impl CycleReport {
    pub fn succeeded(&self) -> usize {
        self.jobs.iter().filter(|j| j.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.jobs.len() - self.succeeded()
    }

    pub fn get(&self, name: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|j| j.name == name)
    }
}

/// Runs every registered job once per cycle on a fixed interval.
pub struct Executor {
    registry: Arc<JobRegistry>,
    cfg: ExecutorConfig,
    bus: Bus,
}

impl Executor {
    pub fn new(registry: JobRegistry, cfg: ExecutorConfig) -> Result<Self, CoreError> {
        cfg.validate()?;
        Ok(Self {
            registry: Arc::new(registry),
            cfg,
            bus: Bus::default(),
        })
    }

    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.bus = Bus::new(subscribers);
        self
    }

    #[inline]
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> &ExecutorConfig {
        &self.cfg
    }

    /// Run cycles until `token` is cancelled. Returns the number of completed cycles.
    ///
    /// The first cycle starts immediately. A cycle in flight at shutdown gets
    /// `grace` to finish; after that its jobs are aborted.
    pub async fn run(&self, token: CancellationToken) -> u64 {
        info!(
            jobs = self.registry.len(),
            subscribers = self.bus.len(),
            interval_ms = self.cfg.interval.as_millis() as u64,
            "metric executor started"
        );

        let mut ticker = tokio::time::interval(self.cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut completed = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    self.bus.publish(Event::new(EventKind::ShutdownRequested, completed)).await;
                    self.bus.publish(Event::new(EventKind::AllStoppedWithinGrace, completed)).await;
                    break;
                }
                _ = ticker.tick() => {}
            }

            let cycle = completed + 1;
            let cycle_token = token.child_token();
            let fut = self.run_cycle(cycle, &cycle_token);
            tokio::pin!(fut);

            tokio::select! {
                _ = &mut fut => {
                    completed = cycle;
                }
                _ = token.cancelled() => {
                    self.bus.publish(Event::new(EventKind::ShutdownRequested, cycle)).await;
                    match tokio::time::timeout(self.cfg.grace, &mut fut).await {
                        Ok(_) => {
                            completed = cycle;
                            self.bus.publish(Event::new(EventKind::AllStoppedWithinGrace, cycle)).await;
                        }
                        Err(_) => {
                            self.bus
                                .publish(
                                    Event::new(EventKind::GraceExceeded, cycle)
                                        .with_timeout_ms(self.cfg.grace.as_millis() as u64),
                                )
                                .await;
                        }
                    }
                    break;
                }
            }
        }

        info!(cycles = completed, "metric executor stopped");
        completed
    }

    /// Run every job once and collect their outcomes.
    #[instrument(level = "debug", skip(self, token))]
    pub async fn run_cycle(&self, cycle: u64, token: &CancellationToken) -> CycleReport {
        let started = Instant::now();
        self.bus.publish(Event::new(EventKind::CycleStarted, cycle)).await;

        let permits = Arc::new(Semaphore::new(self.cfg.concurrency));
        let mut set = JoinSet::new();

        for (idx, job) in self.registry.all_jobs().iter().enumerate() {
            let job = Arc::clone(job);
            let permits = Arc::clone(&permits);
            let token = token.child_token();
            let bus = self.bus.clone();
            let timeout = self.cfg.job_timeout;

            set.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok();
                let report = run_job(job, cycle, token, timeout, &bus).await;
                (idx, report)
            });
        }

        let mut slots: Vec<Option<JobReport>> = std::iter::repeat_with(|| None)
            .take(self.registry.len())
            .collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, report)) => slots[idx] = Some(report),
                Err(e) => warn!(cycle, error = %e, "job supervisor task lost"),
            }
        }

        let report = CycleReport {
            cycle,
            jobs: slots.into_iter().flatten().collect(),
            elapsed: started.elapsed(),
        };

        self.bus
            .publish(
                Event::new(EventKind::CycleFinished, cycle)
                    .with_elapsed_ms(report.elapsed.as_millis() as u64)
                    .with_reason(format!(
                        "{} succeeded, {} failed",
                        report.succeeded(),
                        report.failed()
                    )),
            )
            .await;
        report
    }
}

// Aborts the wrapped task when the owning future is dropped mid-flight.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn run_job(
    job: JobRef,
    cycle: u64,
    token: CancellationToken,
    timeout: Duration,
    bus: &Bus,
) -> JobReport {
    let name = job.name().to_string();
    bus.publish(Event::new(EventKind::JobStarting, cycle).with_job(&name))
        .await;

    let started = Instant::now();
    let handle = tokio::spawn(async move { job.collect(token).await });
    let _guard = AbortOnDrop(handle.abort_handle());

    let outcome = match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(Ok(()))) => JobOutcome::Succeeded,
        Ok(Ok(Err(e))) => JobOutcome::Failed(e),
        Ok(Err(join)) => JobOutcome::Panicked(join.to_string()),
        Err(_) => JobOutcome::TimedOut,
    };
    let elapsed = started.elapsed();
    let elapsed_ms = elapsed.as_millis() as u64;

    let event = match &outcome {
        JobOutcome::Succeeded => {
            debug!(job = %name, cycle, elapsed_ms, "job completed");
            Event::new(EventKind::JobSucceeded, cycle)
        }
        JobOutcome::Failed(e) => Event::new(EventKind::JobFailed, cycle)
            .with_reason(format!("{}: {e}", e.kind())),
        JobOutcome::TimedOut => Event::new(EventKind::JobTimedOut, cycle)
            .with_timeout_ms(timeout.as_millis() as u64),
        JobOutcome::Panicked(reason) => {
            Event::new(EventKind::JobPanicked, cycle).with_reason(reason.clone())
        }
    };
    bus.publish(event.with_job(&name).with_elapsed_ms(elapsed_ms))
        .await;

    JobReport {
        name,
        outcome,
        elapsed,
    }
}
