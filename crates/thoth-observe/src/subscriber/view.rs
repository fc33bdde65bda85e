use thoth_core::{Event, EventKind};
use tracing::{debug, error, info, warn};

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        // cycle
        EventKind::CycleStarted => "collection cycle started",
        EventKind::CycleFinished => "collection cycle finished",

        // job lifecycle
        EventKind::JobStarting => "job is starting",
        EventKind::JobSucceeded => "job finished",
        EventKind::JobFailed => "job failed; gauges keep their previous values",
        EventKind::JobTimedOut => "job exceeded its timeout",
        EventKind::JobPanicked => "job panicked",

        // shutdown
        EventKind::ShutdownRequested => "shutdown requested",
        EventKind::AllStoppedWithinGrace => "all jobs stopped within grace period",
        EventKind::GraceExceeded => "grace exceeded; some jobs did not stop in time",
    }
}

/// Log `e` at the level its kind warrants.
pub fn log_event(e: &Event) {
    let msg = message_for(e.kind);
    let job = e.job.as_deref().unwrap_or("unknown");
    let reason = e.reason.as_deref().unwrap_or("unknown");

    match e.kind {
        EventKind::CycleStarted => debug!(cycle = e.cycle, "{msg}"),
        EventKind::CycleFinished => info!(
            cycle = e.cycle,
            elapsed_ms = e.elapsed_ms.unwrap_or(0),
            summary = e.reason.as_deref().unwrap_or(""),
            "{msg}"
        ),

        EventKind::JobStarting => debug!(cycle = e.cycle, job, "{msg}"),
        EventKind::JobSucceeded => debug!(
            cycle = e.cycle,
            job,
            elapsed_ms = e.elapsed_ms.unwrap_or(0),
            "{msg}"
        ),
        EventKind::JobFailed => error!(cycle = e.cycle, job, reason, "{msg}"),
        EventKind::JobTimedOut => warn!(
            cycle = e.cycle,
            job,
            timeout_ms = e.timeout_ms.unwrap_or(0),
            "{msg}"
        ),
        EventKind::JobPanicked => error!(cycle = e.cycle, job, reason, "{msg}"),

        EventKind::ShutdownRequested => info!("{msg}"),
        EventKind::AllStoppedWithinGrace => info!("{msg}"),
        EventKind::GraceExceeded => warn!(
            timeout_ms = e.timeout_ms.unwrap_or(0),
            "{msg}"
        ),
    }
}
