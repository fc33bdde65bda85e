use async_trait::async_trait;
use thoth_clients::{ClientError, GraphClient};
use thoth_core::{CancellationToken, JobError, MetricJob};
use time::OffsetDateTime;
use tracing::{debug, error, warn};

use crate::{
    catalog::{
        GRAPHDB_CVE_UPDATE_DAYS, GRAPHDB_SI_UNANALYZED_PYTHON_PACKAGE_VERSIONS_CHANGE,
        GRAPHDB_TOTAL_NUMBER_CVE, GRAPHDB_TOTAL_NUMBER_SI_ANALYZED_PYTHON_PACKAGES,
        GRAPHDB_TOTAL_NUMBER_SI_NOT_ANALYZABLE_PYTHON_PACKAGES,
        GRAPHDB_TOTAL_NUMBER_SI_UNANALYZED_PYTHON_PACKAGES,
        PRESCRIPTION_QUAY_SECURITY_UPDATE_DAYS,
    },
    context::JobContext,
};

/// Single-count security queries, each published as one unlabeled gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphCountQuery {
    SiAnalyzed,
    /// Unanalyzed versions that ship no source distribution.
    SiNotAnalyzable,
    CveRecords,
}

impl GraphCountQuery {
    pub fn job_name(self) -> &'static str {
        match self {
            GraphCountQuery::SiAnalyzed => "si_analyzed",
            GraphCountQuery::SiNotAnalyzable => "si_not_analyzable",
            GraphCountQuery::CveRecords => "cve_count",
        }
    }

    pub fn gauge(self) -> &'static str {
        match self {
            GraphCountQuery::SiAnalyzed => GRAPHDB_TOTAL_NUMBER_SI_ANALYZED_PYTHON_PACKAGES,
            GraphCountQuery::SiNotAnalyzable => {
                GRAPHDB_TOTAL_NUMBER_SI_NOT_ANALYZABLE_PYTHON_PACKAGES
            }
            GraphCountQuery::CveRecords => GRAPHDB_TOTAL_NUMBER_CVE,
        }
    }

    async fn run(self, graph: &dyn GraphClient) -> Result<i64, JobError> {
        let count = match self {
            GraphCountQuery::SiAnalyzed => graph.count_si_analyzed_python_packages(true).await?,
            GraphCountQuery::SiNotAnalyzable => {
                graph.count_si_unanalyzed_python_packages(true, false).await?
            }
            GraphCountQuery::CveRecords => graph.count_python_cve_records().await?,
        };
        Ok(count)
    }
}

/// Publishes one [`GraphCountQuery`]; skipped while the graph schema is stale.
pub struct GraphCountJob {
    ctx: JobContext,
    query: GraphCountQuery,
}

impl GraphCountJob {
    pub fn new(ctx: JobContext, query: GraphCountQuery) -> Self {
        Self { ctx, query }
    }
}

#[async_trait]
impl MetricJob for GraphCountJob {
    fn name(&self) -> &str {
        self.query.job_name()
    }

    async fn collect(&self, _token: CancellationToken) -> Result<(), JobError> {
        let graph = self.ctx.graph_with_schema().await?;
        let count = self.query.run(graph).await?;

        let gauge = self.query.gauge();
        self.ctx.set(gauge, &[], count as f64)?;
        debug!(gauge, value = count, "graph count published");
        Ok(())
    }
}

/// Security-indicator backlog size, plus how many versions left it since
/// the previous sample.
///
/// The previous sample comes from [`JobContext::history`] when configured,
/// otherwise from this store's last published value. A growing backlog
/// adds nothing to the change counter.
pub struct SiUnanalyzedJob {
    ctx: JobContext,
}

impl SiUnanalyzedJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    async fn previous(&self) -> Result<Option<f64>, JobError> {
        let gauge = GRAPHDB_TOTAL_NUMBER_SI_UNANALYZED_PYTHON_PACKAGES;
        match &self.ctx.history {
            Some(history) => {
                let metric = self.ctx.gauges.qualified_name(gauge);
                Ok(history.current_value(&metric).await?)
            }
            None => Ok(self.ctx.gauges.get(gauge, &[])),
        }
    }
}

#[async_trait]
impl MetricJob for SiUnanalyzedJob {
    fn name(&self) -> &str {
        "si_unanalyzed"
    }

    async fn collect(&self, _token: CancellationToken) -> Result<(), JobError> {
        let graph = self.ctx.graph_with_schema().await?;
        let count = graph.count_si_unanalyzed_python_packages(true, true).await?;

        let previous = self.previous().await?;
        self.ctx
            .set(GRAPHDB_TOTAL_NUMBER_SI_UNANALYZED_PYTHON_PACKAGES, &[], count as f64)?;
        debug!(
            gauge = GRAPHDB_TOTAL_NUMBER_SI_UNANALYZED_PYTHON_PACKAGES,
            value = count,
            "graph count published"
        );

        let Some(previous) = previous else {
            warn!(
                gauge = GRAPHDB_TOTAL_NUMBER_SI_UNANALYZED_PYTHON_PACKAGES,
                "no previous sample; backlog change not computed"
            );
            return Ok(());
        };

        let change = (previous - count as f64).max(0.0);
        self.ctx
            .inc(GRAPHDB_SI_UNANALYZED_PYTHON_PACKAGE_VERSIONS_CHANGE, &[], change)?;
        debug!(
            counter = GRAPHDB_SI_UNANALYZED_PYTHON_PACKAGE_VERSIONS_CHANGE,
            previous,
            change,
            "backlog change counted"
        );
        Ok(())
    }
}

/// Whole days since the CVE records were last refreshed.
pub struct CveUpdateDaysJob {
    ctx: JobContext,
    now: fn() -> OffsetDateTime,
}

impl CveUpdateDaysJob {
    pub fn new(ctx: JobContext) -> Self {
        Self::with_clock(ctx, OffsetDateTime::now_utc)
    }

    pub fn with_clock(ctx: JobContext, now: fn() -> OffsetDateTime) -> Self {
        Self { ctx, now }
    }
}

#[async_trait]
impl MetricJob for CveUpdateDaysJob {
    fn name(&self) -> &str {
        "cve_update_days"
    }

    async fn collect(&self, _token: CancellationToken) -> Result<(), JobError> {
        let graph = self.ctx.graph_with_schema().await?;
        let Some(updated) = graph.cve_timestamp().await? else {
            error!("no CVE update timestamp recorded in the graph database");
            return Ok(());
        };

        let days = ((self.now)() - updated).whole_days();
        self.ctx.set(GRAPHDB_CVE_UPDATE_DAYS, &[], days as f64)?;
        debug!(gauge = GRAPHDB_CVE_UPDATE_DAYS, value = days, %updated, "CVE age published");
        Ok(())
    }
}

/// Whole days since the Quay security data in the prescriptions were refreshed.
///
/// A prescription that cannot be downloaded is logged and the gauge keeps
/// its previous value.
pub struct QuaySecurityDaysJob {
    ctx: JobContext,
    now: fn() -> OffsetDateTime,
}

impl QuaySecurityDaysJob {
    pub fn new(ctx: JobContext) -> Self {
        Self::with_clock(ctx, OffsetDateTime::now_utc)
    }

    pub fn with_clock(ctx: JobContext, now: fn() -> OffsetDateTime) -> Self {
        Self { ctx, now }
    }
}

#[async_trait]
impl MetricJob for QuaySecurityDaysJob {
    fn name(&self) -> &str {
        "quay_security_days"
    }

    async fn collect(&self, _token: CancellationToken) -> Result<(), JobError> {
        let updated = match self.ctx.prescriptions.quay_security_timestamp().await {
            Ok(ts) => ts,
            Err(ClientError::Status { status, body }) => {
                error!(status, body = %body, "failed to download the quay security prescription");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let days = ((self.now)() - updated).whole_days();
        self.ctx
            .set(PRESCRIPTION_QUAY_SECURITY_UPDATE_DAYS, &[], days as f64)?;
        debug!(
            gauge = PRESCRIPTION_QUAY_SECURITY_UPDATE_DAYS,
            value = days,
            %updated,
            "quay security age published"
        );
        Ok(())
    }
}
