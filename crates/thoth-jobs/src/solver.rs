use async_trait::async_trait;
use thoth_clients::ErrorFilter;
use thoth_core::{CancellationToken, JobError, MetricJob};
use tracing::{debug, error, warn};

use crate::{
    catalog::{
        GRAPHDB_TOTAL_NUMBER_SOLVERS, GRAPHDB_TOTAL_NUMBER_UNSOLVED_PYTHON_PACKAGES,
        GRAPHDB_TOTAL_PYTHON_PACKAGES_SOLVED_WITH_NO_ERROR,
        GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR,
        GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR_UNPARSEABLE,
        GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR_UNSOLVABLE,
    },
    context::JobContext,
};

/// Number of solvers deployed in the infra namespace.
pub struct SolverCountJob {
    ctx: JobContext,
}

impl SolverCountJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl MetricJob for SolverCountJob {
    fn name(&self) -> &str {
        "solver_count"
    }

    async fn collect(&self, _token: CancellationToken) -> Result<(), JobError> {
        let solvers = self.ctx.cluster.list_solver_names().await?;
        let count = solvers.len();
        self.ctx.set(GRAPHDB_TOTAL_NUMBER_SOLVERS, &[], count as f64)?;
        debug!(
            gauge = GRAPHDB_TOTAL_NUMBER_SOLVERS,
            value = count,
            "solvers counted"
        );
        Ok(())
    }
}

/// Unsolved python package versions, one gauge entry per solver.
///
/// A solver whose name does not parse is skipped and logged; the remaining
/// solvers are still published and the run ends in [`JobError::Partial`].
/// Graph failures abort the run.
pub struct UnsolvedPackagesJob {
    ctx: JobContext,
}

impl UnsolvedPackagesJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl MetricJob for UnsolvedPackagesJob {
    fn name(&self) -> &str {
        "unsolved_python_packages"
    }

    async fn collect(&self, token: CancellationToken) -> Result<(), JobError> {
        let solvers = self.ctx.cluster.list_solver_names().await?;
        let graph = self.ctx.graph().await?;

        let mut failed = 0;
        for name in &solvers {
            if token.is_cancelled() {
                return Err(JobError::Cancelled);
            }

            let info = match graph.parse_solver_name(name) {
                Ok(info) => info,
                Err(e) => {
                    error!(solver = %name, error = %e, "skipping solver with malformed name");
                    failed += 1;
                    continue;
                }
            };

            let count = graph.count_unsolved_python_packages(&info).await?;
            self.ctx.set(
                GRAPHDB_TOTAL_NUMBER_UNSOLVED_PYTHON_PACKAGES,
                &[name.as_str()],
                count as f64,
            )?;
            debug!(
                gauge = GRAPHDB_TOTAL_NUMBER_UNSOLVED_PYTHON_PACKAGES,
                solver = %name,
                value = count,
                "unsolved packages counted"
            );
        }

        if failed > 0 {
            return Err(JobError::Partial {
                failed,
                total: solvers.len(),
            });
        }
        Ok(())
    }
}

/// Solver outcome breakdown over distinct package versions.
pub struct SolverErrorJob {
    ctx: JobContext,
}

impl SolverErrorJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl MetricJob for SolverErrorJob {
    fn name(&self) -> &str {
        "solver_errors"
    }

    async fn collect(&self, _token: CancellationToken) -> Result<(), JobError> {
        let graph = self.ctx.graph().await?;

        let solved = graph.count_solved_python_packages(true).await?;
        let with_error = graph.count_error_python_packages(ErrorFilter::all()).await?;
        let unparseable = graph
            .count_error_python_packages(ErrorFilter::unparseable())
            .await?;
        let unsolvable = graph
            .count_error_python_packages(ErrorFilter::unsolvable())
            .await?;

        for (gauge, value) in [
            (GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR, with_error),
            (GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR_UNPARSEABLE, unparseable),
            (GRAPHDB_TOTAL_PYTHON_PACKAGES_WITH_SOLVER_ERROR_UNSOLVABLE, unsolvable),
        ] {
            self.ctx.set(gauge, &[], value as f64)?;
            debug!(gauge, value, "solver errors counted");
        }

        let no_error = solved - with_error;
        if no_error < 0 {
            warn!(solved, with_error, "more erroneous than solved package versions");
            return Err(JobError::DataAnomaly(format!(
                "solved ({solved}) is lower than solved with error ({with_error})"
            )));
        }
        self.ctx.set(
            GRAPHDB_TOTAL_PYTHON_PACKAGES_SOLVED_WITH_NO_ERROR,
            &[],
            no_error as f64,
        )?;
        debug!(
            gauge = GRAPHDB_TOTAL_PYTHON_PACKAGES_SOLVED_WITH_NO_ERROR,
            value = no_error,
            "solved packages counted"
        );
        Ok(())
    }
}
