use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use thoth_clients::{
    ClientError, ClusterClient, ErrorFilter, GraphClient, MetricHistory, PrescriptionClient,
};
use thoth_model::SolverInfo;
use thoth_prometheus::GaugeStore;
use time::OffsetDateTime;

use crate::{catalog::describe_all, context::JobContext};

pub(crate) struct Harness {
    pub ctx: JobContext,
    pub gauges: GaugeStore,
    pub graph: Arc<FakeGraph>,
    pub cluster: Arc<FakeCluster>,
    pub prescriptions: Arc<FakePrescriptions>,
}

pub(crate) fn harness(graph: FakeGraph, cluster: FakeCluster) -> Harness {
    harness_with(graph, cluster, FakePrescriptions::default())
}

pub(crate) fn harness_with(
    graph: FakeGraph,
    cluster: FakeCluster,
    prescriptions: FakePrescriptions,
) -> Harness {
    let gauges = GaugeStore::new(Some("thoth"));
    describe_all(&gauges).unwrap();
    let graph = Arc::new(graph);
    let cluster = Arc::new(cluster);
    let prescriptions = Arc::new(prescriptions);
    let ctx = JobContext::new(
        gauges.clone(),
        graph.clone() as Arc<dyn GraphClient>,
        cluster.clone() as Arc<dyn ClusterClient>,
        prescriptions.clone() as Arc<dyn PrescriptionClient>,
        "test",
    );
    Harness {
        ctx,
        gauges,
        graph,
        cluster,
        prescriptions,
    }
}

/// Canned prescription answer.
#[derive(Debug, Clone)]
pub(crate) enum Prescription {
    UpdatedAt(OffsetDateTime),
    Status(u16),
    Invalid,
}

pub(crate) struct FakePrescriptions {
    answer: Mutex<Prescription>,
}

impl Default for FakePrescriptions {
    fn default() -> Self {
        Self::at(OffsetDateTime::UNIX_EPOCH)
    }
}

impl FakePrescriptions {
    pub fn at(updated: OffsetDateTime) -> Self {
        Self {
            answer: Mutex::new(Prescription::UpdatedAt(updated)),
        }
    }

    pub fn invalid() -> Self {
        Self {
            answer: Mutex::new(Prescription::Invalid),
        }
    }

    pub fn fail_with_status(&self, status: u16) {
        *self.answer.lock().unwrap() = Prescription::Status(status);
    }
}

#[async_trait]
impl PrescriptionClient for FakePrescriptions {
    async fn quay_security_timestamp(&self) -> Result<OffsetDateTime, ClientError> {
        match self.answer.lock().unwrap().clone() {
            Prescription::UpdatedAt(ts) => Ok(ts),
            Prescription::Status(status) => Err(ClientError::Status {
                status,
                body: "not found".into(),
            }),
            Prescription::Invalid => Err(ClientError::InvalidResponse(
                "no stack info in prescription".into(),
            )),
        }
    }
}

/// Prometheus stand-in holding one sample for whatever is asked.
pub(crate) struct FakeHistory {
    value: Mutex<Option<f64>>,
    queries: Mutex<Vec<String>>,
    down: AtomicBool,
}

impl FakeHistory {
    pub fn with_value(value: Option<f64>) -> Self {
        Self {
            value: Mutex::new(value),
            queries: Mutex::new(Vec::new()),
            down: AtomicBool::new(false),
        }
    }

    pub fn set(&self, value: Option<f64>) {
        *self.value.lock().unwrap() = value;
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.down.store(!reachable, Ordering::SeqCst);
    }

    pub fn queried(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricHistory for FakeHistory {
    async fn current_value(&self, metric: &str) -> Result<Option<f64>, ClientError> {
        self.queries.lock().unwrap().push(metric.to_string());
        if self.down.load(Ordering::SeqCst) {
            return Err(ClientError::Connectivity("prometheus is down".into()));
        }
        Ok(*self.value.lock().unwrap())
    }
}

#[derive(Default)]
pub(crate) struct FakeCluster {
    solvers: Mutex<Vec<String>>,
    pub down: AtomicBool,
}

impl FakeCluster {
    pub fn with_solvers(names: &[&str]) -> Self {
        Self {
            solvers: Mutex::new(names.iter().map(|n| n.to_string()).collect()),
            down: AtomicBool::new(false),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.down.store(!reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_solver_names(&self) -> Result<Vec<String>, ClientError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ClientError::Connectivity("connection refused".into()));
        }
        Ok(self.solvers.lock().unwrap().clone())
    }
}

/// In-memory graph with fixed counts.
pub(crate) struct FakeGraph {
    pub schema_up_to_date: bool,
    pub unsolved: HashMap<SolverInfo, i64>,
    /// Names parsed outside the default solver-name grammar.
    pub aliases: HashMap<String, SolverInfo>,
    pub solved: i64,
    pub error: i64,
    pub unparseable: i64,
    pub unsolvable: i64,
    pub si_analyzed: i64,
    pub si_unanalyzed: i64,
    pub si_not_analyzable: i64,
    pub cve_records: i64,
    pub cve_timestamp: Option<OffsetDateTime>,
    pub connects: AtomicUsize,
    pub connected: AtomicBool,
    pub down: AtomicBool,
}

impl Default for FakeGraph {
    fn default() -> Self {
        Self {
            schema_up_to_date: true,
            unsolved: HashMap::new(),
            aliases: HashMap::new(),
            solved: 0,
            error: 0,
            unparseable: 0,
            unsolvable: 0,
            si_analyzed: 0,
            si_unanalyzed: 0,
            si_not_analyzable: 0,
            cve_records: 0,
            cve_timestamp: None,
            connects: AtomicUsize::new(0),
            connected: AtomicBool::new(false),
            down: AtomicBool::new(false),
        }
    }
}

impl FakeGraph {
    pub fn unreachable(self) -> Self {
        self.set_reachable(false);
        self
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.down.store(!reachable, Ordering::SeqCst);
        if !reachable {
            self.connected.store(false, Ordering::SeqCst);
        }
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ClientError::Connectivity("graph database is down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl GraphClient for FakeGraph {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn is_schema_up_to_date(&self) -> Result<bool, ClientError> {
        self.check()?;
        Ok(self.schema_up_to_date)
    }

    fn parse_solver_name(&self, name: &str) -> Result<SolverInfo, ClientError> {
        if let Some(info) = self.aliases.get(name) {
            return Ok(info.clone());
        }
        Ok(SolverInfo::from_solver_name(name)?)
    }

    async fn count_unsolved_python_packages(&self, solver: &SolverInfo) -> Result<i64, ClientError> {
        self.check()?;
        Ok(self.unsolved.get(solver).copied().unwrap_or(0))
    }

    async fn count_solved_python_packages(&self, _distinct: bool) -> Result<i64, ClientError> {
        self.check()?;
        Ok(self.solved)
    }

    async fn count_error_python_packages(&self, filter: ErrorFilter) -> Result<i64, ClientError> {
        self.check()?;
        Ok(match (filter.unparseable, filter.unsolvable) {
            (true, _) => self.unparseable,
            (_, true) => self.unsolvable,
            _ => self.error,
        })
    }

    async fn count_si_analyzed_python_packages(&self, _distinct: bool) -> Result<i64, ClientError> {
        self.check()?;
        Ok(self.si_analyzed)
    }

    async fn count_si_unanalyzed_python_packages(
        &self,
        _distinct: bool,
        provides_source_distro: bool,
    ) -> Result<i64, ClientError> {
        self.check()?;
        Ok(if provides_source_distro {
            self.si_unanalyzed
        } else {
            self.si_not_analyzable
        })
    }

    async fn count_python_cve_records(&self) -> Result<i64, ClientError> {
        self.check()?;
        Ok(self.cve_records)
    }

    async fn cve_timestamp(&self) -> Result<Option<OffsetDateTime>, ClientError> {
        self.check()?;
        Ok(self.cve_timestamp)
    }
}
