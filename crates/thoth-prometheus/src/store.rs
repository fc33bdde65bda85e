use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder, proto::MetricFamily};
use tracing::trace;

use crate::error::GaugeError;

/// Ordered label values identifying one child of a family.
pub type LabelValues = Vec<String>;

/// Prometheus type of a described family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Gauge => f.write_str("gauge"),
            MetricKind::Counter => f.write_str("counter"),
        }
    }
}

/// Named, labeled gauges (last write wins) and counters (monotonic).
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct GaugeStore {
    inner: Arc<Inner>,
}

struct Inner {
    namespace: Option<String>,
    registry: Registry,
    families: RwLock<HashMap<String, Arc<Family>>>,
}

enum Vector {
    Gauge(GaugeVec),
    Counter(CounterVec),
}

struct Family {
    vec: Vector,
    label_names: Vec<String>,
    /// Children that were written at least once. Also serializes writes within the family.
    touched: Mutex<HashSet<LabelValues>>,
}

impl Family {
    fn kind(&self) -> MetricKind {
        match self.vec {
            Vector::Gauge(_) => MetricKind::Gauge,
            Vector::Counter(_) => MetricKind::Counter,
        }
    }

    fn check_arity(&self, name: &str, labels: &[&str]) -> Result<(), GaugeError> {
        if labels.len() != self.label_names.len() {
            return Err(GaugeError::LabelArity {
                name: name.to_string(),
                expected: self.label_names.len(),
                got: labels.len(),
            });
        }
        Ok(())
    }

    fn value(&self, labels: &[&str]) -> f64 {
        match &self.vec {
            Vector::Gauge(v) => v.with_label_values(labels).get(),
            Vector::Counter(v) => v.with_label_values(labels).get(),
        }
    }
}

impl GaugeStore {
    /// Create a store whose metric names are prefixed with `namespace_`.
    pub fn new(namespace: Option<&str>) -> Self {
        Self::with_registry(Registry::new(), namespace)
    }

    /// Create a store on top of an existing registry.
    pub fn with_registry(registry: Registry, namespace: Option<&str>) -> Self {
        Self {
            inner: Arc::new(Inner {
                namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
                registry,
                families: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a gauge family.
    ///
    /// `label_names` fixes the order of label values for every later
    /// [`set`](Self::set) and [`get`](Self::get); pass `&[]` for an unlabeled gauge.
    pub fn describe(&self, name: &str, help: &str, label_names: &[&str]) -> Result<(), GaugeError> {
        self.register(name, help, label_names, MetricKind::Gauge)
    }

    /// Register a counter family, written with [`inc`](Self::inc).
    pub fn describe_counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<(), GaugeError> {
        self.register(name, help, label_names, MetricKind::Counter)
    }

    fn register(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        kind: MetricKind,
    ) -> Result<(), GaugeError> {
        let mut families = self
            .inner
            .families
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if families.contains_key(name) {
            return Err(GaugeError::AlreadyDescribed(name.to_string()));
        }

        let mut opts = Opts::new(name, help);
        if let Some(ns) = &self.inner.namespace {
            opts = opts.namespace(ns.clone());
        }
        let vec = match kind {
            MetricKind::Gauge => {
                let vec = GaugeVec::new(opts, label_names)?;
                self.inner.registry.register(Box::new(vec.clone()))?;
                Vector::Gauge(vec)
            }
            MetricKind::Counter => {
                let vec = CounterVec::new(opts, label_names)?;
                self.inner.registry.register(Box::new(vec.clone()))?;
                Vector::Counter(vec)
            }
        };

        families.insert(
            name.to_string(),
            Arc::new(Family {
                vec,
                label_names: label_names.iter().map(|l| l.to_string()).collect(),
                touched: Mutex::new(HashSet::new()),
            }),
        );
        trace!(metric = name, %kind, labels = ?label_names, "metric described");
        Ok(())
    }

    /// Overwrite the value of gauge `name{labels}`.
    pub fn set(&self, name: &str, labels: &[&str], value: f64) -> Result<(), GaugeError> {
        let family = self.family(name)?;
        family.check_arity(name, labels)?;
        let Vector::Gauge(vec) = &family.vec else {
            return Err(GaugeError::WrongKind {
                name: name.to_string(),
                expected: MetricKind::Gauge,
            });
        };

        let mut touched = family.touched.lock().unwrap_or_else(PoisonError::into_inner);
        vec.with_label_values(labels).set(value);
        touched.insert(labels.iter().map(|l| l.to_string()).collect());
        Ok(())
    }

    /// Add `by` to counter `name{labels}`. Negative or non-finite increments are rejected.
    pub fn inc(&self, name: &str, labels: &[&str], by: f64) -> Result<(), GaugeError> {
        let family = self.family(name)?;
        family.check_arity(name, labels)?;
        let Vector::Counter(vec) = &family.vec else {
            return Err(GaugeError::WrongKind {
                name: name.to_string(),
                expected: MetricKind::Counter,
            });
        };
        if !by.is_finite() || by < 0.0 {
            return Err(GaugeError::InvalidIncrement {
                name: name.to_string(),
                by,
            });
        }

        let mut touched = family.touched.lock().unwrap_or_else(PoisonError::into_inner);
        vec.with_label_values(labels).inc_by(by);
        touched.insert(labels.iter().map(|l| l.to_string()).collect());
        Ok(())
    }

    /// Current value of `name{labels}`, `None` if it was never written.
    pub fn get(&self, name: &str, labels: &[&str]) -> Option<f64> {
        let family = self.family(name).ok()?;
        family.check_arity(name, labels).ok()?;

        let touched = family.touched.lock().unwrap_or_else(PoisonError::into_inner);
        let key: LabelValues = labels.iter().map(|l| l.to_string()).collect();
        touched.contains(&key).then(|| family.value(labels))
    }

    /// Exposed name of `name`, with the namespace prefix.
    pub fn qualified_name(&self, name: &str) -> String {
        match &self.inner.namespace {
            Some(ns) => format!("{ns}_{name}"),
            None => name.to_string(),
        }
    }

    pub fn kind(&self, name: &str) -> Option<MetricKind> {
        self.family(name).ok().map(|f| f.kind())
    }

    /// Names of described families, sorted.
    pub fn names(&self) -> Vec<String> {
        let families = self
            .inner
            .families
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = families.keys().cloned().collect();
        names.sort();
        names
    }

    /// Label names of a described family.
    pub fn label_names(&self, name: &str) -> Option<Vec<String>> {
        self.family(name).ok().map(|f| f.label_names.clone())
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.inner.registry.gather()
    }

    /// Render every family in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, GaugeError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.gather(), &mut buffer)
            .map_err(|e| GaugeError::Encode(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| GaugeError::Encode(e.to_string()))
    }

    fn family(&self, name: &str) -> Result<Arc<Family>, GaugeError> {
        let families = self
            .inner
            .families
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        families
            .get(name)
            .cloned()
            .ok_or_else(|| GaugeError::Unknown(name.to_string()))
    }
}
