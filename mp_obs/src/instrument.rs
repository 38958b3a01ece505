//! ABOUTME: Labeled histogram, counter and gauge vectors backed by prometheus-client
//! ABOUTME: Label values are passed positionally in the order of the definition

use crate::definition::{MetricDefinition, MetricKind};
use mp_core::{Error, Result};
use prometheus_client::{
    metrics::{
        counter::Counter,
        family::{Family, MetricConstructor},
        gauge::Gauge,
        histogram::Histogram,
    },
    registry::Registry,
};
use std::sync::Arc;

/// Label pairs in definition order
pub type LabelSet = Vec<(String, String)>;

/// Identity shared by every clone of one registered instrument
#[derive(Debug)]
pub(crate) struct Descriptor {
    pub(crate) name: String,
    pub(crate) help: String,
    pub(crate) kind: &'static str,
    pub(crate) label_names: Vec<String>,
}

impl Descriptor {
    fn label_set(&self, values: &[&str]) -> Option<LabelSet> {
        if values.len() != self.label_names.len() {
            tracing::error!(
                metric = %self.name,
                expected = self.label_names.len(),
                got = values.len(),
                "Label cardinality mismatch, observation dropped"
            );
            return None;
        }

        Some(
            self.label_names
                .iter()
                .cloned()
                .zip(values.iter().map(|v| v.to_string()))
                .collect(),
        )
    }

    /// Whether `definition` describes this instrument closely enough to reuse it
    pub(crate) fn accepts(&self, definition: &MetricDefinition) -> bool {
        self.kind == definition.kind.as_str()
            && self.help == definition.help
            && self.label_names == definition.label_names
    }
}

/// Builds one histogram per label set with the configured buckets
#[derive(Debug, Clone)]
struct Buckets(Arc<[f64]>);

impl MetricConstructor<Histogram> for Buckets {
    fn new_metric(&self) -> Histogram {
        Histogram::new(self.0.iter().copied())
    }
}

#[derive(Debug, Clone)]
pub struct HistogramVec {
    descriptor: Arc<Descriptor>,
    family: Family<LabelSet, Histogram, Buckets>,
}

impl HistogramVec {
    /// Record `value` for the series identified by `labels`
    pub fn observe(&self, labels: &[&str], value: f64) {
        if let Some(set) = self.descriptor.label_set(labels) {
            self.family.get_or_create(&set).observe(value);
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn same_instrument(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.descriptor, &other.descriptor)
    }
}

#[derive(Debug, Clone)]
pub struct CounterVec {
    descriptor: Arc<Descriptor>,
    family: Family<LabelSet, Counter>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[&str]) {
        if let Some(set) = self.descriptor.label_set(labels) {
            self.family.get_or_create(&set).inc();
        }
    }

    /// Current count
    ///
    /// `prometheus-client` has no read-only lookup, so an untouched series is
    /// created at zero and shows up in [`MetricsRegistry::encode`] from then on.
    /// Check the exposition instead when absence matters.
    ///
    /// [`MetricsRegistry::encode`]: crate::MetricsRegistry::encode
    pub fn get(&self, labels: &[&str]) -> Option<u64> {
        let set = self.descriptor.label_set(labels)?;
        Some(self.family.get_or_create(&set).get())
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn same_instrument(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.descriptor, &other.descriptor)
    }
}

#[derive(Debug, Clone)]
pub struct GaugeVec {
    descriptor: Arc<Descriptor>,
    family: Family<LabelSet, Gauge>,
}

impl GaugeVec {
    pub fn set(&self, labels: &[&str], value: i64) {
        if let Some(set) = self.descriptor.label_set(labels) {
            self.family.get_or_create(&set).set(value);
        }
    }

    /// Current value; like [`CounterVec::get`], an untouched series is created at zero
    pub fn get(&self, labels: &[&str]) -> Option<i64> {
        let set = self.descriptor.label_set(labels)?;
        Some(self.family.get_or_create(&set).get())
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn same_instrument(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.descriptor, &other.descriptor)
    }
}

/// A registered instrument of any kind
#[derive(Debug, Clone)]
pub enum Instrument {
    Histogram(HistogramVec),
    Counter(CounterVec),
    Gauge(GaugeVec),
}

impl Instrument {
    /// Create the instrument and add it to `registry` under its fully qualified name
    pub(crate) fn register_new(registry: &mut Registry, definition: &MetricDefinition) -> Self {
        let descriptor = Arc::new(Descriptor {
            name: definition.fq_name(),
            help: definition.help.clone(),
            kind: definition.kind.as_str(),
            label_names: definition.label_names.clone(),
        });
        let name = descriptor.name.clone();
        let help = descriptor.help.clone();

        match &definition.kind {
            MetricKind::Histogram { buckets } => {
                let family = Family::<LabelSet, Histogram, Buckets>::new_with_constructor(Buckets(
                    buckets.as_slice().into(),
                ));
                registry.register(name, help, family.clone());
                Instrument::Histogram(HistogramVec { descriptor, family })
            }
            MetricKind::Counter => {
                let family = Family::<LabelSet, Counter>::default();
                registry.register(name, help, family.clone());
                Instrument::Counter(CounterVec { descriptor, family })
            }
            MetricKind::Gauge => {
                let family = Family::<LabelSet, Gauge>::default();
                registry.register(name, help, family.clone());
                Instrument::Gauge(GaugeVec { descriptor, family })
            }
        }
    }

    pub(crate) fn descriptor(&self) -> &Descriptor {
        match self {
            Instrument::Histogram(h) => &h.descriptor,
            Instrument::Counter(c) => &c.descriptor,
            Instrument::Gauge(g) => &g.descriptor,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor().name
    }

    pub fn into_histogram(self) -> Result<HistogramVec> {
        match self {
            Instrument::Histogram(h) => Ok(h),
            other => Err(other.kind_mismatch("histogram")),
        }
    }

    pub fn into_counter(self) -> Result<CounterVec> {
        match self {
            Instrument::Counter(c) => Ok(c),
            other => Err(other.kind_mismatch("counter")),
        }
    }

    pub fn into_gauge(self) -> Result<GaugeVec> {
        match self {
            Instrument::Gauge(g) => Ok(g),
            other => Err(other.kind_mismatch("gauge")),
        }
    }

    fn kind_mismatch(&self, wanted: &str) -> Error {
        let descriptor = self.descriptor();
        Error::MetricConflict(format!(
            "{} is a {}, not a {}",
            descriptor.name, descriptor.kind, wanted
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(definition: MetricDefinition) -> Instrument {
        let mut registry = Registry::default();
        Instrument::register_new(&mut registry, &definition)
    }

    #[test]
    fn test_counter_vec_counts_per_label_set() {
        let counter = registered(MetricDefinition::counter(
            "",
            "errors",
            "help",
            &["instance", "command"],
        ))
        .into_counter()
        .expect("counter");

        counter.inc(&["db", "find"]);
        counter.inc(&["db", "find"]);
        counter.inc(&["db", "insert"]);

        assert_eq!(counter.get(&["db", "find"]), Some(2));
        assert_eq!(counter.get(&["db", "insert"]), Some(1));
        assert_eq!(counter.get(&["db", "delete"]), Some(0));
    }

    #[test]
    fn test_label_cardinality_mismatch_is_dropped() {
        let gauge = registered(MetricDefinition::gauge("", "usage", "help", &["instance"]))
            .into_gauge()
            .expect("gauge");

        gauge.set(&["db", "extra"], 5);
        gauge.set(&[], 5);

        assert_eq!(gauge.get(&["db", "extra"]), None);
        assert_eq!(gauge.get(&["db"]), Some(0));
    }

    #[test]
    fn test_gauge_set_overwrites() {
        let gauge = registered(MetricDefinition::gauge("", "usage", "help", &["instance"]))
            .into_gauge()
            .expect("gauge");

        gauge.set(&["db"], 7);
        gauge.set(&["db"], -2);

        assert_eq!(gauge.get(&["db"]), Some(-2));
    }

    #[test]
    fn test_wrong_kind_accessor_is_conflict() {
        let instrument = registered(MetricDefinition::gauge("", "usage", "help", &[]));

        let err = instrument.into_counter().unwrap_err();
        assert!(matches!(err, Error::MetricConflict(msg) if msg.contains("gauge")));
    }

    #[test]
    fn test_clones_are_same_instrument() {
        let histogram = registered(MetricDefinition::histogram(
            "",
            "latency",
            "help",
            &["instance"],
            vec![0.1, 1.0],
        ))
        .into_histogram()
        .expect("histogram");
        let other = registered(MetricDefinition::histogram(
            "",
            "latency",
            "help",
            &["instance"],
            vec![0.1, 1.0],
        ))
        .into_histogram()
        .expect("histogram");

        assert!(histogram.same_instrument(&histogram.clone()));
        assert!(!histogram.same_instrument(&other));
    }
}
