//! ABOUTME: Metric definitions and the checks run before registration
//! ABOUTME: Builds fully qualified names from namespace and metric name

use mp_core::{Error, Result};
use std::collections::HashSet;

/// Shape of an instrument together with its kind-specific parameters
#[derive(Debug, Clone, PartialEq)]
pub enum MetricKind {
    Histogram { buckets: Vec<f64> },
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Histogram { .. } => "histogram",
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Everything needed to register one labeled instrument
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    pub kind: MetricKind,
    pub namespace: String,
    pub name: String,
    pub help: String,
    pub label_names: Vec<String>,
}

impl MetricDefinition {
    pub fn histogram(
        namespace: impl Into<String>,
        name: impl Into<String>,
        help: impl Into<String>,
        label_names: &[&str],
        buckets: impl Into<Vec<f64>>,
    ) -> Self {
        Self::new(
            MetricKind::Histogram {
                buckets: buckets.into(),
            },
            namespace,
            name,
            help,
            label_names,
        )
    }

    pub fn counter(
        namespace: impl Into<String>,
        name: impl Into<String>,
        help: impl Into<String>,
        label_names: &[&str],
    ) -> Self {
        Self::new(MetricKind::Counter, namespace, name, help, label_names)
    }

    pub fn gauge(
        namespace: impl Into<String>,
        name: impl Into<String>,
        help: impl Into<String>,
        label_names: &[&str],
    ) -> Self {
        Self::new(MetricKind::Gauge, namespace, name, help, label_names)
    }

    fn new(
        kind: MetricKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
        help: impl Into<String>,
        label_names: &[&str],
    ) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
            help: help.into(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Non-empty parts of (namespace, name) joined by `_`
    ///
    /// # Examples
    ///
    /// ```
    /// use mp_obs::MetricDefinition;
    ///
    /// let def = MetricDefinition::counter("shop", "mongo_command_errors", "errors", &[]);
    /// assert_eq!(def.fq_name(), "shop_mongo_command_errors");
    ///
    /// let def = MetricDefinition::counter("", "mongo_command_errors", "errors", &[]);
    /// assert_eq!(def.fq_name(), "mongo_command_errors");
    /// ```
    pub fn fq_name(&self) -> String {
        [self.namespace.as_str(), self.name.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Reject definitions the exposition format cannot represent
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidMetric("metric name is empty".to_string()));
        }

        let fq_name = self.fq_name();
        if !is_valid_metric_name(&fq_name) {
            return Err(Error::InvalidMetric(format!(
                "'{}' is not a valid metric name",
                fq_name
            )));
        }

        let mut seen = HashSet::new();
        for label in &self.label_names {
            if !is_valid_label_name(label) {
                return Err(Error::InvalidMetric(format!(
                    "'{}' is not a valid label name for {}",
                    label, fq_name
                )));
            }
            if !seen.insert(label.as_str()) {
                return Err(Error::InvalidMetric(format!(
                    "duplicate label '{}' on {}",
                    label, fq_name
                )));
            }
        }

        if let MetricKind::Histogram { buckets } = &self.kind {
            if self.label_names.iter().any(|l| l == "le") {
                return Err(Error::InvalidMetric(format!(
                    "'le' is reserved for histogram buckets on {}",
                    fq_name
                )));
            }
            validate_buckets(&fq_name, buckets)?;
        }

        Ok(())
    }
}

fn validate_buckets(fq_name: &str, buckets: &[f64]) -> Result<()> {
    if buckets.is_empty() {
        return Err(Error::InvalidMetric(format!(
            "histogram {} has no buckets",
            fq_name
        )));
    }

    if let Some(bad) = buckets.iter().find(|b| !b.is_finite()) {
        return Err(Error::InvalidMetric(format!(
            "histogram {} has non-finite bucket {}",
            fq_name, bad
        )));
    }

    if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(Error::InvalidMetric(format!(
            "histogram {} buckets must be strictly ascending, got {:?}",
            fq_name, buckets
        )));
    }

    Ok(())
}

// [a-zA-Z_:][a-zA-Z0-9_:]*
fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

// [a-zA-Z_][a-zA-Z0-9_]*, minus the reserved "__" prefix
fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
