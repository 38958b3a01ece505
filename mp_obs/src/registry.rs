//! ABOUTME: Process-wide or isolated metric registries with collision-tolerant registration
//! ABOUTME: Re-registering an identical definition hands back the existing instrument

use crate::{definition::MetricDefinition, instrument::Instrument};
use mp_core::{Error, Result};
use prometheus_client::{encoding::text::encode, registry::Registry};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

static GLOBAL: OnceLock<MetricsRegistry> = OnceLock::new();

/// Outcome of [`MetricsRegistry::register`]
#[derive(Debug, Clone)]
pub enum Registration {
    /// First registration of this identity
    Created(Instrument),
    /// Identity was already taken by an equivalent definition
    AlreadyExists(Instrument),
}

impl Registration {
    pub fn into_instrument(self) -> Instrument {
        match self {
            Registration::Created(instrument) | Registration::AlreadyExists(instrument) => {
                instrument
            }
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Registration::Created(_))
    }
}

#[derive(Debug, Default)]
struct Inner {
    registry: Registry,
    instruments: HashMap<String, Instrument>,
}

/// Metrics registry for Prometheus
///
/// Clones share the same underlying registry.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl MetricsRegistry {
    /// An isolated registry, mostly useful in tests
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every monitor in the process
    pub fn global() -> Self {
        GLOBAL.get_or_init(MetricsRegistry::new).clone()
    }

    /// Register `definition`, or return the instrument already registered under its name
    ///
    /// Fails when the definition is malformed, or when the name is taken by an
    /// instrument with a different kind, help text or label names.
    pub fn register(&self, definition: MetricDefinition) -> Result<Registration> {
        if let Err(e) = definition.validate() {
            tracing::error!(error = %e, "Rejected metric definition");
            return Err(e);
        }

        let name = definition.fq_name();
        let mut inner = self.lock();

        if let Some(existing) = inner.instruments.get(&name) {
            if existing.descriptor().accepts(&definition) {
                tracing::debug!(metric = %name, "Metric already registered, reusing instrument");
                return Ok(Registration::AlreadyExists(existing.clone()));
            }

            let descriptor = existing.descriptor();
            let err = Error::MetricConflict(format!(
                "{} is already registered as a {} with labels {:?} and help {:?}",
                name, descriptor.kind, descriptor.label_names, descriptor.help
            ));
            tracing::error!(error = %err, "Metric registration collided");
            return Err(err);
        }

        let instrument = Instrument::register_new(&mut inner.registry, &definition);
        inner.instruments.insert(name.clone(), instrument.clone());
        tracing::debug!(metric = %name, kind = definition.kind.as_str(), "Metric registered");

        Ok(Registration::Created(instrument))
    }

    /// Registered instrument names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.lock().instruments.keys().cloned().collect();
        names.sort();
        names
    }

    /// Render every registered metric in the OpenMetrics text format
    pub fn encode(&self) -> Result<String> {
        let inner = self.lock();

        let mut buffer = String::new();
        encode(&mut buffer, &inner.registry)
            .map_err(|e| Error::Encoding(format!("Failed to encode metrics: {}", e)))?;

        Ok(buffer)
    }

    // Nothing panics while the lock is held, so a poisoned guard is still consistent
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
