//! ABOUTME: Pool monitor exporting connection usage and configured pool bounds
//! ABOUTME: Feeds checkout/checkin/clear events into a usage tracker

use crate::{
    event::{PoolEvent, PoolEventKind},
    handler::PoolEventHandler,
    tracker::PoolUsageTracker,
};
use mp_config::PoolMonitorOptions;
use mp_core::Result;
use mp_obs::{GaugeVec, MetricDefinition, MetricsRegistry};

pub const POOL_LABELS: [&str; 1] = ["instance"];

/// Exports connection pool gauges
///
/// - `<namespace>_mongodb_connection_pool_usage`: connections checked out
/// - `<namespace>_mongodb_connection_pool_min`: configured minimum pool size
/// - `<namespace>_mongodb_connection_pool_max`: configured maximum pool size
#[derive(Debug)]
pub struct PoolMonitor {
    instance_name: String,
    tracker: PoolUsageTracker,
    usage: GaugeVec,
    min: GaugeVec,
    max: GaugeVec,
}

impl PoolMonitor {
    /// Register (or reuse) the pool gauges in `registry`
    ///
    /// Each monitor tracks usage on its own; share one through `Arc` for a single pool.
    pub fn new(registry: &MetricsRegistry, options: PoolMonitorOptions) -> Result<Self> {
        let gauge = |name: &str, help: &str| -> Result<GaugeVec> {
            registry
                .register(MetricDefinition::gauge(
                    options.namespace.as_str(),
                    name,
                    help,
                    &POOL_LABELS,
                ))?
                .into_instrument()
                .into_gauge()
        };

        let usage = gauge("mongodb_connection_pool_usage", "MongoDB Connection Pool Usage")?;
        let min = gauge("mongodb_connection_pool_min", "MongoDB Connection Pool Minimum")?;
        let max = gauge("mongodb_connection_pool_max", "MongoDB Connection Pool Maximum")?;

        tracing::debug!(
            instance = %options.instance_name,
            metric = usage.name(),
            "Pool monitor ready"
        );

        Ok(Self {
            instance_name: options.instance_name,
            tracker: PoolUsageTracker::new(),
            usage,
            min,
            max,
        })
    }

    /// Same as [`PoolMonitor::new`] on the process-wide registry
    pub fn with_global_registry(options: PoolMonitorOptions) -> Result<Self> {
        Self::new(&MetricsRegistry::global(), options)
    }

    /// Connections currently checked out according to this monitor
    pub fn in_use(&self) -> i64 {
        self.tracker.value()
    }

    pub fn usage(&self) -> &GaugeVec {
        &self.usage
    }

    pub fn min(&self) -> &GaugeVec {
        &self.min
    }

    pub fn max(&self) -> &GaugeVec {
        &self.max
    }
}

impl PoolEventHandler for PoolMonitor {
    fn handle_pool_event(&self, event: Option<&PoolEvent>) {
        let Some(event) = event else {
            return;
        };

        tracing::trace!(kind = %event.kind, address = %event.address, "Pool event");

        match event.kind {
            PoolEventKind::GetSucceeded => self.tracker.acquire(),
            PoolEventKind::ConnectionReturned => self.tracker.release(),
            PoolEventKind::PoolCleared | PoolEventKind::PoolCreated => self.tracker.clear(),
            _ => {}
        }

        let labels = [self.instance_name.as_str()];

        // Publish under the tracker lock so a slower thread cannot overwrite a newer count
        self.tracker
            .with_value(|used| self.usage.set(&labels, used));

        if let Some(sizes) = &event.pool_options {
            self.min.set(&labels, saturating_i64(sizes.min_pool_size));
            self.max.set(&labels, saturating_i64(sizes.max_pool_size));
        }
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
