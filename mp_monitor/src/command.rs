//! ABOUTME: Command monitor exporting a duration histogram and an error counter
//! ABOUTME: Both metrics are labeled by instance name and command name

use crate::{
    event::{CommandFailedEvent, CommandFinishedEvent, CommandSucceededEvent},
    handler::CommandEventHandler,
};
use mp_config::MonitorOptions;
use mp_core::Result;
use mp_obs::{CounterVec, HistogramVec, MetricDefinition, MetricsRegistry};
use std::time::Duration;

pub const COMMAND_LABELS: [&str; 2] = ["instance", "command"];

/// Elapsed time as fractional seconds, exact for sub-second durations
///
/// ```
/// use std::time::Duration;
/// assert_eq!(mp_monitor::duration_seconds(Duration::from_millis(200)), 0.2);
/// ```
pub fn duration_seconds(duration: Duration) -> f64 {
    duration.as_secs_f64()
}

/// Exports metrics of MongoDB commands
///
/// - `<namespace>_mongo_commands`: histogram of command duration in seconds
/// - `<namespace>_mongo_command_errors`: counter of failed commands
#[derive(Debug, Clone)]
pub struct CommandMonitor {
    instance_name: String,
    commands: HistogramVec,
    errors: CounterVec,
}

impl CommandMonitor {
    /// Register (or reuse) the command metrics in `registry`
    pub fn new(registry: &MetricsRegistry, options: MonitorOptions) -> Result<Self> {
        let commands = registry
            .register(MetricDefinition::histogram(
                options.namespace.as_str(),
                "mongo_commands",
                "Histogram of MongoDB commands",
                &COMMAND_LABELS,
                options.duration_buckets,
            ))?
            .into_instrument()
            .into_histogram()?;

        let errors = registry
            .register(MetricDefinition::counter(
                options.namespace.as_str(),
                "mongo_command_errors",
                "Number of MongoDB commands that have failed",
                &COMMAND_LABELS,
            ))?
            .into_instrument()
            .into_counter()?;

        tracing::debug!(
            instance = %options.instance_name,
            metric = commands.name(),
            "Command monitor ready"
        );

        Ok(Self {
            instance_name: options.instance_name,
            commands,
            errors,
        })
    }

    /// Same as [`CommandMonitor::new`] on the process-wide registry
    pub fn with_global_registry(options: MonitorOptions) -> Result<Self> {
        Self::new(&MetricsRegistry::global(), options)
    }

    pub fn commands(&self) -> &HistogramVec {
        &self.commands
    }

    pub fn errors(&self) -> &CounterVec {
        &self.errors
    }

    fn observe_duration(&self, event: &CommandFinishedEvent) {
        self.commands.observe(
            &[self.instance_name.as_str(), event.command_name.as_str()],
            duration_seconds(event.duration),
        );
    }
}

impl CommandEventHandler for CommandMonitor {
    fn handle_succeeded(&self, event: &CommandSucceededEvent) {
        tracing::trace!(
            command = %event.finished.command_name,
            request_id = event.finished.request_id,
            "Command succeeded"
        );
        self.observe_duration(&event.finished);
    }

    fn handle_failed(&self, event: &CommandFailedEvent) {
        tracing::trace!(
            command = %event.finished.command_name,
            request_id = event.finished.request_id,
            failure = %event.failure,
            "Command failed"
        );
        self.observe_duration(&event.finished);
        self.errors.inc(&[
            self.instance_name.as_str(),
            event.finished.command_name.as_str(),
        ]);
    }
}
