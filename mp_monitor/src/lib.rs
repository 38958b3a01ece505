//! ABOUTME: MongoDB driver event monitors that translate events into Prometheus metrics
//! ABOUTME: Command latency/error tracking and connection pool usage tracking
//!
//! # Host setup
//!
//! Initialise tracing once, build both monitors on the shared registry and hand
//! them to the driver's event hooks. Building them again (one per client) reuses
//! the registered instruments.
//!
//! ```
//! use mp_monitor::{
//!     init_tracing, CommandEventHandler, CommandMonitor, CommandSucceededEvent,
//!     MetricsRegistry, MonitorOptions, PoolEvent, PoolEventHandler, PoolEventKind,
//!     PoolMonitor, PoolMonitorOptions,
//! };
//! use std::{sync::Arc, time::Duration};
//!
//! # fn main() -> mp_monitor::Result<()> {
//! init_tracing("development", "orders-service");
//!
//! let options = MonitorOptions::default()
//!     .with_instance_name("orders")
//!     .with_namespace("shop");
//! let commands = Arc::new(CommandMonitor::with_global_registry(options.clone())?);
//! let pool = Arc::new(PoolMonitor::with_global_registry(PoolMonitorOptions::from(
//!     &options,
//! ))?);
//!
//! // What the driver does on its own threads
//! commands.handle_succeeded(&CommandSucceededEvent::new("find", Duration::from_millis(4)));
//! pool.handle_pool_event(Some(&PoolEvent::new(PoolEventKind::GetSucceeded)));
//!
//! let exposition = MetricsRegistry::global().encode()?;
//! assert!(exposition.contains("shop_mongodb_connection_pool_usage{instance=\"orders\"} 1"));
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod event;
pub mod handler;
pub mod pool;
pub mod tracker;

pub use command::{duration_seconds, CommandMonitor};
pub use event::{
    CommandFailedEvent, CommandFinishedEvent, CommandSucceededEvent, PoolEvent, PoolEventKind,
    PoolSizeOptions,
};
pub use handler::{CommandEventHandler, PoolEventHandler};
pub use mp_config::{MonitorOptions, PoolMonitorOptions};
pub use mp_core::{init_tracing, Error, Result};
pub use mp_obs::MetricsRegistry;
pub use pool::PoolMonitor;
pub use tracker::PoolUsageTracker;
