//! ABOUTME: Hook traits the driver calls when commands finish or the pool changes
//! ABOUTME: Implementations must be callable from any driver thread

use crate::event::{CommandFailedEvent, CommandSucceededEvent, PoolEvent};
use std::sync::Arc;

/// Receives command completion events
pub trait CommandEventHandler: Send + Sync {
    fn handle_succeeded(&self, event: &CommandSucceededEvent);

    fn handle_failed(&self, event: &CommandFailedEvent);
}

/// Receives every connection pool event through one callback
pub trait PoolEventHandler: Send + Sync {
    /// `None` when the driver fires the hook without an event; must be a no-op
    fn handle_pool_event(&self, event: Option<&PoolEvent>);
}

impl<T: CommandEventHandler + ?Sized> CommandEventHandler for Arc<T> {
    fn handle_succeeded(&self, event: &CommandSucceededEvent) {
        (**self).handle_succeeded(event)
    }

    fn handle_failed(&self, event: &CommandFailedEvent) {
        (**self).handle_failed(event)
    }
}

impl<T: PoolEventHandler + ?Sized> PoolEventHandler for Arc<T> {
    fn handle_pool_event(&self, event: Option<&PoolEvent>) {
        (**self).handle_pool_event(event)
    }
}
