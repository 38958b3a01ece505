//! ABOUTME: Count of connections currently checked out of a pool
//! ABOUTME: Serialized by a mutex because pool events arrive from many driver threads

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Connections currently in use
///
/// No floor is enforced: a release without a matching acquire drives the count
/// negative, which is logged and left visible on the usage gauge.
#[derive(Debug, Default)]
pub struct PoolUsageTracker {
    used: Mutex<i64>,
}

impl PoolUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection was checked out
    pub fn acquire(&self) {
        *self.lock() += 1;
    }

    /// A connection was checked back in
    pub fn release(&self) {
        let mut used = self.lock();
        *used -= 1;
        if *used < 0 {
            tracing::warn!(used = *used, "Connection returned without a matching checkout");
        }
    }

    /// Nothing is checked out any more (pool created or cleared)
    pub fn clear(&self) {
        *self.lock() = 0;
    }

    pub fn value(&self) -> i64 {
        *self.lock()
    }

    /// Run `f` with the current count while no other update can interleave
    pub fn with_value<R>(&self, f: impl FnOnce(i64) -> R) -> R {
        let used = self.lock();
        f(*used)
    }

    // The guarded integer is always valid, so poisoning carries no meaning here
    fn lock(&self) -> MutexGuard<'_, i64> {
        self.used.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
