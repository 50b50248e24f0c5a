// Shared/exclusive gate guarding the database file
//
// Readers hold a shared guard for the whole read, writers hold an
// exclusive guard across read, merge and write-back. Guards release on
// drop, so every exit path releases.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

#[derive(Debug, Default)]
pub struct Gate {
    lock: RwLock<()>,
}

/// Held by a reader; any number may coexist
pub struct SharedGuard<'a> {
    _guard: RwLockReadGuard<'a, ()>,
}

/// Held by a writer; excludes every other holder
pub struct ExclusiveGuard<'a> {
    _guard: RwLockWriteGuard<'a, ()>,
}

impl Gate {
    pub fn new() -> Self {
        Gate::default()
    }

    pub fn shared(&self) -> SharedGuard<'_> {
        let guard = self.lock.read();
        trace!("shared gate acquired");
        SharedGuard { _guard: guard }
    }

    pub fn exclusive(&self) -> ExclusiveGuard<'_> {
        let guard = self.lock.write();
        trace!("exclusive gate acquired");
        ExclusiveGuard { _guard: guard }
    }

    pub fn try_shared(&self) -> Option<SharedGuard<'_>> {
        self.lock.try_read().map(|guard| SharedGuard { _guard: guard })
    }

    pub fn try_exclusive(&self) -> Option<ExclusiveGuard<'_>> {
        self.lock.try_write().map(|guard| ExclusiveGuard { _guard: guard })
    }
}
