use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use parking_lot::RwLock;

#[cfg(test)]
use crate::domain::HostRecord;
use crate::domain::HostSet;
use crate::ports::{HostStore, StoreError};

/// In-memory host store with a logical modification clock.
///
/// Every write (ours or a simulated external edit) moves the clock forward by
/// one second, so reload gating can be exercised without touching the disk.
pub struct MemoryStore {
    hosts: RwLock<Option<HostSet>>,
    clock: AtomicU64,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// A store with no backing data (as if the file did not exist)
    pub fn new() -> Self {
        Self {
            hosts: RwLock::new(None),
            clock: AtomicU64::new(0),
            fail_saves: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub fn with_hosts(records: impl IntoIterator<Item = HostRecord>) -> Self {
        let store = Self::new();
        store.replace(records);
        store
    }

    /// Overwrite the contents and advance the clock, like an external edit
    #[cfg(test)]
    pub fn replace(&self, records: impl IntoIterator<Item = HostRecord>) {
        let set: HostSet = records
            .into_iter()
            .map(|r| (r.hostname.clone(), r))
            .collect();
        *self.hosts.write() = Some(set);
        self.clock.fetch_add(1, Ordering::SeqCst);
    }

    /// Make subsequent saves fail with an IO error
    #[cfg(test)]
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn contents(&self) -> Option<HostSet> {
        self.hosts.read().clone()
    }

    fn mtime(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.clock.load(Ordering::SeqCst))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostStore for MemoryStore {
    async fn modified(&self) -> Result<Option<SystemTime>, StoreError> {
        Ok(self.hosts.read().as_ref().map(|_| self.mtime()))
    }

    async fn load(&self) -> Result<HostSet, StoreError> {
        self.hosts.read().clone().ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no host set stored",
            ))
        })
    }

    async fn save(&self, hosts: &HostSet) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only store",
            )));
        }
        *self.hosts.write() = Some(hosts.clone());
        self.clock.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
