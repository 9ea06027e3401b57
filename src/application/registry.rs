use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{HostRecord, HostSet, HostSettings, MonitoredHost};
use crate::ports::{HostStore, StoreError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Host already being monitored: {0}")]
    AlreadyMonitored(String),

    #[error("Maximum number of monitored hosts reached: {current}/{max}")]
    CapacityExceeded { current: usize, max: usize },

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

/// Result of a reload attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Backing data unchanged (or missing); nothing was read
    Skipped,
    /// The host set was replaced; `hosts` is the new size
    Reloaded { hosts: usize },
}

struct Inner {
    hosts: HashMap<String, Arc<MonitoredHost>>,
    /// Modification time of the last load or save we performed
    last_synced: Option<SystemTime>,
}

/// Owner of the monitored host set.
///
/// The registry lock covers the map and every load/save, so a save never
/// encodes a map that is being restructured. Per-host history and policy live
/// behind each host's own lock and are mutated without holding this one.
pub struct Registry {
    store: Arc<dyn HostStore>,
    settings: HostSettings,
    max_hosts: usize,
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new(store: Arc<dyn HostStore>, settings: HostSettings, max_hosts: usize) -> Self {
        Self {
            store,
            settings,
            max_hosts,
            inner: Mutex::new(Inner {
                hosts: HashMap::new(),
                last_synced: None,
            }),
        }
    }

    pub fn max_hosts(&self) -> usize {
        self.max_hosts
    }

    /// Initial load at startup. A missing store starts empty; anything else
    /// that prevents reading it is returned to the caller.
    pub async fn bootstrap(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().await;

        let Some(mtime) = self.store.modified().await? else {
            info!("no host file yet, starting with an empty registry");
            return Ok(0);
        };

        let set = self.store.load().await?;
        self.install(&mut inner, set, mtime);
        Ok(inner.hosts.len())
    }

    /// Re-read the store if it changed since we last loaded or saved it.
    ///
    /// On failure the current host set is left untouched.
    pub async fn reload(&self) -> Result<ReloadOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        let outcome = self.refresh_locked(&mut inner).await?;
        if let ReloadOutcome::Reloaded { hosts } = outcome {
            info!(hosts, "host file changed, reloaded");
        }
        Ok(outcome)
    }

    /// Install the store contents if its mtime moved past `last_synced`
    async fn refresh_locked(&self, inner: &mut Inner) -> Result<ReloadOutcome, StoreError> {
        let Some(mtime) = self.store.modified().await? else {
            return Ok(ReloadOutcome::Skipped);
        };
        if inner.last_synced.is_some_and(|last| mtime <= last) {
            return Ok(ReloadOutcome::Skipped);
        }

        let set = self.store.load().await?;
        self.install(inner, set, mtime);
        Ok(ReloadOutcome::Reloaded {
            hosts: inner.hosts.len(),
        })
    }

    /// Replace the map with `set`, keeping runtime state for unchanged hosts
    fn install(&self, inner: &mut Inner, set: HostSet, mtime: SystemTime) {
        let mut previous = std::mem::take(&mut inner.hosts);

        for (key, record) in set {
            if key != record.hostname {
                warn!(%key, hostname = %record.hostname, "host entry key does not match its hostname, using hostname");
            }
            let host = match previous.remove(&record.hostname) {
                Some(existing) if existing.notify() == record.notify => existing,
                _ => Arc::new(MonitoredHost::new(record, self.settings)),
            };
            inner.hosts.insert(host.hostname().to_string(), host);
        }

        for dropped in previous.keys() {
            debug!(host = %dropped, "host no longer in host file, dropped");
        }

        if inner.hosts.len() > self.max_hosts {
            warn!(
                hosts = inner.hosts.len(),
                max_hosts = self.max_hosts,
                "host file contains more hosts than max_hosts; keeping all of them, new additions are refused"
            );
        }

        inner.last_synced = Some(mtime);
    }

    /// Start monitoring a new host and persist the set.
    ///
    /// External edits to the store are picked up first, so the checks and the
    /// write both see them. A failed save is reported as `Persistence`, but the
    /// host stays registered in memory.
    pub async fn add_host(
        &self,
        hostname: impl Into<String>,
        notify: impl Into<String>,
    ) -> Result<Arc<MonitoredHost>, RegistryError> {
        let record = HostRecord::new(hostname, notify);
        let mut inner = self.inner.lock().await;

        if let ReloadOutcome::Reloaded { hosts } = self.refresh_locked(&mut inner).await? {
            info!(hosts, "host file changed, reloaded before adding host");
        }

        if inner.hosts.contains_key(&record.hostname) {
            return Err(RegistryError::AlreadyMonitored(record.hostname));
        }
        if inner.hosts.len() + 1 > self.max_hosts {
            return Err(RegistryError::CapacityExceeded {
                current: inner.hosts.len(),
                max: self.max_hosts,
            });
        }

        let host = Arc::new(MonitoredHost::new(record, self.settings));
        inner.hosts.insert(host.hostname().to_string(), host.clone());
        info!(host = %host.hostname(), total = inner.hosts.len(), "host added");

        self.write_locked(&mut inner).await?;
        Ok(host)
    }

    /// Persist the current host set.
    ///
    /// If the store changed since we last synced with it, its contents are
    /// installed first so the write never discards an external edit. A store
    /// that changed but cannot be read is left as is.
    pub async fn save(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if let ReloadOutcome::Reloaded { hosts } = self.refresh_locked(&mut inner).await? {
            info!(hosts, "host file changed since last sync, reloaded before saving");
        }
        self.write_locked(&mut inner).await
    }

    async fn write_locked(&self, inner: &mut Inner) -> Result<(), StoreError> {
        let set: HostSet = inner
            .hosts
            .values()
            .map(|h| (h.hostname().to_string(), h.record()))
            .collect();
        self.store.save(&set).await?;

        // Remember our own write so the next tick does not reload it
        match self.store.modified().await {
            Ok(mtime) => inner.last_synced = mtime.or(inner.last_synced),
            Err(e) => warn!(error = %e, "could not stat host file after save"),
        }
        Ok(())
    }

    /// Read-only snapshot of the host map
    pub async fn hosts(&self) -> HashMap<String, Arc<MonitoredHost>> {
        self.inner.lock().await.hosts.clone()
    }

    pub async fn get(&self, hostname: &str) -> Option<Arc<MonitoredHost>> {
        self.inner.lock().await.hosts.get(hostname).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.hosts.len()
    }
}
