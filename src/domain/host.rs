use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{HistoryBuffer, Notification, NotificationPolicy, Outcome, PolicyState, Sample};

/// Persisted identity of a monitored host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    #[serde(alias = "Host")]
    pub hostname: String,
    /// Where down/recovered notifications are sent
    #[serde(alias = "Email")]
    pub notify: String,
}

impl HostRecord {
    pub fn new(hostname: impl Into<String>, notify: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            notify: notify.into(),
        }
    }
}

/// On-disk host set, keyed by hostname
pub type HostSet = BTreeMap<String, HostRecord>;

/// Sizing shared by every host in a registry
#[derive(Debug, Clone, Copy)]
pub struct HostSettings {
    pub history_size: usize,
    pub failure_threshold: u32,
}

/// Mutable per-host state, guarded by the host lock
#[derive(Debug)]
struct Tracking {
    history: HistoryBuffer,
    policy: NotificationPolicy,
}

/// Runtime view of a monitored host. Never serialized; see `HostRecord`.
#[derive(Debug)]
pub struct MonitoredHost {
    hostname: String,
    notify: String,
    tracking: Mutex<Tracking>,
}

impl MonitoredHost {
    pub fn new(record: HostRecord, settings: HostSettings) -> Self {
        Self {
            hostname: record.hostname,
            notify: record.notify,
            tracking: Mutex::new(Tracking {
                history: HistoryBuffer::new(settings.history_size),
                policy: NotificationPolicy::new(settings.failure_threshold),
            }),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn notify(&self) -> &str {
        &self.notify
    }

    pub fn record(&self) -> HostRecord {
        HostRecord::new(self.hostname.clone(), self.notify.clone())
    }

    /// Store one probe outcome and run it through the notification policy
    pub fn observe(&self, outcome: &Outcome, at: DateTime<Utc>) -> Option<Notification> {
        let mut tracking = self.tracking.lock();
        tracking.history.record(outcome, at);
        tracking.policy.observe(outcome, &self.hostname, &self.notify)
    }

    /// Status line and policy state, read under one lock acquisition
    pub fn view(&self) -> HostView {
        let tracking = self.tracking.lock();
        HostView {
            status: tracking.history.status(),
            policy: tracking.policy.state().clone(),
        }
    }

    /// Status and chronological samples, read under one lock acquisition.
    /// `samples` is the series dashboards chart.
    pub fn history(&self) -> HistoryView {
        let tracking = self.tracking.lock();
        HistoryView {
            status: tracking.history.status(),
            capacity: tracking.history.capacity(),
            samples: tracking.history.samples(),
        }
    }
}

/// Point-in-time summary of one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostView {
    pub status: String,
    pub policy: PolicyState,
}

/// Point-in-time history of one host, oldest sample first
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub status: String,
    pub capacity: usize,
    pub samples: Vec<Sample>,
}
