use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::Notification;
use crate::ports::{Notifier, Prober};

use super::registry::{Registry, ReloadOutcome};

/// Summary of one completed round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundReport {
    pub probed: usize,
    pub healthy: usize,
    pub failing: usize,
    pub notifications: usize,
}

/// Periodic driver: probes every registered host once per round
pub struct Poller {
    registry: Arc<Registry>,
    prober: Arc<dyn Prober>,
    notifier: Arc<dyn Notifier>,
    period: Duration,
}

impl Poller {
    pub fn new(
        registry: Arc<Registry>,
        prober: Arc<dyn Prober>,
        notifier: Arc<dyn Notifier>,
        period: Duration,
    ) -> Self {
        Self {
            registry,
            prober,
            notifier,
            period,
        }
    }

    /// Run one full round and wait for every probe to finish.
    ///
    /// Individual probe, notification and persistence failures are logged and
    /// never abort the round.
    pub async fn run_round(&self) -> RoundReport {
        match self.registry.reload().await {
            Ok(ReloadOutcome::Reloaded { hosts }) => debug!(hosts, "registry reloaded before round"),
            Ok(ReloadOutcome::Skipped) => {}
            Err(e) => warn!(error = %e, "host file reload failed, keeping current hosts"),
        }

        let hosts = self.registry.hosts().await;
        let mut report = RoundReport {
            probed: hosts.len(),
            ..RoundReport::default()
        };

        let tasks = hosts.into_values().map(|host| {
            let prober = self.prober.clone();
            let notifier = self.notifier.clone();
            tokio::spawn(async move {
                let outcome = prober.probe(host.hostname()).await;
                let notification = host.observe(&outcome, Utc::now());
                let notified = match notification {
                    Some(notification) => {
                        deliver(notifier.as_ref(), &notification).await;
                        true
                    }
                    None => false,
                };
                (outcome.is_success(), notified)
            })
        });

        for result in join_all(tasks).await {
            match result {
                Ok((healthy, notified)) => {
                    if healthy {
                        report.healthy += 1;
                    } else {
                        report.failing += 1;
                    }
                    if notified {
                        report.notifications += 1;
                    }
                }
                Err(e) => error!(error = %e, "probe task did not complete"),
            }
        }

        if let Err(e) = self.registry.save().await {
            warn!(error = %e, "failed to save host file after round");
        }

        info!(
            probed = report.probed,
            healthy = report.healthy,
            failing = report.failing,
            notifications = report.notifications,
            "poll round complete"
        );
        report
    }

    /// Drive rounds every `period` until `shutdown` flips.
    ///
    /// Each round is awaited before the next tick is taken, so rounds never
    /// overlap; ticks missed while a round is running are skipped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(period = ?self.period, "poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_round().await;
                }
                _ = shutdown.changed() => {
                    info!("poller shutting down");
                    break;
                }
            }
        }
    }
}

async fn deliver(notifier: &dyn Notifier, notification: &Notification) {
    match notifier
        .notify(&notification.recipient, &notification.subject, &notification.body)
        .await
    {
        Ok(()) => info!(
            host = %notification.hostname,
            kind = ?notification.kind,
            "notification sent"
        ),
        Err(e) => error!(
            host = %notification.hostname,
            kind = ?notification.kind,
            error = %e,
            "failed to send notification"
        ),
    }
}
