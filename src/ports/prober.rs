use async_trait::async_trait;

use crate::domain::Outcome;

/// Port for checking whether a host answers on its root path
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `hostname` once. Every failure mode is folded into the outcome.
    async fn probe(&self, hostname: &str) -> Outcome;
}
