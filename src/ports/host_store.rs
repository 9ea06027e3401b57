use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::HostSet;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(serde_json::Error),

    #[error("Encode error: {0}")]
    Encode(serde_json::Error),
}

/// Port for persisting the monitored host set
#[async_trait]
pub trait HostStore: Send + Sync {
    /// Modification time of the backing data, `None` if it does not exist yet
    async fn modified(&self) -> Result<Option<SystemTime>, StoreError>;

    async fn load(&self) -> Result<HostSet, StoreError>;

    /// Replace the stored set in full
    async fn save(&self, hosts: &HostSet) -> Result<(), StoreError>;
}
