use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::domain::HostSet;
use crate::ports::{HostStore, StoreError};

/// Host set stored as a JSON object keyed by hostname
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "hosts.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl HostStore for JsonFileStore {
    async fn modified(&self) -> Result<Option<SystemTime>, StoreError> {
        match fs::metadata(&self.path).await {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self) -> Result<HostSet, StoreError> {
        let content = fs::read(&self.path).await?;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(HostSet::new());
        }
        serde_json::from_slice(&content).map_err(StoreError::Decode)
    }

    async fn save(&self, hosts: &HostSet) -> Result<(), StoreError> {
        let mut content = serde_json::to_vec_pretty(hosts).map_err(StoreError::Encode)?;
        content.push(b'\n');

        // Write aside and rename so readers never see a partial file
        let temp = self.temp_path();
        fs::write(&temp, &content).await?;
        if let Err(e) = fs::rename(&temp, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                warn!(path = %temp.display(), error = %cleanup, "could not remove temp host file");
            }
            return Err(e.into());
        }

        debug!(path = %self.path.display(), hosts = hosts.len(), "host set saved");
        Ok(())
    }
}
