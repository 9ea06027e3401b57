use async_trait::async_trait;
use tracing::warn;

use crate::ports::{Notifier, NotifyError};

/// Fallback notifier that only writes the alert to the log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        warn!(%recipient, %subject, body = %body.trim_end(), "notification (no transport configured)");
        Ok(())
    }
}
