use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::application::{Registry, RegistryError};
use crate::domain::{MonitoredHost, Sample};

/// Error type that implements IntoResponse
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Registry(RegistryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Registry(err) => {
                let status = match &err {
                    RegistryError::AlreadyMonitored(_) => StatusCode::CONFLICT,
                    RegistryError::CapacityExceeded { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    RegistryError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        AppError::Registry(err)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

/// One row of /api/hosts
#[derive(Debug, Serialize)]
pub struct HostSummary {
    pub hostname: String,
    pub status: String,
    pub consecutive_failures: u32,
    pub down: bool,
}

impl From<&MonitoredHost> for HostSummary {
    fn from(host: &MonitoredHost) -> Self {
        let view = host.view();
        Self {
            hostname: host.hostname().to_string(),
            status: view.status,
            consecutive_failures: view.policy.consecutive_failures(),
            down: view.policy.is_down(),
        }
    }
}

/// Response for /api/hosts
#[derive(Debug, Serialize)]
pub struct HostsResponse {
    pub timestamp: String,
    pub hosts: Vec<HostSummary>,
}

#[derive(Debug, Serialize)]
pub struct SampleView {
    pub collected_at: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Sample> for SampleView {
    fn from(sample: &Sample) -> Self {
        Self {
            collected_at: sample.collected_at.to_rfc3339(),
            latency_ms: u64::try_from(sample.latency.as_millis()).unwrap_or(u64::MAX),
            error: sample.error().map(str::to_string),
        }
    }
}

/// Response for /api/hosts/{hostname}/history
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub hostname: String,
    pub status: String,
    pub capacity: usize,
    pub samples: Vec<SampleView>,
}

/// Body for POST /api/hosts
#[derive(Debug, Deserialize)]
pub struct AddHostRequest {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub notify: String,
}

/// Accept only a bare `host[:port]`, so a probe can never be pointed at
/// something like `example.com/huge.iso`. Returns the normalized form.
pub fn normalize_hostname(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    let invalid = || AppError::BadRequest("hostname not specified or invalid".to_string());
    if raw.is_empty() {
        return Err(invalid());
    }

    let url = Url::parse(&format!("http://{}/", raw)).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?;
    if url.path() != "/"
        || url.query().is_some()
        || url.fragment().is_some()
        || !url.username().is_empty()
        || url.password().is_some()
    {
        return Err(invalid());
    }

    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Handler for GET /api/health
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "hostwatch",
            "hosts": state.registry.len().await,
            "max_hosts": state.registry.max_hosts(),
        })),
    )
}

/// Handler for GET /api/hosts
pub async fn hosts_handler(State(state): State<AppState>) -> Json<HostsResponse> {
    let mut hosts: Vec<HostSummary> = state
        .registry
        .hosts()
        .await
        .values()
        .map(|h| HostSummary::from(h.as_ref()))
        .collect();
    hosts.sort_by(|a, b| a.hostname.cmp(&b.hostname));

    Json(HostsResponse {
        timestamp: chrono::Utc::now().to_rfc3339(),
        hosts,
    })
}

/// Handler for GET /api/hosts/{hostname}/history
pub async fn history_handler(
    State(state): State<AppState>,
    Path(hostname): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let host = state
        .registry
        .get(&hostname)
        .await
        .ok_or_else(|| AppError::NotFound(format!("host not monitored: {}", hostname)))?;

    let history = host.history();
    Ok(Json(HistoryResponse {
        hostname: host.hostname().to_string(),
        status: history.status,
        capacity: history.capacity,
        samples: history.samples.iter().map(SampleView::from).collect(),
    }))
}

/// Handler for POST /api/hosts
pub async fn add_host_handler(
    State(state): State<AppState>,
    Json(req): Json<AddHostRequest>,
) -> Result<(StatusCode, Json<HostSummary>), AppError> {
    let hostname = normalize_hostname(&req.hostname)?;
    let notify = req.notify.trim();
    if notify.is_empty() {
        return Err(AppError::BadRequest("notify not specified or invalid".to_string()));
    }

    match state.registry.add_host(hostname.as_str(), notify).await {
        Ok(host) => {
            info!(host = %host.hostname(), "added host via API");
            Ok((StatusCode::CREATED, Json(HostSummary::from(host.as_ref()))))
        }
        Err(e @ RegistryError::Persistence(_)) => {
            warn!(host = %hostname, error = %e, "host added but host file not saved");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::domain::{HostRecord, HostSettings, Outcome};

    #[test]
    fn test_summary_of_down_host() {
        let host = MonitoredHost::new(
            HostRecord::new("a.example", "ops@a.example"),
            HostSettings {
                history_size: 4,
                failure_threshold: 1,
            },
        );
        host.observe(&Outcome::failure("timeout", Duration::ZERO), Utc::now());

        let summary = HostSummary::from(&host);
        assert_eq!(summary.status, "Error: timeout");
        assert_eq!(summary.consecutive_failures, 1);
        assert!(summary.down);
    }

    #[test]
    fn test_normalize_accepts_bare_hosts() {
        assert_eq!(normalize_hostname("example.com").unwrap(), "example.com");
        assert_eq!(normalize_hostname(" Example.COM ").unwrap(), "example.com");
        assert_eq!(normalize_hostname("example.com:8080").unwrap(), "example.com:8080");
        assert_eq!(normalize_hostname("127.0.0.1:80").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_normalize_rejects_paths_and_junk() {
        for bad in [
            "",
            "   ",
            "example.com/huge.iso",
            "example.com?x=1",
            "example.com#top",
            "user@example.com",
            "exa mple.com",
        ] {
            assert!(normalize_hostname(bad).is_err(), "accepted {:?}", bad);
        }
    }
}
