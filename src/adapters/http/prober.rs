use std::error::Error as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode};
use tracing::{debug, info, warn};

use crate::domain::Outcome;
use crate::ports::Prober;

/// Prober issuing `GET http://<host>/` with a hard per-request deadline
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(redirect::Policy::limited(10))
            .user_agent(concat!("hostwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

/// Flatten a reqwest error and its sources into one line
fn describe(err: &reqwest::Error) -> String {
    let mut text = if err.is_timeout() {
        "timeout".to_string()
    } else {
        err.to_string()
    };
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, hostname: &str) -> Outcome {
        let url = format!("http://{}/", hostname);
        let start = Instant::now();
        let result = self.client.get(&url).send().await;
        let latency = start.elapsed();

        match result {
            Ok(resp) if resp.status() == StatusCode::OK => {
                info!(host = %hostname, ?latency, "probe OK");
                Outcome::success(latency)
            }
            Ok(resp) => {
                warn!(host = %hostname, status = %resp.status(), ?latency, "probe ERROR");
                Outcome::failure(resp.status().to_string(), latency)
            }
            Err(e) => {
                let reason = describe(&e);
                warn!(host = %hostname, error = %reason, ?latency, "probe FAIL");
                debug!(host = %hostname, error = ?e, "probe transport error");
                Outcome::failure(reason, latency)
            }
        }
    }
}
