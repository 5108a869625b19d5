//! Reachability check for the Kodi web server, separate from JSON-RPC.
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use crate::client::RpcError;
use crate::config::KodiConfig;

/// Upper bound for one probe. The probe runs every cycle, so it must stay short.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct Prober {
    http: reqwest::Client,
    host: String,
    port: u16,
}

impl Prober {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .connect_timeout(PROBE_TIMEOUT)
            .timeout(PROBE_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            host: host.into(),
            port,
        })
    }

    pub fn from_config(config: &KodiConfig) -> Result<Self, RpcError> {
        Self::new(config.address.clone(), config.port)
    }

    /// `GET /` on the host; only a 200 counts as connected.
    pub async fn is_connected(&self) -> bool {
        if self.host.is_empty() {
            return false;
        }
        let url = format!("http://{}:{}/", self.host, self.port);
        match self.http.get(&url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!("[probe] {} unreachable: {}", url, e);
                false
            }
        }
    }
}
