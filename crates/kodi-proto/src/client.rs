//! HTTP client for Kodi's `/jsonrpc` endpoint.
//!
//! Every call returns `Result<_, RpcError>`; nothing here panics or retries.
//! Retrying is the poll loop's business: a failed call simply means the
//! current cycle produced no update.

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::KodiConfig;
use crate::protocol::{
    ActivePlayer, GetItemResult, Item, MediaTimes, Payload, PlayerProperties,
    PrepareDownloadResult, Request, Response, AUDIO_PLAYLIST,
};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("response has no result")]
    MissingResult,

    #[error("response is missing `{0}`")]
    MissingField(&'static str),
}

/// Cheaply cloneable JSON-RPC client bound to one host and port.
#[derive(Debug, Clone)]
pub struct KodiClient {
    http: reqwest::Client,
    host: String,
    port: u16,
}

impl KodiClient {
    /// `timeout` of `None` leaves requests uncapped apart from OS-level limits.
    pub fn new(host: impl Into<String>, port: u16, timeout: Option<Duration>) -> Result<Self, RpcError> {
        // The host is on the local network; system proxies only get in the way.
        let mut builder = reqwest::Client::builder().no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            host: host.into(),
            port,
        })
    }

    pub fn from_config(config: &KodiConfig) -> Result<Self, RpcError> {
        Self::new(config.address.clone(), config.port, config.rpc_timeout())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/jsonrpc", self.host, self.port)
    }

    /// Downloadable URL for a path handed out by `Files.PrepareDownload`.
    pub fn thumbnail_url(&self, path: &str) -> String {
        format!("http://{}:{}/{}", self.host, self.port, path)
    }

    /// Send a single request or a batch and return the parsed body as-is.
    pub async fn request(&self, payload: &Payload) -> Result<Value, RpcError> {
        debug!("[rpc] -> {}", payload.describe());
        let response = self
            .http
            .post(self.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let value: Value = serde_json::from_slice(&body)?;
        Ok(value)
    }

    /// Send one request and decode its `result`.
    pub async fn call<T: DeserializeOwned>(&self, request: Request) -> Result<T, RpcError> {
        let value = self.request(&Payload::Single(request)).await?;
        let response: Response<T> = serde_json::from_value(value)?;
        if let Some(err) = response.error {
            return Err(RpcError::Remote {
                code: err.code,
                message: err.message,
            });
        }
        response.result.ok_or(RpcError::MissingResult)
    }

    async fn command(&self, request: Request) -> Result<(), RpcError> {
        self.call::<Value>(request).await.map(|_| ())
    }

    /// Id of the first active player, or -1 when nothing plays or the call fails.
    /// Only the first player is considered.
    pub async fn active_player_id(&self) -> i64 {
        match self.call::<Vec<ActivePlayer>>(Request::get_active_players()).await {
            Ok(players) => players.first().map(|p| p.playerid).unwrap_or(-1),
            Err(e) => {
                debug!("[rpc] GetActivePlayers failed: {}", e);
                -1
            }
        }
    }

    pub async fn now_playing(&self, player_id: i64) -> Result<Item, RpcError> {
        self.call::<GetItemResult>(Request::get_item(player_id))
            .await
            .map(|r| r.item)
    }

    /// Resolve a `image://` style reference into a URL the host will serve.
    pub async fn resolve_thumbnail(&self, thumbnail: &str) -> Result<String, RpcError> {
        let result: PrepareDownloadResult = self.call(Request::prepare_download(thumbnail)).await?;
        Ok(self.thumbnail_url(&result.details.path))
    }

    pub async fn media_times(&self, player_id: i64) -> Result<MediaTimes, RpcError> {
        let props: PlayerProperties = self
            .call(Request::get_properties(player_id, &["percentage", "totaltime"]))
            .await?;
        let totaltime = props.totaltime.ok_or(RpcError::MissingField("totaltime"))?;
        let percentage = props.percentage.ok_or(RpcError::MissingField("percentage"))?;
        Ok(MediaTimes::from_progress(totaltime, percentage))
    }

    /// True when the player reports a positive speed. Failures read as "not playing".
    pub async fn is_playing(&self, player_id: i64) -> bool {
        if player_id < 0 {
            return false;
        }
        match self
            .call::<PlayerProperties>(Request::get_properties(player_id, &["speed"]))
            .await
        {
            Ok(props) => props.speed.unwrap_or(0) > 0,
            Err(e) => {
                debug!("[rpc] speed query failed: {}", e);
                false
            }
        }
    }

    pub async fn playlist_position(&self, player_id: i64) -> Result<i64, RpcError> {
        let props: PlayerProperties = self
            .call(Request::get_properties(player_id, &["position"]))
            .await?;
        props.position.ok_or(RpcError::MissingField("position"))
    }

    pub async fn play_pause(&self, player_id: i64) -> Result<(), RpcError> {
        self.command(Request::play_pause(player_id)).await
    }

    pub async fn stop(&self, player_id: i64) -> Result<(), RpcError> {
        self.command(Request::stop(player_id)).await
    }

    pub async fn open_position(&self, position: i64) -> Result<(), RpcError> {
        self.command(Request::open_position(AUDIO_PLAYLIST, position))
            .await
    }

    /// Queue `file` as the only playlist entry and start it.
    ///
    /// `Player.Open` with a plain `file` item is unreliable for plugin streams,
    /// so this goes through the playlist in one batch.
    pub async fn play_file(&self, file: &str) -> Result<(), RpcError> {
        let batch = Payload::Batch(vec![
            Request::playlist_clear(AUDIO_PLAYLIST),
            Request::playlist_add_file(AUDIO_PLAYLIST, file),
            Request::open_position(AUDIO_PLAYLIST, 0),
        ]);
        let value = self.request(&batch).await?;
        let responses: Vec<Response<Value>> = serde_json::from_value(value)?;
        if let Some(err) = responses.into_iter().find_map(|r| r.error) {
            return Err(RpcError::Remote {
                code: err.code,
                message: err.message,
            });
        }
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<(), RpcError> {
        self.command(Request::shutdown()).await
    }

    pub async fn reboot(&self) -> Result<(), RpcError> {
        self.command(Request::reboot()).await
    }
}
