//! JSON-RPC 2.0 wire types for the subset of the Kodi API we speak.
//!
//! Response structs are deliberately lenient: every field Kodi may omit is an
//! `Option`, and `artist` accepts either a list or a bare string. Fallback
//! order between fields is decided by the caller, not here.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// The music playlist. Kodi numbers its playlists 0 (audio), 1 (video), 2 (pictures).
pub const AUDIO_PLAYLIST: i64 = 0;

/// Properties requested from `Player.GetItem`.
pub const ITEM_PROPERTIES: &[&str] = &[
    "title",
    "album",
    "artist",
    "duration",
    "thumbnail",
    "showtitle",
    "mediapath",
    "season",
    "episode",
];

// ── requests ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: Value,
}

impl Request {
    pub fn new(method: &str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.to_string(),
            params: None,
            id: json!(1),
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = id.into();
        self
    }

    pub fn get_active_players() -> Self {
        Self::new("Player.GetActivePlayers")
    }

    pub fn get_item(player_id: i64) -> Self {
        Self::new("Player.GetItem").with_params(json!({
            "properties": ITEM_PROPERTIES,
            "playerid": player_id,
        }))
    }

    pub fn prepare_download(path: &str) -> Self {
        Self::new("Files.PrepareDownload")
            .with_params(json!({ "path": path }))
            .with_id("preparedl")
    }

    pub fn get_properties(player_id: i64, properties: &[&str]) -> Self {
        Self::new("Player.GetProperties").with_params(json!({
            "playerid": player_id,
            "properties": properties,
        }))
    }

    pub fn play_pause(player_id: i64) -> Self {
        Self::new("Player.PlayPause").with_params(json!({ "playerid": player_id }))
    }

    pub fn stop(player_id: i64) -> Self {
        Self::new("Player.Stop").with_params(json!({ "playerid": player_id }))
    }

    pub fn open_position(playlist_id: i64, position: i64) -> Self {
        Self::new("Player.Open").with_params(json!({
            "item": { "playlistid": playlist_id, "position": position },
        }))
    }

    pub fn playlist_clear(playlist_id: i64) -> Self {
        Self::new("Playlist.Clear").with_params(json!({ "playlistid": playlist_id }))
    }

    pub fn playlist_add_file(playlist_id: i64, file: &str) -> Self {
        Self::new("Playlist.Add").with_params(json!({
            "playlistid": playlist_id,
            "item": { "file": file },
        }))
    }

    pub fn shutdown() -> Self {
        Self::new("System.Shutdown")
    }

    pub fn reboot() -> Self {
        Self::new("System.Reboot")
    }
}

/// A request body: one object, or an array sent as a JSON-RPC batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Single(Request),
    Batch(Vec<Request>),
}

impl From<Request> for Payload {
    fn from(request: Request) -> Self {
        Payload::Single(request)
    }
}

impl From<Vec<Request>> for Payload {
    fn from(requests: Vec<Request>) -> Self {
        Payload::Batch(requests)
    }
}

impl Payload {
    pub fn describe(&self) -> String {
        match self {
            Payload::Single(r) => r.method.clone(),
            Payload::Batch(rs) => rs
                .iter()
                .map(|r| r.method.as_str())
                .collect::<Vec<_>>()
                .join("+"),
        }
    }
}

// ── responses ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Response<T> {
    pub result: Option<T>,
    pub error: Option<RemoteError>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivePlayer {
    pub playerid: i64,
    #[serde(rename = "type")]
    pub player_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetItemResult {
    pub item: Item,
}

/// Now-playing item as returned by `Player.GetItem`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Item {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub artist: Vec<String>,
    pub album: Option<String>,
    pub showtitle: Option<String>,
    pub duration: Option<i64>,
    pub thumbnail: Option<String>,
    pub mediapath: Option<String>,
    pub season: Option<i64>,
    pub episode: Option<i64>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

impl Item {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) if s.is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrepareDownloadResult {
    pub details: DownloadDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadDetails {
    pub path: String,
}

/// Subset of `Player.GetProperties`; which fields are present depends on
/// the properties requested.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerProperties {
    pub percentage: Option<f64>,
    pub totaltime: Option<GlobalTime>,
    pub speed: Option<i64>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct GlobalTime {
    #[serde(default)]
    pub hours: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
    #[serde(default)]
    pub milliseconds: u64,
}

impl GlobalTime {
    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

/// Total, played and remaining time of the current item, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaTimes {
    pub total: u64,
    pub played: f64,
    pub left: f64,
}

impl MediaTimes {
    pub fn from_progress(totaltime: GlobalTime, percentage: f64) -> Self {
        let total = totaltime.total_seconds();
        let played = total as f64 * (percentage / 100.0);
        Self {
            total,
            played,
            left: total as f64 - played,
        }
    }
}
