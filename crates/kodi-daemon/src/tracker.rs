//! Now-playing change detection.
//!
//! Per cycle: fetch the item, derive title/artist, drop skip-listed titles,
//! compare with the last accepted title and, for a new song, resolve the
//! remaining fields and append a log record.
//!
//! Field priority:
//!   album     non-empty `showtitle` > `album`
//!   duration  `duration` > total time from `Player.GetProperties` > 0
//!   thumbnail `Files.PrepareDownload` URL > last successfully resolved URL

use kodi_proto::client::KodiClient;
use kodi_proto::protocol::Item;
use kodi_proto::songs::{LogRecord, PlaybackLog};
use tracing::{debug, info, warn};

/// Context of the fetched item, reported even when nothing was logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayingItem {
    pub media_path: String,
    pub item_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    /// `None` when the item could not be fetched.
    pub item: Option<PlayingItem>,
    pub accepted: Option<LogRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct NowPlayingTracker {
    skip_patterns: Vec<String>,
    previous_title: String,
    previous_thumbnail_url: String,
}

impl NowPlayingTracker {
    pub fn new(skip_patterns: Vec<String>) -> Self {
        Self {
            skip_patterns,
            ..Default::default()
        }
    }

    /// Title of the last accepted song.
    pub fn previous_title(&self) -> &str {
        &self.previous_title
    }

    pub fn previous_thumbnail_url(&self) -> &str {
        &self.previous_thumbnail_url
    }

    pub async fn poll(
        &mut self,
        client: &KodiClient,
        player_id: i64,
        log: &PlaybackLog,
    ) -> CycleOutcome {
        let item = match client.now_playing(player_id).await {
            Ok(item) => item,
            Err(e) => {
                debug!("[poll] GetItem failed: {}", e);
                return CycleOutcome::default();
            }
        };

        let mut outcome = CycleOutcome {
            item: Some(PlayingItem {
                media_path: item.mediapath.clone().unwrap_or_default(),
                item_type: item.item_type.clone().unwrap_or_default(),
            }),
            accepted: None,
        };

        if item.title().is_empty() {
            return outcome;
        }

        let (title, artist) = title_and_artist(&item);

        // A skipped title must leave previous_title alone so the next real
        // track is still compared against the last accepted one.
        if is_skipped(&title, &self.skip_patterns) {
            debug!("[poll] Skipping {:?}", title);
            return outcome;
        }

        if title.is_empty() || title == self.previous_title {
            return outcome;
        }

        let album = album_or_series(&item);
        let duration = self.duration(client, player_id, &item).await;
        let episode = episode_tag(item.season, item.episode);
        let (thumbnail_url, resolved) = self.thumbnail(client, &item).await;

        if title == artist {
            debug!("[poll] Ignoring {:?}: title equals artist", title);
            return outcome;
        }

        let record = LogRecord {
            title,
            artist,
            album,
            duration,
            thumbnail_url,
            episode,
        };

        if let Err(e) = log.append(&record).await {
            warn!("[log] Append failed, will retry next cycle: {}", e);
            return outcome;
        }

        info!("[poll] Now playing {:?} by {:?}", record.title, record.artist);
        self.previous_title = record.title.clone();
        if resolved {
            self.previous_thumbnail_url = record.thumbnail_url.clone();
        }
        outcome.accepted = Some(record);
        outcome
    }

    async fn duration(&self, client: &KodiClient, player_id: i64, item: &Item) -> u64 {
        if let Some(seconds) = item.duration {
            return seconds.max(0) as u64;
        }
        match client.media_times(player_id).await {
            Ok(times) => times.total,
            Err(e) => {
                debug!("[poll] No duration available: {}", e);
                0
            }
        }
    }

    /// Returns the URL to log and whether it was resolved during this cycle.
    async fn thumbnail(&self, client: &KodiClient, item: &Item) -> (String, bool) {
        let Some(thumb) = item.thumbnail.as_deref().filter(|t| !t.is_empty()) else {
            return (String::new(), false);
        };
        match client.resolve_thumbnail(thumb).await {
            Ok(url) => (url, true),
            Err(e) => {
                debug!("[poll] Thumbnail resolution failed, reusing previous: {}", e);
                (self.previous_thumbnail_url.clone(), false)
            }
        }
    }
}

/// Artist list joined and unquoted; radio streams without an artist carry
/// `"Artist - Title"` in the title instead.
pub fn title_and_artist(item: &Item) -> (String, String) {
    let title = item.title().to_string();
    let artist = item.artist.join(" ").replace('"', "");
    if !artist.is_empty() {
        return (title, artist);
    }
    match split_radio_title(&title) {
        Some((artist, title)) => (title, artist),
        None => (title, artist),
    }
}

/// Split on `" - "` only when that yields exactly two parts.
pub fn split_radio_title(title: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = title.split(" - ").collect();
    match parts.as_slice() {
        [artist, title] => Some((artist.to_string(), title.to_string())),
        _ => None,
    }
}

pub fn is_skipped(title: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| title.contains(p.as_str()))
}

pub fn album_or_series(item: &Item) -> String {
    item.showtitle
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(item.album.as_deref())
        .unwrap_or("")
        .replace('"', "")
}

pub fn episode_tag(season: Option<i64>, episode: Option<i64>) -> String {
    match (season, episode) {
        (Some(s), Some(e)) if s >= 0 && e >= 0 => format!("S{:02}E{:02}", s, e),
        _ => String::new(),
    }
}
