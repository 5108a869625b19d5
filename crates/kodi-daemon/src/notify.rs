//! Song and connection notifications.
//!
//! Builds notification content from playback-log records and hands it to the
//! desktop (here: the log and stdout). The thumbnail is downloaded to a fixed
//! path and only refreshed when it actually changed.

use std::path::PathBuf;
use std::time::Duration;

use kodi_proto::client::KodiClient;
use kodi_proto::config::Config;
use kodi_proto::songs::{LogRecord, PlaybackLog};
use kodi_proto::state::PlayerSnapshot;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::PollEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub summary: String,
    /// One `Label: value` per line.
    pub body: String,
    pub icon: Option<PathBuf>,
}

/// `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn format_duration(seconds: u64) -> String {
    format_time(seconds, seconds >= 3600)
}

fn format_time(seconds: u64, with_hours: bool) -> String {
    if with_hours {
        format!(
            "{:02}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        )
    } else {
        format!("{:02}:{:02}", (seconds / 60) % 60, seconds % 60)
    }
}

/// `time_left` is only shown for the current song, and only for non-music items.
pub fn song_notification(record: &LogRecord, time_left: Option<f64>, icon: Option<PathBuf>) -> Notification {
    let mut lines = Vec::new();
    if !record.artist.is_empty() {
        lines.push(format!("Artist: {}", record.artist));
    }
    if !record.album.is_empty() {
        let label = if record.is_episode() { "Series" } else { "Album" };
        lines.push(format!("{}: {}", label, record.album));
    }
    if record.is_episode() {
        lines.push(format!("Episode: {}", record.episode));
    }
    if record.duration > 0 {
        let with_hours = record.duration >= 3600;
        let mut duration = format_time(record.duration, with_hours);
        if let Some(left) = time_left {
            duration.push_str(&format!(
                " (Time left: {})",
                format_time(left.max(0.0) as u64, with_hours)
            ));
        }
        lines.push(format!("Duration: {}", duration));
    }
    Notification {
        summary: record.title.clone(),
        body: lines.join("\n"),
        icon,
    }
}

pub fn connection_lost_notification(address: &str) -> Notification {
    Notification {
        summary: format!("Unable to connect to: {}", address),
        body: String::new(),
        icon: None,
    }
}

/// Whether the cached thumbnail must be fetched again for `song`.
pub fn needs_download(
    song: &LogRecord,
    previous: Option<&LogRecord>,
    index: usize,
    cached: bool,
) -> bool {
    if song.thumbnail_url.is_empty() {
        return false;
    }
    if !cached {
        return true;
    }
    match previous {
        None => true,
        Some(prev) => prev.thumbnail_url != song.thumbnail_url || index > 1,
    }
}

pub struct Notifier {
    client: KodiClient,
    http: reqwest::Client,
    log: PlaybackLog,
    thumbnail_path: PathBuf,
    /// Zero disables display.
    timeout: Duration,
    snapshot: watch::Receiver<PlayerSnapshot>,
    /// Every delivered notification, for presenters living elsewhere.
    shown: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(
        client: KodiClient,
        log: PlaybackLog,
        thumbnail_path: PathBuf,
        timeout: Duration,
        snapshot: watch::Receiver<PlayerSnapshot>,
    ) -> Self {
        let (shown, _) = broadcast::channel(16);
        Self {
            client,
            // Thumbnails come from the same LAN host as the JSON-RPC calls.
            http: reqwest::Client::builder()
                .no_proxy()
                .build()
                .unwrap_or_default(),
            log,
            thumbnail_path,
            timeout,
            snapshot,
            shown,
        }
    }

    pub fn from_config(config: &Config, snapshot: watch::Receiver<PlayerSnapshot>) -> anyhow::Result<Self> {
        Ok(Self::new(
            KodiClient::from_config(&config.kodi)?,
            PlaybackLog::new(config.paths.log_file.clone()),
            config.paths.thumbnail.clone(),
            Duration::from_secs(config.kodi.show_notification),
            snapshot,
        ))
    }

    pub fn enabled(&self) -> bool {
        !self.timeout.is_zero()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.shown.subscribe()
    }

    /// React to poll events and explicit "show song N" requests until cancelled.
    pub async fn run(
        self,
        mut events: broadcast::Receiver<PollEvent>,
        mut requests: mpsc::Receiver<usize>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(PollEvent::SongAccepted(_)) => {
                        self.show_song(1).await;
                    }
                    Ok(PollEvent::ConnectionLost { address }) => {
                        self.deliver(&connection_lost_notification(&address));
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("[notify] Missed {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some(index) = requests.recv() => {
                    self.show_song(index).await;
                }
            }
        }
        debug!("[notify] Stopped");
    }

    /// Notify about the song `index` places from the end of the log (1 = current).
    /// Does nothing, not even the thumbnail refresh, while disabled.
    pub async fn show_song(&self, index: usize) -> Option<Notification> {
        if !self.enabled() {
            return None;
        }
        let (song, previous) = self.log.song_at(index)?;
        let icon = self.refresh_thumbnail(&song, previous.as_ref(), index).await;

        let snapshot = self.snapshot.borrow().clone();
        let time_left = if index == 1 && song.duration > 0 && snapshot.item_type != "song" {
            self.client
                .media_times(snapshot.connection.player_id)
                .await
                .ok()
                .map(|t| t.left)
        } else {
            None
        };

        let notification = song_notification(&song, time_left, icon);
        self.deliver(&notification);
        Some(notification)
    }

    fn deliver(&self, notification: &Notification) {
        if !self.enabled() {
            return;
        }
        println!("{}", notification.summary);
        if !notification.body.is_empty() {
            println!("{}", notification.body);
        }
        info!(
            "[notify] {} | {} (for {:?})",
            notification.summary,
            notification.body.replace('\n', " | "),
            self.timeout
        );
        let _ = self.shown.send(notification.clone());
    }

    async fn refresh_thumbnail(
        &self,
        song: &LogRecord,
        previous: Option<&LogRecord>,
        index: usize,
    ) -> Option<PathBuf> {
        if song.thumbnail_url.is_empty() {
            return None;
        }
        let cached = self.thumbnail_path.exists();
        if needs_download(song, previous, index, cached) {
            if let Err(e) = self.download(&song.thumbnail_url).await {
                warn!("[notify] Thumbnail download failed: {}", e);
            }
        }
        self.thumbnail_path
            .exists()
            .then(|| self.thumbnail_path.clone())
    }

    async fn download(&self, url: &str) -> anyhow::Result<()> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        tokio::fs::write(&self.thumbnail_path, &bytes).await?;
        debug!("[notify] Saved thumbnail {} ({} bytes)", url, bytes.len());
        Ok(())
    }
}
