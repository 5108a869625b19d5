//! Playback log persistence.
//!
//! ## Schema (tab-separated, one row per accepted song)
//!
//!   title  artist  album_or_series  duration_seconds  thumbnail_url  episode_tag
//!
//! The episode column may be missing on older rows; rows with fewer than five
//! columns are ignored when reading.
//!
//! The file is the hand-off between the poll loop (sole writer) and history
//! readers on other tasks. Each append is one open-write-close and each read
//! re-opens the file, so no lock is needed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Minimum number of columns for a row to be readable.
pub const MIN_FIELDS: usize = 5;

/// One accepted song transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub title: String,
    pub artist: String,
    /// Album for music, series title for episodes.
    pub album: String,
    pub duration: u64,
    pub thumbnail_url: String,
    /// `S01E02` style tag; empty for anything that is not an episode.
    pub episode: String,
}

impl LogRecord {
    pub fn is_episode(&self) -> bool {
        !self.episode.is_empty()
    }

    /// Encode as one line, newline included.
    pub fn encode(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\n",
            log_esc(&self.title),
            log_esc(&self.artist),
            log_esc(&self.album),
            self.duration,
            log_esc(&self.thumbnail_url),
            log_esc(&self.episode),
        )
    }

    pub fn parse(line: &str) -> Option<Self> {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < MIN_FIELDS {
            return None;
        }
        Some(Self {
            title: cols[0].to_string(),
            artist: cols[1].to_string(),
            album: cols[2].to_string(),
            duration: cols[3].trim().parse().unwrap_or(0),
            thumbnail_url: cols[4].to_string(),
            episode: cols.get(5).map(|s| s.to_string()).unwrap_or_default(),
        })
    }
}

fn log_esc(s: &str) -> String {
    s.replace('\t', " ").replace('\n', " ").replace('\r', "")
}

#[derive(Debug, Clone)]
pub struct PlaybackLog {
    path: PathBuf,
}

impl PlaybackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate to empty. Called once when polling starts; history is per session.
    pub async fn reset(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, b"").await?;
        info!("[log] Reset {:?}", self.path);
        Ok(())
    }

    pub async fn append(&self, record: &LogRecord) -> anyhow::Result<()> {
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        f.write_all(record.encode().as_bytes()).await?;
        f.flush().await?;
        debug!("[log] Appended {:?} by {:?}", record.title, record.artist);
        Ok(())
    }

    /// Up to `count` readable records, newest first. A missing file reads as empty.
    pub fn read_recent(&self, count: usize) -> Vec<LogRecord> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        content
            .lines()
            .rev()
            .filter_map(LogRecord::parse)
            .take(count)
            .collect()
    }

    /// The record `index` places from the end (1 = current song, 2 = previous)
    /// together with the one before it, used to tell whether the thumbnail changed.
    pub fn song_at(&self, index: usize) -> Option<(LogRecord, Option<LogRecord>)> {
        if index == 0 {
            return None;
        }
        let mut recent = self
            .read_recent(index.checked_add(1)?)
            .into_iter()
            .skip(index - 1);
        let song = recent.next()?;
        Some((song, recent.next()))
    }
}
