//! Spotify Extended Streaming History export.
//!
//! The export is a directory of `*.json` files, each an array of stream
//! records. Records are normalized into [`Play`]s so songs, podcast episodes
//! and audiobook chapters can be ranked together.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::clients::errors::{Error, Result};

/// One row of an Extended Streaming History file. Unused columns are ignored.
#[derive(Deserialize, Debug, Clone)]
pub struct StreamRecord {
    /// When the stream ended (UTC)
    pub ts: DateTime<Utc>,
    /// Client platform, e.g. "android"
    pub platform: Option<String>,
    /// Milliseconds listened
    pub ms_played: u64,
    /// Client IP address
    pub ip_addr: Option<String>,
    /// Track title, for songs
    pub master_metadata_track_name: Option<String>,
    /// Album artist, for songs
    pub master_metadata_album_artist_name: Option<String>,
    /// Album title, for songs
    pub master_metadata_album_album_name: Option<String>,
    /// Episode title, for podcasts
    pub episode_name: Option<String>,
    /// Show title, for podcasts
    pub episode_show_name: Option<String>,
    /// Book title, for audiobooks
    pub audiobook_title: Option<String>,
    /// Chapter title, for audiobooks
    pub audiobook_chapter_title: Option<String>,
    /// Whether shuffle was on
    pub shuffle: Option<bool>,
    /// Whether the user skipped to the next item
    pub skipped: Option<bool>,
}

/// What kind of item a stream was.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Music track
    Song,
    /// Podcast episode
    Podcast,
    /// Audiobook chapter
    Audiobook,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentType::Song => "song",
            ContentType::Podcast => "podcast",
            ContentType::Audiobook => "audiobook",
        })
    }
}

/// A stream with names normalized across content types.
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    /// When the stream ended (UTC)
    pub ts: DateTime<Utc>,
    /// Listening time
    pub minutes_played: f64,
    /// Song, podcast or audiobook
    pub content_type: ContentType,
    /// Track, episode or chapter title
    pub track_name: Option<String>,
    /// Artist or show
    pub artist_name: Option<String>,
    /// Album or book
    pub album_name: Option<String>,
    /// Client platform
    pub platform: Option<String>,
    /// Client IP address
    pub ip_addr: Option<String>,
    /// Whether shuffle was on
    pub shuffle: Option<bool>,
    /// Whether the stream was skipped
    pub skipped: Option<bool>,
}

impl From<StreamRecord> for Play {
    fn from(record: StreamRecord) -> Play {
        // Audiobook wins over podcast when both are set
        let content_type = if record.audiobook_title.is_some() {
            ContentType::Audiobook
        } else if record.episode_name.is_some() {
            ContentType::Podcast
        } else {
            ContentType::Song
        };

        let mut track_name = record.master_metadata_track_name;
        let mut artist_name = record.master_metadata_album_artist_name;
        let mut album_name = record.master_metadata_album_album_name;
        match content_type {
            ContentType::Song => {}
            ContentType::Podcast => {
                track_name = record.episode_name;
                artist_name = record.episode_show_name;
            }
            ContentType::Audiobook => {
                track_name = record.audiobook_chapter_title;
                album_name = record.audiobook_title;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let minutes_played = record.ms_played as f64 / 60_000.0;

        Play {
            ts: record.ts,
            minutes_played,
            content_type,
            track_name,
            artist_name,
            album_name,
            platform: record.platform,
            ip_addr: record.ip_addr,
            shuffle: record.shuffle,
            skipped: record.skipped,
        }
    }
}

fn history_err(path: &Path, e: impl fmt::Display) -> Error {
    Error::History(format!("{}: {e}", path.display()))
}

/// Load every `*.json` file directly inside `dir`, in file name order.
pub async fn load_history(dir: &Path) -> Result<Vec<Play>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| history_err(dir, e))?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| history_err(dir, e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    info!("Found {} JSON files in {:?}", files.len(), dir);

    let mut plays = Vec::new();
    for (i, path) in files.iter().enumerate() {
        let body = tokio::fs::read(path)
            .await
            .map_err(|e| history_err(path, e))?;
        let records: Vec<StreamRecord> =
            serde_json::from_slice(&body).map_err(|e| history_err(path, e))?;
        debug!(
            "Processing file {}/{}: {:?} ({} records)",
            i + 1,
            files.len(),
            path.file_name().unwrap_or_default(),
            records.len()
        );
        plays.extend(records.into_iter().map(Play::from));
    }

    info!("Loaded {} streams in total", plays.len());
    Ok(plays)
}
