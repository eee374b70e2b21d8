use log::{debug, info};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::clients::entities::{TrackList, parse_track_list};
use crate::clients::errors::{Error, Result};

/// The `recent_tracks.json` file the exporter writes and the page host serves.
pub struct TrackStore {
    path: PathBuf,
}

impl TrackStore {
    /// Store backed by the file at `path`. Nothing is touched until used.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TrackStore { path: path.into() }
    }

    /// Location of the tracks file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_err(&self, e: impl std::fmt::Display) -> Error {
        Error::Storage(format!("{}: {e}", self.path.display()))
    }

    /// Read the stored list, `None` if no file has been written yet.
    pub async fn load(&self) -> Result<Option<TrackList>> {
        let body = match tokio::fs::read(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No tracks file at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(self.storage_err(e)),
        };
        let tracks = parse_track_list(&body)?;
        debug!("Loaded {} tracks from {:?}", tracks.len(), self.path);
        Ok(Some(tracks))
    }

    /// Replace the stored list, returning whether anything was written.
    ///
    /// An empty list never overwrites what is already there, so a quiet
    /// listening period keeps showing the last known tracks.
    pub async fn save(&self, tracks: &TrackList) -> Result<bool> {
        if tracks.is_empty() {
            info!("No recently played tracks found, keeping {:?}", self.path);
            return Ok(false);
        }

        let body = serde_json::to_vec_pretty(tracks).map_err(|e| self.storage_err(e))?;
        let tmp_path = self.path.with_extension("json.tmp");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_err(e))?;
        }
        tokio::fs::write(&tmp_path, body)
            .await
            .map_err(|e| self.storage_err(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.storage_err(e))?;

        debug!("Stored {} tracks in {:?}", tracks.len(), self.path);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::entities::Track;

    fn track(name: &str) -> Track {
        Track {
            name: name.into(),
            artists: "Artist X".into(),
            album_image: format!("http://x/{name}.png"),
            link: format!("http://x/{name}"),
        }
    }

    #[tokio::test]
    async fn save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackStore::new(dir.path().join("recent_tracks.json"));

        let tracks = vec![track("b"), track("a"), track("c")];
        assert!(store.save(&tracks).await.unwrap());
        assert_eq!(store.load().await.unwrap(), Some(tracks));
        assert!(!dir.path().join("recent_tracks.json.tmp").exists());
    }

    #[tokio::test]
    async fn empty_list_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackStore::new(dir.path().join("recent_tracks.json"));

        store.save(&vec![track("a")]).await.unwrap();
        assert!(!store.save(&Vec::new()).await.unwrap());
        assert_eq!(store.load().await.unwrap(), Some(vec![track("a")]));
    }

    #[tokio::test]
    async fn empty_list_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackStore::new(dir.path().join("recent_tracks.json"));

        store.save(&Vec::new()).await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackStore::new(dir.path().join("missing.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreadable_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be
        let store = TrackStore::new(dir.path());
        assert!(matches!(store.load().await, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn write_failure_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();

        let store = TrackStore::new(blocker.join("recent_tracks.json"));
        match store.save(&vec![track("a")]).await {
            Err(Error::Storage(msg)) => assert!(msg.contains("recent_tracks.json")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
