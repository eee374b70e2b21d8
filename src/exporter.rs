use log::{debug, info};

use crate::clients::errors::Result;
use crate::clients::{SpotifyClient, TrackStore};

/// Tracks exported when no limit is given.
pub const DEFAULT_LIMIT: u32 = 3;

/// Copies the latest Spotify listening history into the tracks file.
pub struct Exporter {
    spotify: SpotifyClient,
    store: TrackStore,
    limit: u32,
}

impl Exporter {
    /// Exporter writing up to `limit` tracks into `store`.
    pub fn new(spotify: SpotifyClient, store: TrackStore, limit: u32) -> Self {
        Exporter {
            spotify,
            store,
            limit,
        }
    }

    /// Authorize the Spotify client.
    pub async fn authorize(&self) -> Result<()> {
        // CLI prompt may be shown here
        self.spotify.authorize_client().await
    }

    /// Returns the number of tracks written, 0 when the file was left alone.
    pub async fn export(&self) -> Result<usize> {
        info!("Starting export ...");
        debug!("Fetching {} recently played tracks from Spotify ...", self.limit);
        let tracks = self.spotify.recently_played(self.limit).await?;
        debug!("Fetched {} recently played tracks", tracks.len());

        if self.store.save(&tracks).await? {
            info!(
                "Export completed. Wrote {} tracks to {:?}",
                tracks.len(),
                self.store.path()
            );
            Ok(tracks.len())
        } else {
            Ok(0)
        }
    }
}
