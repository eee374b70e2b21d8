use std::path::PathBuf;

use log::debug;

use crate::clients::{
    entities::{Track, TrackList},
    errors::{Error, Result},
};
use rspotify::{
    AuthCodeSpotify, Config, Credentials, OAuth,
    model::{FullTrack, PlayHistory},
    prelude::*,
    scopes,
};

/// Spotify returns at most this many items for recently played.
pub const MAX_RECENTLY_PLAYED: u32 = 50;

impl From<FullTrack> for Track {
    fn from(track: FullTrack) -> Track {
        // Images come largest first
        let album_image = track.album.images.into_iter().next().map(|i| i.url);
        let link = track.external_urls.get("spotify").cloned();
        display_track(
            track.name,
            track.artists.iter().map(|a| a.name.as_str()),
            album_image,
            link,
        )
    }
}

fn display_track<'a>(
    name: String,
    artists: impl Iterator<Item = &'a str>,
    album_image: Option<String>,
    link: Option<String>,
) -> Track {
    Track {
        name,
        artists: artists.collect::<Vec<_>>().join(", "),
        album_image: album_image.unwrap_or_default(),
        link: link.unwrap_or_default(),
    }
}

impl From<PlayHistory> for Track {
    fn from(item: PlayHistory) -> Track {
        Track::from(item.track)
    }
}

/// Spotify Web API client authorized for the listening history scope.
pub struct SpotifyClient {
    spotify: AuthCodeSpotify,
}

impl SpotifyClient {
    /// Fetch the most recently played tracks, newest first.
    pub async fn recently_played(&self, limit: u32) -> Result<TrackList> {
        let limit = limit.clamp(1, MAX_RECENTLY_PLAYED);
        let page = self
            .spotify
            .current_user_recently_played(Some(limit), None)
            .await?;
        debug!("Spotify returned {} recently played items", page.items.len());
        Ok(page.items.into_iter().map(Track::from).collect())
    }

    /// Authorize via CLI prompt and OAuth flow, reusing a cached token when valid.
    // Requires the rspotify `cli` feature.
    pub async fn authorize_client(&self) -> Result<()> {
        debug!("Starting Spotify authorization ...");
        let url = self.spotify.get_authorize_url(false)?;
        self.spotify.prompt_for_token(&url).await?;
        let user = self.spotify.me().await?;
        debug!("Authenticated as user: {:?}", user.display_name);
        Ok(())
    }

    /// Client from `RSPOTIFY_*` environment variables, or a configuration error.
    pub fn try_default() -> Result<Self> {
        let creds = Credentials::from_env().ok_or_else(|| {
            Error::Configuration(
                "Missing Spotify credentials, set RSPOTIFY_CLIENT_ID and RSPOTIFY_CLIENT_SECRET"
                    .into(),
            )
        })?;
        let oauth = OAuth::from_env(scopes!("user-read-recently-played")).ok_or_else(|| {
            Error::Configuration("Missing Spotify OAuth configuration, set RSPOTIFY_REDIRECT_URI".into())
        })?;

        let cache_path = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp")) // Fallback to /tmp if cache directory can't be determined
            .join(".recent_tracks_spotify_token");

        let spotify = AuthCodeSpotify::with_config(
            creds,
            oauth,
            Config {
                token_cached: true,
                cache_path,
                ..Default::default()
            },
        );

        Ok(Self { spotify })
    }
}
