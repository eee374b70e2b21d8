use std::time::Duration;

use log::debug;

use crate::clients::errors::{Error, Result};

/// Track list location used by `render` and `serve`.
pub const DEFAULT_SOURCE: &str = "./recent_tracks.json";
/// File written by `export` and served as `/recent_tracks.json`.
pub const DEFAULT_TRACKS_FILE: &str = "recent_tracks.json";
/// Id of the element the track cards go into.
pub const DEFAULT_CONTAINER_ID: &str = "recent-tracks";
/// Address the page host listens on.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// HTTP fetch timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Title and heading of the generated page.
pub const PAGE_TITLE: &str = "Recently played";

/// Settings shared by the commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Track list file path or http(s) URL
    pub source: String,
    /// Local tracks file
    pub tracks_file: String,
    /// Render target id
    pub container_id: String,
    /// Server bind address
    pub bind: String,
    /// HTTP fetch timeout
    pub timeout: Duration,
}

/// Collects explicit overrides before falling back to the environment.
#[derive(Default)]
pub struct ConfigBuilder {
    source: Option<String>,
    tracks_file: Option<String>,
    container_id: Option<String>,
    bind: Option<String>,
    timeout: Option<Duration>,
}

impl ConfigBuilder {
    /// Builder with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the track list location.
    #[must_use]
    pub fn source(mut self, source: Option<String>) -> Self {
        self.source = source.or(self.source);
        self
    }

    /// Override the tracks file.
    #[must_use]
    pub fn tracks_file(mut self, path: Option<String>) -> Self {
        self.tracks_file = path.or(self.tracks_file);
        self
    }

    /// Override the container id.
    #[must_use]
    pub fn container_id(mut self, id: Option<String>) -> Self {
        self.container_id = id.or(self.container_id);
        self
    }

    /// Override the bind address.
    #[must_use]
    pub fn bind(mut self, bind: Option<String>) -> Self {
        self.bind = bind.or(self.bind);
        self
    }

    /// Override the HTTP timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.or(self.timeout);
        self
    }

    /// Explicit values win, then `RECENT_TRACKS_*` environment variables, then defaults.
    pub fn build(self) -> Result<Config> {
        self.build_with(|key| std::env::var(key).ok())
    }

    /// [`Self::build`] with a custom variable lookup.
    pub fn build_with(self, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let pick = |value: Option<String>, key: &str, default: &str| {
            value
                .or_else(|| env(key).filter(|v| !v.trim().is_empty()))
                .unwrap_or_else(|| default.to_string())
        };

        let timeout = match self.timeout {
            Some(t) => t,
            None => match env("RECENT_TRACKS_TIMEOUT_SECS") {
                Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                    Error::Configuration(format!(
                        "RECENT_TRACKS_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                    ))
                })?),
                None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            },
        };

        let config = Config {
            source: pick(self.source, "RECENT_TRACKS_SOURCE", DEFAULT_SOURCE),
            tracks_file: pick(self.tracks_file, "RECENT_TRACKS_FILE", DEFAULT_TRACKS_FILE),
            container_id: pick(
                self.container_id,
                "RECENT_TRACKS_CONTAINER_ID",
                DEFAULT_CONTAINER_ID,
            ),
            bind: pick(self.bind, "RECENT_TRACKS_BIND", DEFAULT_BIND),
            timeout,
        };
        debug!("Using config {config:?}");
        Ok(config)
    }
}
