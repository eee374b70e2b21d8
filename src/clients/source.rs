use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::clients::errors::{Error, Result};

/// Where the track-list document comes from.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Return the raw body of the track-list document.
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Human readable location, used in log records.
    fn location(&self) -> String;
}

/// Track list read from a local file.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Source reading `path` on every fetch.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

#[async_trait]
impl TrackSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        debug!("Reading track list from {:?}", self.path);
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::Fetch(format!("{}: {e}", self.path.display())))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Track list fetched with a GET request.
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    /// Source requesting `url`, giving up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        Ok(HttpSource {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TrackSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        debug!("Requesting track list from {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let response = response.error_for_status()?;
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}

/// Pick a source for `location`: `http(s)://` URLs go over the network,
/// anything else is read as a local path.
pub fn source_for(location: &str, timeout: Duration) -> Result<Arc<dyn TrackSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpSource::new(location, timeout)?))
    } else {
        Ok(Arc::new(FileSource::new(location)))
    }
}
