use rspotify::ClientError;
use thiserror::Error;

/// Every failure the crate reports.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport, timeout or read failure while getting the track list.
    #[error("Failed to fetch track list: {0}")]
    Fetch(String),

    /// The track list URL answered with a non-success status.
    #[error("Track list request to {url} returned status {status}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Malformed JSON or a document of the wrong shape.
    #[error("Failed to parse track list: {0}")]
    Parse(#[from] serde_json::Error),

    /// The page has no element with the configured id.
    #[error("Container element #{0} not found in document")]
    TargetNotFound(String),

    /// Spotify API or OAuth failure.
    #[error("Spotify error: {0}")]
    Spotify(#[from] ClientError),

    /// Missing or invalid settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reading or writing the tracks file failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Reading a streaming history export failed.
    #[error("History error: {0}")]
    History(String),

    /// Socket or file IO outside the stores, e.g. writing the page or binding the server.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Error::HttpStatus {
                status: status.as_u16(),
                url: err.url().map(ToString::to_string).unwrap_or_default(),
            },
            None => Error::Fetch(err.to_string()),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
