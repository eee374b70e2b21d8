/// Track data entities and JSON parsing
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Extended Streaming History loader
pub mod history;
/// On-disk `recent_tracks.json` store
pub mod local_storage;
/// Track-list sources (local file or HTTP)
pub mod source;
/// Spotify API client
pub mod spotify;

pub use local_storage::TrackStore;
pub use source::{FileSource, HttpSource, TrackSource, source_for};
pub use spotify::SpotifyClient;
