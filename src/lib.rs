//! recent-tracks - Show recently played Spotify tracks on a web page
//!
//! This library fetches the `recent_tracks.json` list, renders it as track cards
//! into a page container, exports the list from Spotify and serves the page.
//! The `analysis` module summarizes a Spotify Extended Streaming History export.

/// Streaming history statistics for the `wrapped` command
pub mod analysis;
/// Client modules for track sources, Spotify and local storage
pub mod clients;
/// Settings from the environment and `.env`
pub mod config;
/// Spotify recently played export
pub mod exporter;
/// Page model and track rendering
pub mod render;
/// HTTP page host
pub mod server;
