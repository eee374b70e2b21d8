use serde::{Deserialize, Serialize};

/// One entry of the recently played list, as stored in `recent_tracks.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Song title
    pub name: String,
    /// Already joined for display, e.g. "Artist X, Artist Y"
    pub artists: String,
    /// Album artwork URL
    pub album_image: String,
    /// Track page URL
    pub link: String,
}

impl Track {
    /// Text used for the album image `alt` attribute.
    pub fn caption(&self) -> String {
        format!("{} by {}", self.name, self.artists)
    }
}

/// Tracks in the order the source listed them. No dedup.
pub type TrackList = Vec<Track>;

/// Parse a JSON array of tracks.
pub fn parse_track_list(body: &[u8]) -> Result<TrackList, serde_json::Error> {
    serde_json::from_slice(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tracks_in_source_order() {
        let body = br#"[
            {"name":"Song A","artists":"Artist X","album_image":"http://x/a.png","link":"http://x/a"},
            {"name":"Song B","artists":"Artist Y, Artist Z","album_image":"http://x/b.png","link":"http://x/b"},
            {"name":"Song A","artists":"Artist X","album_image":"http://x/a.png","link":"http://x/a"}
        ]"#;
        let tracks = parse_track_list(body).unwrap();
        let names: Vec<_> = tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Song A", "Song B", "Song A"]);
        assert_eq!(tracks[1].artists, "Artist Y, Artist Z");
    }

    #[test]
    fn rejects_missing_fields() {
        let body = br#"[{"name":"Song A","artists":"Artist X","album_image":"http://x/a.png"}]"#;
        assert!(parse_track_list(body).is_err());
    }

    #[test]
    fn rejects_non_array_document() {
        assert!(parse_track_list(br#"{"name":"Song A"}"#).is_err());
        assert!(parse_track_list(b"not json").is_err());
    }

    #[test]
    fn caption_joins_name_and_artists() {
        let track = Track {
            name: "Song A".into(),
            artists: "Artist X".into(),
            album_image: String::new(),
            link: String::new(),
        };
        assert_eq!(track.caption(), "Song A by Artist X");
    }
}
