use crate::clients::entities::Track;
use crate::render::dom::Element;

/// Class of the outer card element.
pub const TRACK_ITEM_CLASS: &str = "track-item";
/// Width and height of the album image, in pixels.
pub const ALBUM_IMAGE_SIZE: &str = "128";

/// Card for one track: album image, then a block with title and artists.
///
/// `link` is carried as an inert `data-link` attribute on the title; it is not
/// turned into a navigable anchor.
pub fn track_fragment(track: &Track) -> Element {
    let image = Element::new("img")
        .attr("src", &track.album_image)
        .attr("alt", track.caption())
        .attr("height", ALBUM_IMAGE_SIZE)
        .attr("width", ALBUM_IMAGE_SIZE);

    let details = Element::new("div")
        .child(
            Element::new("h3")
                .attr("data-link", &track.link)
                .text(&track.name),
        )
        .child(Element::new("p").text(&track.artists));

    Element::new("div")
        .attr("class", TRACK_ITEM_CLASS)
        .child(image)
        .child(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song_a() -> Track {
        Track {
            name: "Song A".into(),
            artists: "Artist X".into(),
            album_image: "http://x/img.png".into(),
            link: "http://x/a".into(),
        }
    }

    #[test]
    fn fragment_shows_track_fields() {
        let card = track_fragment(&song_a());
        assert_eq!(card.attribute("class"), Some("track-item"));

        let img = card.find_first("img").unwrap();
        assert_eq!(img.attribute("src"), Some("http://x/img.png"));
        assert_eq!(img.attribute("alt"), Some("Song A by Artist X"));
        assert_eq!(img.attribute("height"), Some("128"));
        assert_eq!(img.attribute("width"), Some("128"));

        let heading = card.find_first("h3").unwrap();
        assert_eq!(heading.text_content(), "Song A");
        assert_eq!(heading.attribute("data-link"), Some("http://x/a"));
        assert_eq!(card.find_first("p").unwrap().text_content(), "Artist X");
    }

    #[test]
    fn fragment_markup() {
        assert_eq!(
            track_fragment(&song_a()).to_string(),
            "<div class=\"track-item\">\
             <img src=\"http://x/img.png\" alt=\"Song A by Artist X\" height=\"128\" width=\"128\">\
             <div><h3 data-link=\"http://x/a\">Song A</h3><p>Artist X</p></div>\
             </div>"
        );
    }

    #[test]
    fn hostile_fields_are_escaped() {
        let track = Track {
            name: "<img src=x onerror=alert(1)>".into(),
            artists: "A & B".into(),
            album_image: "\" onload=\"alert(1)".into(),
            link: "javascript:alert(1)".into(),
        };
        let card = track_fragment(&track);

        // Raw values are kept as data
        assert_eq!(card.find_first("h3").unwrap().text_content(), track.name);

        let html = card.to_string();
        assert!(!html.contains("<img src=x"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(html.contains("<p>A &amp; B</p>"));
        assert!(html.contains("src=\"&quot; onload=&quot;alert(1)\""));
        assert!(!html.contains("href"));
    }
}
