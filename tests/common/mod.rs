#![allow(dead_code)]
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use recent_tracks::clients::TrackSource;
use recent_tracks::clients::entities::{Track, TrackList};
use recent_tracks::clients::errors::{Error, Result};
use recent_tracks::render::{Document, Element, RecentTracksRenderer};
use tokio::sync::{Mutex, oneshot};

pub const CONTAINER_ID: &str = "recent-tracks";

/// One scripted answer of [`ScriptedSource`].
pub struct Step {
    gate: Option<oneshot::Receiver<()>>,
    response: Result<Vec<u8>>,
}

impl Step {
    pub fn ok(tracks: &TrackList) -> Self {
        Step {
            gate: None,
            response: Ok(serde_json::to_vec(tracks).unwrap()),
        }
    }

    pub fn body(body: &str) -> Self {
        Step {
            gate: None,
            response: Ok(body.as_bytes().to_vec()),
        }
    }

    pub fn network_error() -> Self {
        Step {
            gate: None,
            response: Err(Error::Fetch("connection refused".into())),
        }
    }

    /// Hold the answer back until the returned sender fires.
    pub fn gated(mut self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        self.gate = Some(rx);
        (self, tx)
    }
}

/// Answers each fetch with the next scripted step.
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(ScriptedSource {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackSource for ScriptedSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .await
            .pop_front()
            .expect("no scripted response left");
        if let Some(gate) = step.gate {
            gate.await.expect("gate dropped");
        }
        step.response
    }

    fn location(&self) -> String {
        "scripted".into()
    }
}

pub fn track(n: usize) -> Track {
    Track {
        name: format!("Song {n}"),
        artists: format!("Artist {n}"),
        album_image: format!("http://x/{n}.png"),
        link: format!("http://x/{n}"),
    }
}

pub fn tracks(range: std::ops::Range<usize>) -> TrackList {
    range.map(track).collect()
}

pub fn renderer_with(source: Arc<ScriptedSource>) -> RecentTracksRenderer {
    let document = Arc::new(Mutex::new(Document::page("Recently played", CONTAINER_ID)));
    RecentTracksRenderer::new(source, document, CONTAINER_ID)
}

/// (heading, paragraph, image src) of every card in the container, in order.
pub async fn rendered_cards(renderer: &RecentTracksRenderer) -> Vec<(String, String, String)> {
    let document = renderer.document();
    let document = document.lock().await;
    let container = document
        .element_by_id(renderer.container_id())
        .expect("container present");
    container
        .child_elements()
        .map(|card: &Element| {
            (
                card.find_first("h3").unwrap().text_content(),
                card.find_first("p").unwrap().text_content(),
                card.find_first("img")
                    .unwrap()
                    .attribute("src")
                    .unwrap()
                    .to_string(),
            )
        })
        .collect()
}

pub fn expected_cards(tracks: &TrackList) -> Vec<(String, String, String)> {
    tracks
        .iter()
        .map(|t| (t.name.clone(), t.artists.clone(), t.album_image.clone()))
        .collect()
}
