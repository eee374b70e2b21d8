use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use log::{debug, error, info};
use tokio::sync::Mutex;

use crate::clients::TrackSource;
use crate::clients::entities::parse_track_list;
use crate::clients::errors::Result;
use crate::render::dom::{Container, Document};
use crate::render::fragment::track_fragment;

/// What became of one `load_recent_songs` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The container now holds exactly `count` track cards.
    Rendered {
        /// Cards now in the container
        count: usize,
    },
    /// A later call started before this one finished; its result was dropped.
    Superseded,
    /// Fetch, parse or container lookup failed. The container is untouched.
    Failed,
}

/// Fetches the recent-tracks list and renders it into one container of a shared page.
pub struct RecentTracksRenderer {
    source: Arc<dyn TrackSource>,
    document: Arc<Mutex<Document>>,
    container_id: String,
    latest_request: AtomicU64,
    failures: AtomicUsize,
}

impl RecentTracksRenderer {
    /// Renderer writing into the element `container_id` of `document`.
    pub fn new(
        source: Arc<dyn TrackSource>,
        document: Arc<Mutex<Document>>,
        container_id: impl Into<String>,
    ) -> Self {
        RecentTracksRenderer {
            source,
            document,
            container_id: container_id.into(),
            latest_request: AtomicU64::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// The page this renderer writes into.
    pub fn document(&self) -> Arc<Mutex<Document>> {
        self.document.clone()
    }

    /// Id of the element whose children are replaced.
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Number of calls that ended in [`LoadOutcome::Failed`].
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Fetch, parse and render. Errors are logged, never returned.
    pub async fn load_recent_songs(&self) -> LoadOutcome {
        match self.try_load().await {
            Ok(Some(count)) => LoadOutcome::Rendered { count },
            Ok(None) => LoadOutcome::Superseded,
            Err(e) => {
                self.failures.fetch_add(1, Ordering::SeqCst);
                error!("Error loading recent tracks: {e}");
                LoadOutcome::Failed
            }
        }
    }

    /// Same as [`Self::load_recent_songs`] but hands back the error.
    ///
    /// `Ok(None)` means a newer call took over and nothing was rendered.
    pub async fn try_load(&self) -> Result<Option<usize>> {
        let token = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        // Fail before touching the network if the page cannot take the result
        self.document.lock().await.container(&self.container_id)?;

        debug!(
            "Loading recent tracks from {} (request {token})",
            self.source.location()
        );
        let body = self.source.fetch().await?;
        let tracks = parse_track_list(&body)?;

        let mut document = self.document.lock().await;
        if self.latest_request.load(Ordering::SeqCst) != token {
            debug!("Dropping stale recent tracks result (request {token})");
            return Ok(None);
        }

        let container = document.container(&self.container_id)?;
        container.clear_children();
        for track in &tracks {
            container.append_child(track_fragment(track));
        }

        info!(
            "Rendered {} recent tracks into #{}",
            tracks.len(),
            self.container_id
        );
        Ok(Some(tracks.len()))
    }
}
