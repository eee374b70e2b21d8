use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{info, warn};
use recent_tracks::analysis::WrappedReport;
use recent_tracks::clients::errors::Result;
use recent_tracks::clients::history::load_history;
use recent_tracks::clients::{SpotifyClient, TrackStore, source_for};
use recent_tracks::config::{Config, ConfigBuilder, PAGE_TITLE};
use recent_tracks::exporter::{DEFAULT_LIMIT, Exporter};
use recent_tracks::render::{Document, LoadOutcome, RecentTracksRenderer};
use recent_tracks::server;
use tokio::sync::Mutex;

#[derive(Parser)]
#[command(name = "recent-tracks")]
#[command(version, about = "Show recently played Spotify tracks on a web page", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the page once
    Render {
        /// Track list location, a file path or http(s) URL
        #[arg(long)]
        source: Option<String>,
        /// Where to write the page, stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
        /// Id of the element the track cards go into
        #[arg(long)]
        container_id: Option<String>,
        /// HTTP fetch timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Write recently played tracks from Spotify to the tracks file
    Export {
        /// Number of tracks to fetch, between 1 and 50
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
        /// Tracks file to write
        #[arg(long)]
        output: Option<String>,
    },
    /// Serve the page and the tracks file over HTTP
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:8080
        #[arg(long)]
        bind: Option<String>,
        /// Track list location used for the page
        #[arg(long)]
        source: Option<String>,
    },
    /// Summarize a Spotify Extended Streaming History export
    Wrapped {
        /// Directory holding the export's JSON files
        #[arg(long)]
        history_dir: PathBuf,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            source,
            output,
            container_id,
            timeout,
        } => {
            let config = ConfigBuilder::new()
                .source(source)
                .container_id(container_id)
                .timeout(timeout.map(Duration::from_secs))
                .build()?;
            render_page(&config, output).await
        }
        Commands::Export { limit, output } => {
            let config = ConfigBuilder::new().tracks_file(output).build()?;
            export_tracks(&config, limit).await
        }
        Commands::Serve { bind, source } => {
            let config = ConfigBuilder::new().bind(bind).source(source).build()?;
            server::serve(&config).await
        }
        Commands::Wrapped { history_dir, json } => wrapped(&history_dir, json).await,
    }
}

async fn render_page(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let document = Arc::new(Mutex::new(Document::page(PAGE_TITLE, &config.container_id)));
    let renderer = RecentTracksRenderer::new(
        source_for(&config.source, config.timeout)?,
        document.clone(),
        &config.container_id,
    );

    // A failed load is already logged, the page is still written with an empty container
    if let LoadOutcome::Rendered { count } = renderer.load_recent_songs().await {
        info!("Page contains {count} tracks");
    }

    let html = document.lock().await.to_html();
    match output {
        Some(path) => {
            tokio::fs::write(&path, html).await?;
            info!("Wrote page to {path:?}");
        }
        None => print!("{html}"),
    }
    Ok(())
}

async fn export_tracks(config: &Config, limit: u32) -> Result<()> {
    info!("Authorizing Spotify client ...");
    let exporter = Exporter::new(
        SpotifyClient::try_default()?,
        TrackStore::new(&config.tracks_file),
        limit,
    );
    exporter.authorize().await?;
    exporter.export().await?;
    Ok(())
}

async fn wrapped(history_dir: &Path, json: bool) -> Result<()> {
    info!("Loading streaming history from {history_dir:?} ...");
    let plays = load_history(history_dir).await?;
    if plays.is_empty() {
        warn!("No streams found in {history_dir:?}");
    }

    info!("Analyzing {} streams ...", plays.len());
    let report = WrappedReport::from_plays(&plays);
    if json {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &report).map_err(std::io::Error::from)?;
        writeln!(stdout)?;
    } else {
        print!("{report}");
    }
    info!("Analysis complete");
    Ok(())
}
