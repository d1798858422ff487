// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use skylane_core::config::TrackerConfig;
use skylane_core::dataset::DatasetSource;
use skylane_core::feed::{HttpFeed, JsonFileFeed};
use skylane_core::format;
use skylane_core::session::SessionState;
use skylane_core::{
    AircraftFeed, AirportDirectory, FlightView, LiveAircraft, LiveSnapshotCache, MatchKind,
    Resolution, ResolutionService, RouteMatcher, SearchOutcome, SearchRequest, SessionPhase,
    SharedDirectory, TrackingSession,
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Airport dataset: file path or http(s) URL
    #[arg(short, long, env = "SKYLANE_DATASET")]
    dataset: Option<String>,

    /// Live aircraft feed: JSON file path or http(s) URL
    #[arg(short, long, env = "SKYLANE_FEED")]
    feed: Option<String>,

    /// Config file (defaults to config.json in the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search airports by code, city or name
    Search {
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Resolve free text to a single airport code
    Resolve { input: String },
    /// Show live flights between two airports
    Track {
        from: String,
        to: String,
        /// Only flights whose number contains this (case and spaces ignored)
        #[arg(long)]
        flight: Option<String>,
        /// Repeat the search every SECS seconds until Ctrl-C
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
}

/// Marks the session output as changed; rendering happens from a state copy.
#[derive(Default)]
struct ConsoleView {
    changed: AtomicBool,
}

impl ConsoleView {
    fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::SeqCst)
    }
}

impl FlightView for ConsoleView {
    fn set_flights(&self, _flights: &[LiveAircraft]) {
        self.changed.store(true, Ordering::SeqCst);
    }

    fn set_selected_flight(&self, id: Option<&str>) {
        log::debug!("Selection changed — id={:?}", id);
        self.changed.store(true, Ordering::SeqCst);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?;

    let mut config = match &cli.config {
        Some(path) => TrackerConfig::load_from(path)?,
        None => TrackerConfig::load()?,
    };
    if let Some(dataset) = cli.dataset {
        config.dataset_url = dataset;
    }
    if let Some(feed) = cli.feed {
        config.feed_url = Some(feed);
    }

    let directory = load_directory(&config).await?;

    match cli.command {
        Commands::Search { query, limit } => {
            let hits = directory.search_scored(&query, limit.unwrap_or(config.search_limit));
            if hits.is_empty() {
                println!("No airports match '{}'", query);
            }
            for hit in hits {
                let a = hit.record;
                println!("{:>4}  {}  {}, {} ({})", hit.score, a.code, a.name, a.city, a.country);
            }
        }
        Commands::Resolve { input } => {
            let resolver = ResolutionService::new(SharedDirectory::new(directory));
            match resolver.resolve(&input) {
                Resolution::Resolved(r) => {
                    println!("{} ({:?})", r.code, r.confidence);
                    for c in &r.candidates {
                        println!("  {}  {}, {}", c.code, c.name, c.city);
                    }
                }
                Resolution::Unresolved => println!("No airport matches '{}'", input),
            }
        }
        Commands::Track {
            from,
            to,
            flight,
            watch,
        } => {
            let feed_url = config.feed_url.clone().ok_or_else(|| {
                anyhow!("No live feed configured. Pass --feed or set feed_url in config.json.")
            })?;
            let feed = open_feed(&feed_url, config.upstream_timeout())?;
            let shared = SharedDirectory::new(directory);
            let cache =
                LiveSnapshotCache::with_limits(feed, config.cache_ttl(), config.upstream_timeout());
            let matcher = RouteMatcher::with_limits(cache, shared.clone(), config.corridor_limits());
            let view = Arc::new(ConsoleView::default());
            let session =
                TrackingSession::new(ResolutionService::new(shared), matcher, view.clone());

            let mut request = SearchRequest::new(from, to);
            request.flight_number = flight;

            match watch {
                None => track_once(&session, &view, request).await?,
                Some(secs) => {
                    let stop = tokio::signal::ctrl_c();
                    track_watch(&session, &view, request, secs.max(1), stop).await?
                }
            }
        }
    }

    Ok(())
}

async fn load_directory(config: &TrackerConfig) -> Result<AirportDirectory> {
    let source = DatasetSource::parse(&config.dataset_url);
    let directory = source
        .load_directory(config.upstream_timeout())
        .await
        .with_context(|| format!("Could not load airport dataset from {}", config.dataset_url))?;
    if directory.is_empty() {
        warn!("Airport dataset has no usable rows — source={}", config.dataset_url);
    }
    Ok(directory)
}

fn open_feed(location: &str, timeout: Duration) -> Result<Arc<dyn AircraftFeed>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpFeed::new(location, timeout)?))
    } else {
        Ok(Arc::new(JsonFileFeed::new(location)))
    }
}

async fn track_once(
    session: &TrackingSession,
    view: &ConsoleView,
    request: SearchRequest,
) -> Result<()> {
    match session.search(request).await {
        SearchOutcome::Applied(SessionPhase::Failed(e)) => Err(e.into()),
        SearchOutcome::Applied(_) => {
            view.take_changed();
            render(&session.state());
            Ok(())
        }
        SearchOutcome::Superseded => Ok(()),
    }
}

/// Re-runs the search every `secs` seconds until `stop` resolves. `stop` is
/// raced against the running search too, so it takes effect mid-fetch.
async fn track_watch<F>(
    session: &TrackingSession,
    view: &ConsoleView,
    request: SearchRequest,
    secs: u64,
    stop: F,
) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    info!("Watching route — every {}s", secs);
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    let mut first = true;
    tokio::pin!(stop);

    loop {
        let outcome = tokio::select! {
            stopped = &mut stop => {
                stopped?;
                break;
            }
            outcome = async {
                ticker.tick().await;
                session.search(request.clone()).await
            } => outcome,
        };

        match outcome {
            SearchOutcome::Applied(SessionPhase::Failed(e)) if e.is_validation() => {
                return Err(e.into());
            }
            SearchOutcome::Applied(SessionPhase::Failed(e)) => {
                eprintln!("{}", e);
            }
            SearchOutcome::Applied(_) => {
                if view.take_changed() || first {
                    render(&session.state());
                }
                first = false;
            }
            SearchOutcome::Superseded => {}
        }
    }

    session.clear();
    println!("Stopped.");
    Ok(())
}

fn render(state: &SessionState) {
    let origin = state.origin_code.as_deref().unwrap_or("?");
    let dest = state.dest_code.as_deref().unwrap_or("?");

    if state.phase == SessionPhase::Empty {
        println!("No live flights near {} → {}", origin, dest);
        return;
    }

    let kind = match state.match_kind {
        Some(MatchKind::Strict) => "on this route",
        Some(MatchKind::Corridor) => "near the route corridor",
        None => "",
    };
    let at = state
        .fetched_at
        .map(|t| t.format("%H:%M:%S UTC").to_string())
        .unwrap_or_default();
    println!(
        "{} → {}: {} flight(s) {} (snapshot {})",
        origin,
        dest,
        state.flights.len(),
        kind,
        at
    );

    for ac in &state.flights {
        let marker = if state.selected_id.as_deref() == Some(ac.id.as_str()) {
            '*'
        } else {
            ' '
        };
        println!(
            "{} {:<10} {:<12} {:>8} {:>10} {:>5}",
            marker,
            format::label(ac),
            format::route(ac, origin, dest),
            format::altitude(ac.altitude_ft),
            format::speed(ac.ground_speed_kt),
            format::heading(ac.heading_deg),
        );
    }
}
