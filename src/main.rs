use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tumamoc_tracker::store::HikeStoreFactory;
use tumamoc_tracker::{
    create_router, format_duration, AppState, Config, FeedLocationSource, GeofenceConfig,
    GpxTrack, HikeController, Position, SessionConfig, TargetKind,
};

#[derive(Parser)]
#[command(name = "tumamoc-tracker", about = "Geofenced hike tracking for Tumamoc Hill")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/tumamoc-tracker")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,

    /// Replay a GPX track as a hike and save it
    Replay {
        /// GPX file to replay
        gpx: PathBuf,

        /// User the hike is saved for
        #[arg(long)]
        user: String,

        /// Delay between replayed points
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
    },

    /// Show distances from a position to the start and summit
    Check {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve => serve(&cfg).await,
        Command::Replay {
            gpx,
            user,
            interval_ms,
        } => replay(&cfg, &gpx, &user, Duration::from_millis(interval_ms)).await,
        Command::Check { lat, lon } => {
            check(lat, lon);
            Ok(())
        }
    }
}

async fn build(cfg: &Config, feed: &Arc<FeedLocationSource>) -> Result<HikeController> {
    let store = HikeStoreFactory::create(&cfg.store)?;
    let controller = HikeController::new(
        feed.clone(),
        store,
        GeofenceConfig::default(),
        SessionConfig::default(),
    )
    .await?;
    Ok(controller)
}

async fn serve(cfg: &Config) -> Result<()> {
    let feed = Arc::new(FeedLocationSource::new("http-feed"));
    let controller = Arc::new(build(cfg, &feed).await?);
    let app = create_router(AppState::new(controller, feed));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

async fn replay(cfg: &Config, path: &Path, user: &str, interval: Duration) -> Result<()> {
    let track = GpxTrack::open(path)?;
    let feed = Arc::new(FeedLocationSource::new("gpx-replay"));
    let controller = build(cfg, &feed).await?;

    let first = track.first().context("GPX track is empty")?;
    feed.push(Position::now(first.latitude, first.longitude)).await;
    controller.begin(controller.current_position().await.as_ref()).await?;

    track.replay(&feed, interval).await;

    let current = controller.current_position().await;
    match controller.finish(user, current.as_ref()).await {
        Ok(saved) => {
            info!("{}", saved.message);
            let total = controller.total_hikes(user).await?;
            info!("{} has {} hike(s) on record", user, total);
        }
        Err(e) => {
            warn!("Hike not saved: {}", e);
            if let Some(summary) = controller.tracker().stop().await {
                info!(
                    "Tracked {}m in {} before stopping",
                    summary.distance_meters.round(),
                    format_duration(summary.duration_seconds)
                );
            }
            return Err(e.into());
        }
    }

    Ok(())
}

fn check(lat: f64, lon: f64) {
    let position = Position::now(lat, lon);
    let status = GeofenceConfig::default().status(Some(&position));

    for kind in [TargetKind::Start, TargetKind::Summit] {
        let near = match kind {
            TargetKind::Start => status.near_start,
            TargetKind::Summit => status.near_summit,
        };
        println!(
            "{} ({})",
            status.describe(kind),
            if near { "inside geofence" } else { "outside geofence" }
        );
    }
}
