use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use layers::{MapConfig, MapModel, DEFAULT_MAX_RADIUS, DEFAULT_MIN_RADIUS};
use render::ViewportConfig;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod sources;

use app::{router, AppState};
use sources::{load_all, BoundarySource};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serves the recordings map")]
struct Config {
    /// Address to listen on
    #[arg(long, env = "HEARING_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Recordings CSV
    #[arg(long, env = "HEARING_DATA", default_value = "data/recordings.csv")]
    data: PathBuf,

    /// Directory of static files served for unmatched paths
    #[arg(long, env = "HEARING_STATIC_ROOT")]
    static_root: Option<PathBuf>,

    /// Boundary GeoJSON sources, `name=path-or-url`, comma separated
    #[arg(long, env = "HEARING_BOUNDARIES", value_delimiter = ',')]
    boundaries: Vec<BoundarySource>,

    /// Radius of the largest point, in pixels
    #[arg(long, env = "HEARING_MAX_RADIUS", default_value_t = DEFAULT_MAX_RADIUS)]
    max_radius: f64,

    /// Radius floor so empty visits stay visible
    #[arg(long, env = "HEARING_MIN_RADIUS", default_value_t = DEFAULT_MIN_RADIUS)]
    min_radius: f64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::parse();
    if let Err(message) = run(config).await {
        error!("{message}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), String> {
    let map_config = MapConfig {
        max_radius: config.max_radius,
        min_radius: config.min_radius,
    };
    let model = MapModel::load(&config.data, map_config)
        .map_err(|e| format!("failed to load {}: {e}", config.data.display()))?;
    if !model.rejected().is_empty() {
        warn!(
            "{} rows rejected from {}; see /api/problems",
            model.rejected().len(),
            config.data.display()
        );
    }

    let http = reqwest::Client::new();
    let boundaries = load_all(&config.boundaries, &http)
        .await
        .map_err(|e| e.to_string())?;

    let state = AppState::new(model, boundaries, ViewportConfig::default());
    let app = router(state, config.static_root.as_deref());

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|e| format!("cannot bind {}: {e}", config.addr))?;
    info!("recordings map listening on http://{}", config.addr);
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server error: {e}"))
}
