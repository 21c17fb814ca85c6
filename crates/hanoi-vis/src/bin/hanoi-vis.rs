//! Towers of Hanoi Visualization Server
//!
//! Serve playback controls for solutions fetched from the solver service.

use std::env;
use std::sync::Arc;

use hanoi_playback::{HttpSolver, PlaybackSession};
use hanoi_vis::{VisConfig, VisServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hanoi_vis=info,hanoi_playback=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line args: [discs] [port]
    let args: Vec<String> = env::args().collect();

    let discs: Option<i64> = args.get(1).and_then(|s| s.parse().ok());

    let mut config = VisConfig::from_env();
    if let Some(port) = args.get(2).and_then(|s| s.parse().ok()) {
        config = config.with_port(port);
    }

    println!("Towers of Hanoi Visualizer");
    println!("==========================");
    println!();
    println!("Solver: {}", config.solver_url);

    let session = PlaybackSession::spawn(config.playback.clone());
    let solver = Arc::new(HttpSolver::new(config.solver_url.clone()));
    let server = VisServer::new(session, solver, config.playback.clone());

    if let Some(discs) = discs {
        println!("Solving for {} discs...", discs);
        if let Err(e) = server.preload(discs).await {
            tracing::error!("Initial solve failed: {}", e);
        }
    }

    println!("Starting visualization server on http://{}", config.addr);
    println!();

    server.serve(config.addr).await?;

    Ok(())
}
