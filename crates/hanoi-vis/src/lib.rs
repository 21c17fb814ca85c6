//! Towers of Hanoi Visualization
//!
//! Serves a playback session over HTTP.
//!
//! # Architecture
//!
//! - **REST API**: request a solution, step, play/pause, reset, send keys
//! - **WebSocket**: streams render instructions to the browser
//! - **Solver**: external service reached over HTTP
//!
//! # Usage
//!
//! ```ignore
//! let config = VisConfig::from_env();
//! let session = PlaybackSession::spawn(config.playback.clone());
//! let solver = Arc::new(HttpSolver::new(config.solver_url.clone()));
//!
//! let server = VisServer::new(session, solver, config.playback);
//! server.serve(config.addr).await?;
//! ```

mod config;
mod server;

pub use config::VisConfig;
pub use server::VisServer;
