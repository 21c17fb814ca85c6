//! Server configuration.

use std::net::SocketAddr;

use hanoi_playback::PlaybackConfig;

/// Configuration for the visualization server.
#[derive(Debug, Clone)]
pub struct VisConfig {
    /// HTTP listen address
    pub addr: SocketAddr,

    /// Base URL of the solver service
    pub solver_url: String,

    /// Playback timings and request limits
    pub playback: PlaybackConfig,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            solver_url: "http://127.0.0.1:5000".to_string(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl VisConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let addr = match std::env::var("HANOI_VIS_ADDR") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid HANOI_VIS_ADDR={:?}", raw);
                defaults.addr
            }),
            Err(_) => defaults.addr,
        };

        let solver_url = std::env::var("HANOI_SOLVER_URL").unwrap_or(defaults.solver_url);

        Self {
            addr,
            solver_url,
            playback: PlaybackConfig::from_env(),
        }
    }

    /// Listen on `port` on all interfaces.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.addr.set_port(port);
        self
    }
}
