//! Playback timing and request limits.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Inclusive range of disc counts a solve request may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for DiscBounds {
    fn default() -> Self {
        Self { min: 1, max: 10 }
    }
}

impl DiscBounds {
    pub fn contains(&self, discs: i64) -> bool {
        (i64::from(self.min)..=i64::from(self.max)).contains(&discs)
    }
}

/// Configuration for a playback session.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Period of the auto-play timer.
    pub tick_interval: Duration,

    /// How long the animation gate stays busy after each advance.
    pub animation: Duration,

    /// How long an error message stays on screen.
    pub error_display: Duration,

    /// Accepted disc counts.
    pub discs: DiscBounds,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1000),
            animation: Duration::from_millis(800),
            error_display: Duration::from_secs(5),
            discs: DiscBounds::default(),
        }
    }
}

impl PlaybackConfig {
    /// Create config from environment variables, falling back to the defaults.
    ///
    /// Reads `HANOI_TICK_MS`, `HANOI_ANIMATION_MS`, `HANOI_ERROR_MS`,
    /// `HANOI_MIN_DISCS` and `HANOI_MAX_DISCS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_interval: env_millis("HANOI_TICK_MS", defaults.tick_interval),
            animation: env_millis("HANOI_ANIMATION_MS", defaults.animation),
            error_display: env_millis("HANOI_ERROR_MS", defaults.error_display),
            discs: DiscBounds {
                min: env_or("HANOI_MIN_DISCS", defaults.discs.min),
                max: env_or("HANOI_MAX_DISCS", defaults.discs.max),
            },
        }
    }

    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    #[must_use]
    pub fn with_animation(mut self, animation: Duration) -> Self {
        self.animation = animation;
        self
    }

    #[must_use]
    pub fn with_error_display(mut self, error_display: Duration) -> Self {
        self.error_display = error_display;
        self
    }

    #[must_use]
    pub fn with_discs(mut self, min: u32, max: u32) -> Self {
        self.discs = DiscBounds { min, max };
        self
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    let millis = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(env_or(key, millis))
}
