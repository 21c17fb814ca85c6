//! Towers of Hanoi Playback
//!
//! Step-by-step replay of a precomputed Towers of Hanoi solution.
//!
//! # Architecture
//!
//! - **Solution**: the immutable solved puzzle, held by a [`SequenceStore`]
//! - **Playback**: pure state machine for next / previous / play-pause / reset
//! - **Session**: runs playback on one task, owning the auto-play and
//!   animation timers, and fans out [`RenderCommand`]s
//! - **Solver**: the external collaborator that produces solutions
//!
//! # Usage
//!
//! ```ignore
//! let session = PlaybackSession::spawn(PlaybackConfig::default());
//! let store = RwLock::new(SequenceStore::new());
//! let solver = HttpSolver::new("http://127.0.0.1:5000");
//!
//! solve_and_load(&solver, &store, &session, 3, DiscBounds::default()).await?;
//! session.toggle_play_pause()?;
//! ```

mod config;
mod error;
mod gate;
mod input;
mod playback;
mod render;
mod request;
mod schedule;
mod session;
mod solution;
mod solver;
mod tower;

pub use config::{DiscBounds, PlaybackConfig};
pub use error::{Error, Result};
pub use gate::{AnimationGate, Ticket};
pub use input::{Control, Key};
pub use playback::{Effect, Mode, Playback, PlaybackStatus};
pub use render::RenderCommand;
pub use request::{DiscCount, SolveRequest};
pub use schedule::ScheduledTask;
pub use session::PlaybackSession;
pub use solution::{minimum_moves_for, Move, Position, SequenceStore, Solution, SolveResponse, Verification};
pub use solver::{solve_and_load, HttpSolver, Solver};
pub use tower::{Disc, TowerId, Towers};
