//! Playback controls for a solved puzzle.
//!
//! [`Playback`] is a pure state machine: every transition returns the
//! [`Effect`]s it wants carried out (render instructions, timer requests) and
//! never touches a clock or a renderer itself.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::gate::{AnimationGate, Ticket};
use crate::render::RenderCommand;
use crate::solution::{Position, Solution};
use crate::tower::Towers;

/// Whether playback is auto-advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Moves only change on request
    Idle,
    /// A repeating timer advances one move per tick
    Playing,
}

/// Work a transition hands back to its driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Pass an instruction to the render target.
    Render(RenderCommand),
    /// Call [`Playback::finish_animation`] with this ticket once the
    /// animation delay has elapsed.
    ScheduleRelease(Ticket),
    /// Start the auto-advance timer, replacing any running one.
    StartAutoPlay,
    /// Cancel the auto-advance timer.
    StopAutoPlay,
    /// Drop any pending release; its ticket is no longer valid.
    CancelAnimation,
}

/// Playback controller for one solution.
#[derive(Debug, Clone)]
pub struct Playback {
    solution: Arc<Solution>,
    position: Position,
    mode: Mode,
    gate: AnimationGate,
    completed: bool,
}

impl Playback {
    /// Create a controller positioned before the first move.
    pub fn new(solution: Arc<Solution>) -> Self {
        Self {
            solution,
            position: Position::Initial,
            mode: Mode::Idle,
            gate: AnimationGate::new(),
            completed: false,
        }
    }

    pub fn solution(&self) -> &Arc<Solution> {
        &self.solution
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether a move is mid-animation.
    pub fn is_animating(&self) -> bool {
        self.gate.is_busy()
    }

    /// Whether completion has fired for the current forward traversal.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Whether every move has been applied.
    pub fn at_end(&self) -> bool {
        self.solution.total_moves() > 0 && self.position == self.solution.last_position()
    }

    pub fn can_advance(&self) -> bool {
        self.position.moves_applied() < self.solution.total_moves()
    }

    pub fn can_retreat(&self) -> bool {
        self.position != Position::Initial
    }

    /// Configuration currently on screen.
    ///
    /// During an animation the screen still shows the configuration from
    /// before the move.
    pub fn rendered_towers(&self) -> &Towers {
        let shown = if self.gate.is_busy() {
            self.position.previous().unwrap_or_default()
        } else {
            self.position
        };
        self.solution.towers_at(shown)
    }

    /// Step forward one move.
    ///
    /// Ignored while animating or once the last move is applied.
    pub fn advance(&mut self) -> Vec<Effect> {
        if self.gate.is_busy() || !self.can_advance() {
            debug!(position = ?self.position, "Advance ignored");
            return Vec::new();
        }

        let solution = Arc::clone(&self.solution);
        let next = self.position.next();
        let Some(mv) = next.index().and_then(|i| solution.moves().get(i)) else {
            return Vec::new();
        };
        let Some(ticket) = self.gate.acquire() else {
            return Vec::new();
        };
        let source_empty = solution.towers_at(self.position).get(mv.from).is_empty();
        self.position = next;
        debug!(move_number = mv.move_number, "Advanced");

        let mut effects = vec![
            Effect::Render(self.counters()),
            Effect::Render(RenderCommand::Description {
                text: mv.description(),
            }),
        ];

        if source_empty {
            effects.extend(self.finish_animation(ticket));
        } else {
            effects.push(Effect::Render(RenderCommand::Animate {
                disc: mv.disc,
                from: mv.from,
                to: mv.to,
            }));
            effects.push(Effect::ScheduleRelease(ticket));
        }
        effects
    }

    /// Complete the animation started by [`advance`](Self::advance).
    ///
    /// A ticket orphaned by a reset or reload is ignored.
    pub fn finish_animation(&mut self, ticket: Ticket) -> Vec<Effect> {
        if !self.gate.release(ticket) {
            debug!(?ticket, "Stale animation completion ignored");
            return Vec::new();
        }

        let mut effects = vec![
            Effect::Render(RenderCommand::Towers {
                towers: self.solution.towers_at(self.position).clone(),
            }),
            Effect::Render(self.buttons()),
        ];

        if self.at_end() && !self.completed {
            self.completed = true;
            info!(total_moves = self.solution.total_moves(), "Playback complete");
            effects.push(Effect::Render(RenderCommand::Completion {
                visible: true,
                total_moves: self.solution.total_moves(),
            }));
            if self.mode == Mode::Playing {
                effects.extend(self.pause());
            }
        }
        effects
    }

    /// Step back one move. No animation is played.
    ///
    /// Ignored while animating or at the initial position.
    pub fn retreat(&mut self) -> Vec<Effect> {
        if self.gate.is_busy() {
            debug!(position = ?self.position, "Retreat ignored while animating");
            return Vec::new();
        }
        let Some(previous) = self.position.previous() else {
            return Vec::new();
        };

        self.position = previous;
        self.completed = false;
        debug!(position = ?self.position, "Retreated");

        let mut effects = self.snapshot();
        effects.push(Effect::Render(self.completion_hidden()));
        effects
    }

    /// Pause if playing; otherwise start playing, rewinding first if complete.
    ///
    /// A solution with no moves never starts playing.
    pub fn toggle_play_pause(&mut self) -> Vec<Effect> {
        match self.mode {
            Mode::Playing => self.pause(),
            Mode::Idle => {
                if self.solution.total_moves() == 0 {
                    debug!("Nothing to play");
                    return Vec::new();
                }

                let mut effects = if self.at_end() {
                    self.reset()
                } else {
                    Vec::new()
                };
                self.mode = Mode::Playing;
                info!(position = ?self.position, "Playback started");
                effects.push(Effect::StartAutoPlay);
                effects.push(Effect::Render(RenderCommand::PlayLabel { playing: true }));
                effects
            }
        }
    }

    /// Auto-advance timer entry point.
    ///
    /// A tick that lands while idle or mid-animation is dropped. The tick
    /// that reaches the last move pauses straight away; completion still
    /// fires when that move's animation finishes.
    pub fn tick(&mut self) -> Vec<Effect> {
        if self.mode != Mode::Playing || self.gate.is_busy() {
            return Vec::new();
        }
        let mut effects = self.advance();
        if self.at_end() && self.mode == Mode::Playing {
            effects.extend(self.pause());
        }
        effects
    }

    /// Stop playing and return to the initial configuration.
    ///
    /// An animation in flight is abandoned.
    pub fn reset(&mut self) -> Vec<Effect> {
        let mut effects = if self.mode == Mode::Playing {
            self.pause()
        } else {
            Vec::new()
        };

        if self.gate.is_busy() {
            effects.push(Effect::CancelAnimation);
        }
        self.gate.cancel();
        self.position = Position::Initial;
        self.completed = false;
        debug!("Reset");

        effects.extend(self.snapshot());
        effects.push(Effect::Render(self.completion_hidden()));
        effects
    }

    fn pause(&mut self) -> Vec<Effect> {
        self.mode = Mode::Idle;
        info!(position = ?self.position, "Playback paused");
        vec![
            Effect::StopAutoPlay,
            Effect::Render(RenderCommand::PlayLabel { playing: false }),
        ]
    }

    /// Immediate redraw of the current position.
    fn snapshot(&self) -> Vec<Effect> {
        vec![
            Effect::Render(RenderCommand::Towers {
                towers: self.solution.towers_at(self.position).clone(),
            }),
            Effect::Render(RenderCommand::Description {
                text: self.solution.describe(self.position),
            }),
            Effect::Render(self.counters()),
            Effect::Render(self.buttons()),
        ]
    }

    fn counters(&self) -> RenderCommand {
        RenderCommand::Counters {
            current: self.position.moves_applied(),
            total: self.solution.total_moves(),
            minimum: self.solution.minimum_moves(),
        }
    }

    fn buttons(&self) -> RenderCommand {
        RenderCommand::Buttons {
            previous: self.can_retreat(),
            next: self.can_advance(),
        }
    }

    fn completion_hidden(&self) -> RenderCommand {
        RenderCommand::Completion {
            visible: false,
            total_moves: self.solution.total_moves(),
        }
    }
}

/// Everything the render target shows, derived from a [`Playback`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackStatus {
    pub position: Position,
    pub current_move: usize,
    pub total_moves: usize,
    pub minimum_moves: usize,
    pub mode: Mode,
    pub animating: bool,
    pub completed: bool,
    pub previous_enabled: bool,
    pub next_enabled: bool,
    pub towers: Towers,
    pub description: String,
}

impl From<&Playback> for PlaybackStatus {
    fn from(playback: &Playback) -> Self {
        Self {
            position: playback.position,
            current_move: playback.position.moves_applied(),
            total_moves: playback.solution.total_moves(),
            minimum_moves: playback.solution.minimum_moves(),
            mode: playback.mode,
            animating: playback.is_animating(),
            completed: playback.completed,
            previous_enabled: playback.can_retreat(),
            next_enabled: playback.can_advance(),
            towers: playback.rendered_towers().clone(),
            description: playback.solution.describe(playback.position),
        }
    }
}

impl PlaybackStatus {
    /// Instructions that redraw this status from scratch.
    pub fn commands(&self) -> Vec<RenderCommand> {
        vec![
            RenderCommand::Completion {
                visible: self.completed,
                total_moves: self.total_moves,
            },
            RenderCommand::Counters {
                current: self.current_move,
                total: self.total_moves,
                minimum: self.minimum_moves,
            },
            RenderCommand::Towers {
                towers: self.towers.clone(),
            },
            RenderCommand::Description {
                text: self.description.clone(),
            },
            RenderCommand::Buttons {
                previous: self.previous_enabled,
                next: self.next_enabled,
            },
            RenderCommand::PlayLabel {
                playing: self.mode == Mode::Playing,
            },
        ]
    }
}
