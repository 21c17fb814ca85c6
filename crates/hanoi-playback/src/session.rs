//! Playback session: runs a [`Playback`] on its own task.
//!
//! All transitions for a session are applied by a single tokio task, one
//! command at a time. Timers (auto-play ticks, animation releases, error
//! dismissal) never touch playback state directly; they post a command back
//! to the task, tagged so that anything cancelled in the meantime is dropped.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::config::PlaybackConfig;
use crate::error::{Error, Result};
use crate::gate::Ticket;
use crate::input::{Control, Key};
use crate::playback::{Effect, Playback, PlaybackStatus};
use crate::render::RenderCommand;
use crate::schedule::ScheduledTask;
use crate::solution::Solution;

/// Render instructions buffered per subscriber.
const RENDER_BUFFER: usize = 256;

enum Command {
    Load(Arc<Solution>),
    Control(Control),
    ShowError(String),
    ClearError,
    Status(oneshot::Sender<Option<PlaybackStatus>>),
    Tick(u64),
    AnimationDone(Ticket),
    DismissError(u64),
    Dispose,
}

/// Handle to a running playback session.
///
/// Cloning the handle shares the session. The task stops on
/// [`dispose`](Self::dispose) or once every handle is dropped.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    commands: mpsc::UnboundedSender<Command>,
    renders: broadcast::Sender<RenderCommand>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Load(_) => f.write_str("Load"),
            Command::Control(control) => write!(f, "Control({control:?})"),
            Command::ShowError(_) => f.write_str("ShowError"),
            Command::ClearError => f.write_str("ClearError"),
            Command::Status(_) => f.write_str("Status"),
            Command::Tick(generation) => write!(f, "Tick({generation})"),
            Command::AnimationDone(ticket) => write!(f, "AnimationDone({ticket:?})"),
            Command::DismissError(generation) => write!(f, "DismissError({generation})"),
            Command::Dispose => f.write_str("Dispose"),
        }
    }
}

impl PlaybackSession {
    /// Spawn a session on the current tokio runtime. No solution is loaded.
    pub fn spawn(config: PlaybackConfig) -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        let (renders, _) = broadcast::channel(RENDER_BUFFER);

        let driver = Driver {
            config,
            playback: None,
            commands: commands.downgrade(),
            renders: renders.clone(),
            autoplay: None,
            autoplay_generation: 0,
            animation: None,
            error_dismiss: None,
            error_generation: 0,
        };
        tokio::spawn(driver.run(inbox));

        Self { commands, renders }
    }

    /// Receive every render instruction emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RenderCommand> {
        self.renders.subscribe()
    }

    /// Replace the loaded solution and rewind to its initial state.
    ///
    /// Auto-play and any animation belonging to the previous solution are
    /// cancelled first.
    pub fn load(&self, solution: Arc<Solution>) -> Result<()> {
        self.send(Command::Load(solution))
    }

    pub fn advance(&self) -> Result<()> {
        self.control(Control::Next)
    }

    pub fn retreat(&self) -> Result<()> {
        self.control(Control::Previous)
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.control(Control::TogglePlayPause)
    }

    pub fn reset(&self) -> Result<()> {
        self.control(Control::Reset)
    }

    /// Apply a control. Without a loaded solution this does nothing.
    pub fn control(&self, control: Control) -> Result<()> {
        self.send(Command::Control(control))
    }

    /// Apply the control bound to `key`.
    pub fn key(&self, key: Key) -> Result<()> {
        self.control(key.control())
    }

    /// Show a transient error message on the render target.
    pub fn show_error(&self, message: impl Into<String>) -> Result<()> {
        self.send(Command::ShowError(message.into()))
    }

    /// Hide any error on the render target and cancel its dismissal.
    pub fn clear_error(&self) -> Result<()> {
        self.send(Command::ClearError)
    }

    /// Current status, or `None` if no solution is loaded.
    pub async fn status(&self) -> Result<Option<PlaybackStatus>> {
        let (reply, status) = oneshot::channel();
        self.send(Command::Status(reply))?;
        status.await.map_err(|_| Error::SessionClosed)
    }

    /// Cancel all timers and stop the session task.
    pub fn dispose(&self) -> Result<()> {
        self.send(Command::Dispose)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::SessionClosed)
    }
}

/// State owned by the session task.
struct Driver {
    config: PlaybackConfig,
    playback: Option<Playback>,
    commands: mpsc::WeakUnboundedSender<Command>,
    renders: broadcast::Sender<RenderCommand>,
    autoplay: Option<ScheduledTask>,
    autoplay_generation: u64,
    animation: Option<(Ticket, ScheduledTask)>,
    error_dismiss: Option<ScheduledTask>,
    error_generation: u64,
}

impl Driver {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = inbox.recv().await {
            if matches!(command, Command::Dispose) {
                break;
            }
            self.handle(command);
        }
        self.shutdown();
        debug!("Playback session stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Load(solution) => self.load(solution),
            Command::Control(control) => self.control(control),
            Command::ShowError(message) => self.show_error(message),
            Command::ClearError => self.clear_error(),
            Command::Status(reply) => {
                let _ = reply.send(self.playback.as_ref().map(PlaybackStatus::from));
            }
            Command::Tick(generation) => {
                if generation != self.autoplay_generation || self.autoplay.is_none() {
                    debug!(generation, "Dropped tick from cancelled timer");
                    return;
                }
                if let Some(playback) = self.playback.as_mut() {
                    let effects = playback.tick();
                    self.apply(effects);
                }
            }
            Command::AnimationDone(ticket) => {
                if matches!(self.animation, Some((held, _)) if held == ticket) {
                    self.animation = None;
                }
                if let Some(playback) = self.playback.as_mut() {
                    let effects = playback.finish_animation(ticket);
                    self.apply(effects);
                }
            }
            Command::DismissError(generation) => {
                if generation == self.error_generation {
                    self.error_dismiss = None;
                    self.emit(RenderCommand::Error { message: None });
                }
            }
            Command::Dispose => {}
        }
    }

    fn load(&mut self, solution: Arc<Solution>) {
        self.stop_autoplay();
        self.animation = None;

        let playback = Playback::new(solution);
        let status = PlaybackStatus::from(&playback);
        info!(
            total_moves = status.total_moves,
            minimum_moves = status.minimum_moves,
            "Playback session loaded"
        );
        self.playback = Some(playback);

        for command in status.commands() {
            self.emit(command);
        }
    }

    fn control(&mut self, control: Control) {
        let Some(playback) = self.playback.as_mut() else {
            debug!(?control, "No solution loaded");
            return;
        };
        let effects = match control {
            Control::Next => playback.advance(),
            Control::Previous => playback.retreat(),
            Control::TogglePlayPause => playback.toggle_play_pause(),
            Control::Reset => playback.reset(),
        };
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Render(command) => self.emit(command),
                Effect::ScheduleRelease(ticket) => {
                    let commands = self.commands.clone();
                    let task = ScheduledTask::once(self.config.animation, move || async move {
                        if let Some(commands) = commands.upgrade() {
                            let _ = commands.send(Command::AnimationDone(ticket));
                        }
                    });
                    self.animation = Some((ticket, task));
                }
                Effect::StartAutoPlay => self.start_autoplay(),
                Effect::StopAutoPlay => self.stop_autoplay(),
                Effect::CancelAnimation => self.animation = None,
            }
        }
    }

    fn start_autoplay(&mut self) {
        self.stop_autoplay();
        let generation = self.autoplay_generation;
        let commands = self.commands.clone();
        self.autoplay = Some(ScheduledTask::repeating(
            self.config.tick_interval,
            move || match commands.upgrade() {
                Some(commands) => commands.send(Command::Tick(generation)).is_ok(),
                None => false,
            },
        ));
        debug!(generation, "Auto-play timer started");
    }

    fn stop_autoplay(&mut self) {
        self.autoplay_generation += 1;
        if let Some(task) = self.autoplay.take() {
            task.cancel();
            debug!("Auto-play timer cancelled");
        }
    }

    fn show_error(&mut self, message: String) {
        self.error_generation += 1;
        let generation = self.error_generation;
        self.emit(RenderCommand::Error {
            message: Some(message),
        });

        let commands = self.commands.clone();
        self.error_dismiss = Some(ScheduledTask::once(
            self.config.error_display,
            move || async move {
                if let Some(commands) = commands.upgrade() {
                    let _ = commands.send(Command::DismissError(generation));
                }
            },
        ));
    }

    fn clear_error(&mut self) {
        self.error_generation += 1;
        self.error_dismiss = None;
        self.emit(RenderCommand::Error { message: None });
    }

    fn emit(&self, command: RenderCommand) {
        // no subscribers is fine
        let _ = self.renders.send(command);
    }

    fn shutdown(&mut self) {
        self.stop_autoplay();
        self.animation = None;
        self.error_dismiss = None;
        self.playback = None;
    }
}
