//! Render instructions emitted by playback.

use serde::Serialize;

use crate::tower::{Disc, TowerId, Towers};

/// One instruction for the render target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderCommand {
    /// Redraw every tower.
    Towers { towers: Towers },
    /// Replace the move / ready label.
    Description { text: String },
    /// Update the move counters.
    Counters {
        current: usize,
        total: usize,
        minimum: usize,
    },
    /// Enable or disable the step buttons.
    Buttons { previous: bool, next: bool },
    /// Start the visual transition of a disc.
    Animate {
        disc: Disc,
        from: TowerId,
        to: TowerId,
    },
    /// Show or hide the completion indicator.
    Completion { visible: bool, total_moves: usize },
    /// Flip the play/pause control.
    PlayLabel { playing: bool },
    /// Show an error message, or clear it with `None`.
    Error { message: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_json() {
        let json = serde_json::to_value(RenderCommand::Buttons {
            previous: false,
            next: true,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "buttons", "previous": false, "next": true})
        );

        let json = serde_json::to_value(RenderCommand::PlayLabel { playing: true }).unwrap();
        assert_eq!(json["type"], "play_label");
    }
}
