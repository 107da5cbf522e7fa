use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Publicly visible room phase exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Roster management; no round running.
    Lobby,
    /// Players are writing clues against the deadline.
    Write,
    /// The room negotiates guesses prompt by prompt.
    Guess,
    /// Round ended; final score on display.
    Over,
}

impl From<GamePhase> for VisiblePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Lobby => VisiblePhase::Lobby,
            GamePhase::Write => VisiblePhase::Write,
            GamePhase::Guess => VisiblePhase::Guess,
            GamePhase::Over(_) => VisiblePhase::Over,
        }
    }
}
