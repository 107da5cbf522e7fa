use thiserror::Error;

/// High-level phases a room can be in.
///
/// `Lobby` is represented by the absence of a [`crate::state::game::Game`];
/// the other phases live on the game itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No round is running; the roster can be managed and the host may start.
    Lobby,
    /// Players are writing clues for their assigned prompts, deadline armed.
    Write,
    /// The room walks through the collected clues and negotiates guesses.
    Guess,
    /// The round ended; final score is displayed until restart or reset.
    Over(FinishReason),
}

/// Indicates why a round reached the `Over` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Every prompt in the guess order was revealed and advanced past.
    Finished,
    /// The write phase closed without a single submitted clue.
    NoClues,
}

/// Events that can be applied to the room phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Host starts a round from the lobby.
    Start,
    /// The write phase closed with at least one clue collected.
    WriteComplete,
    /// The write phase closed with zero clues collected.
    WriteEmpty,
    /// Host advanced past the last prompt of the guess order.
    RoundFinished,
    /// Host restarts a fresh round from the final score screen.
    Restart,
    /// Host discards the round and returns the room to the lobby.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the room was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

impl GamePhase {
    /// Compute the phase that follows `event`, rejecting edges the session
    /// flow does not allow.
    ///
    /// The write phase closes through exactly two events: `WriteComplete`
    /// when clues exist and `WriteEmpty` as the zero-clue short circuit.
    /// `Reset` is valid from every phase, including the lobby itself.
    pub fn apply(self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self, event) {
            (GamePhase::Lobby, GameEvent::Start) => GamePhase::Write,
            (GamePhase::Write, GameEvent::WriteComplete) => GamePhase::Guess,
            (GamePhase::Write, GameEvent::WriteEmpty) => GamePhase::Over(FinishReason::NoClues),
            (GamePhase::Guess, GameEvent::RoundFinished) => {
                GamePhase::Over(FinishReason::Finished)
            }
            (GamePhase::Over(_), GameEvent::Restart) => GamePhase::Write,
            (_, GameEvent::Reset) => GamePhase::Lobby,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
