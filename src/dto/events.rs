use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{format_unix_ms, phase::VisiblePhase},
    state::{
        game::{Game, Prompt, Scale},
        state_machine::{FinishReason, GamePhase},
    },
};

/// Messages pushed to participant WebSocket clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message on every connection, carrying the minted participant id.
    Welcome {
        /// Identity the participant acts under for the connection lifetime.
        participant_id: Uuid,
    },
    /// Full room snapshot, broadcast on roster and phase changes.
    RoomState(RoomSnapshot),
    /// Phase-change notice with phase-specific context.
    PhaseChanged(PhaseChangedEvent),
    /// The sender's private writing assignments; never broadcast room-wide.
    Assignments(AssignmentsEvent),
    /// The prompt the room is currently negotiating.
    PromptCurrent(PromptCurrentEvent),
    /// The shared estimate moved.
    GuessUpdated {
        /// Prompt the update applies to.
        prompt_id: Uuid,
        /// Clamped shared estimate.
        value: u8,
        /// Participant who moved it.
        by: Uuid,
    },
    /// Ready-vote tally changed.
    ReadyTally {
        /// Prompt the votes apply to.
        prompt_id: Uuid,
        /// Number of votes cast so far.
        votes: usize,
        /// Votes needed to force the reveal.
        required: usize,
    },
    /// The current prompt's target was disclosed and scored.
    PromptRevealed(RevealEvent),
    /// The round ended.
    RoundOver(RoundOverEvent),
}

/// One roster entry of a room snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Participant id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

/// Write-phase progress fields of a snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WriteStatus {
    /// Deadline in unix milliseconds.
    pub ends_at_ms: u64,
    /// Deadline rendered as RFC 3339 for display.
    pub ends_at: String,
    /// Total write-phase duration in milliseconds.
    pub duration_ms: u64,
    /// Clues collected so far.
    pub submitted: usize,
    /// Clues expected for the round.
    pub total: usize,
}

/// Guess-phase progress fields of a snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GuessStatus {
    /// Zero-based cursor into the guess order.
    pub current: usize,
    /// Length of the guess order.
    pub total: usize,
    /// Whether the current prompt has been revealed.
    pub revealed: bool,
}

/// Why a round ended, as exposed to clients.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OverReason {
    /// All prompts were guessed and advanced past.
    Finished,
    /// The write phase produced no clues at all.
    NoClues,
}

impl From<FinishReason> for OverReason {
    fn from(value: FinishReason) -> Self {
        match value {
            FinishReason::Finished => OverReason::Finished,
            FinishReason::NoClues => OverReason::NoClues,
        }
    }
}

/// Snapshot of one room as clients see it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSnapshot {
    /// Normalized room code.
    pub code: String,
    /// Visible phase of the room.
    pub phase: VisiblePhase,
    /// Roster in join order.
    pub players: Vec<PlayerSummary>,
    /// Current host, absent only for a room being torn down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<Uuid>,
    /// Running score; present whenever a round exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// Round ceiling; present from the guess phase onward.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<u32>,
    /// Present during the write phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<WriteStatus>,
    /// Present during the guess phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guess: Option<GuessStatus>,
    /// Present once the round is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<OverReason>,
}

/// Phase-change notice with the context clients need to render the new phase.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PhaseChangedEvent {
    /// The phase just entered.
    pub phase: VisiblePhase,
    /// Present when entering the write phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<WriteStatus>,
    /// Present when entering the guess phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guess: Option<GuessStatus>,
    /// Present when entering the over phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<OverReason>,
}

/// A scale as serialized to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScaleDto {
    /// Label of the low end of the axis.
    pub left: String,
    /// Label of the high end of the axis.
    pub right: String,
}

impl From<&Scale> for ScaleDto {
    fn from(value: &Scale) -> Self {
        Self {
            left: value.left.clone(),
            right: value.right.clone(),
        }
    }
}

/// One private writing assignment, target included.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PromptAssignment {
    /// Prompt id to submit the clue under.
    pub prompt_id: Uuid,
    /// Scale the hidden target sits on.
    pub scale: ScaleDto,
    /// The hidden target, visible only to the assigned author.
    pub target: u8,
}

impl From<&Prompt> for PromptAssignment {
    fn from(value: &Prompt) -> Self {
        Self {
            prompt_id: value.id,
            scale: (&value.scale).into(),
            target: value.target,
        }
    }
}

/// The sender's assignment list for the round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignmentsEvent {
    /// Prompts assigned to the receiving participant.
    pub prompts: Vec<PromptAssignment>,
}

/// Everything the room needs to negotiate the current prompt.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PromptCurrentEvent {
    /// Prompt under the cursor.
    pub prompt_id: Uuid,
    /// The submitted clue text.
    pub clue: String,
    /// Scale the hidden target sits on; the target itself stays hidden.
    pub scale: ScaleDto,
    /// Display name of the clue's author.
    pub author_name: String,
    /// Current shared estimate.
    pub guess_value: u8,
    /// Ready votes needed to force the reveal.
    pub required_ready: usize,
    /// Zero-based cursor position.
    pub index: usize,
    /// Length of the guess order.
    pub total: usize,
}

/// Reveal results for the current prompt.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevealEvent {
    /// Prompt that was revealed.
    pub prompt_id: Uuid,
    /// The disclosed target.
    pub target: u8,
    /// Shared estimate the room settled on.
    pub guess_value: u8,
    /// Absolute distance between estimate and target.
    pub distance: u32,
    /// Points awarded.
    pub points: u32,
    /// Running total after the award.
    pub score: u32,
    /// Round ceiling.
    pub max_score: u32,
}

/// Round-over notice with the final tally.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundOverEvent {
    /// Why the round ended.
    pub reason: OverReason,
    /// Final score.
    pub score: u32,
    /// Round ceiling.
    pub max_score: u32,
}

impl WriteStatus {
    /// Build the write progress block from a live game, when applicable.
    pub fn from_game(game: &Game) -> Option<Self> {
        if game.phase != GamePhase::Write {
            return None;
        }
        let ends_at_ms = game.write_ends_at_ms?;
        Some(Self {
            ends_at_ms,
            ends_at: format_unix_ms(ends_at_ms),
            duration_ms: game.write_duration_ms.unwrap_or_default(),
            submitted: game.clues.len(),
            total: game.total_prompts(),
        })
    }
}

impl GuessStatus {
    /// Build the guess progress block from a live game, when applicable.
    pub fn from_game(game: &Game) -> Option<Self> {
        if game.phase != GamePhase::Guess {
            return None;
        }
        Some(Self {
            current: game.current_index,
            total: game.guess_order.len(),
            revealed: game.revealed,
        })
    }
}
