use std::collections::HashSet;

use indexmap::IndexMap;
use rand::seq::SliceRandom;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::state::state_machine::GamePhase;

/// Milliseconds of writing time granted per assigned prompt.
const WRITE_MS_PER_PROMPT: u64 = 45_000;
/// Lower bound of the write deadline, applied even for tiny rounds.
const WRITE_MIN_MS: u64 = 120_000;
/// Upper bound of the write deadline, applied for very large rounds.
const WRITE_MAX_MS: u64 = 480_000;
/// Maximum points a single prompt can award; the round ceiling is this times
/// the number of collected clues.
pub const POINTS_PER_PROMPT: u32 = 4;
/// Shared estimate every prompt starts from.
pub const INITIAL_GUESS: u8 = 50;

/// A semantic axis from the external catalog, e.g. "cold" to "hot".
///
/// The engine treats the pole labels as opaque data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    /// Label of the low end of the axis.
    pub left: String,
    /// Label of the high end of the axis.
    pub right: String,
}

/// A writing assignment: one scale with a hidden target, owned by one player.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Process-lifetime-unique identifier, also the clue key after submission.
    pub id: Uuid,
    /// Scale the hidden target sits on.
    pub scale: Scale,
    /// Hidden target value the clue should point at.
    pub target: u8,
}

/// The free-text hint submitted for a prompt, with its original context.
///
/// The author's display name is captured at submission time so reveal
/// broadcasts survive the author disconnecting later in the round.
#[derive(Debug, Clone)]
pub struct Clue {
    /// Participant who wrote the clue.
    pub author_id: Uuid,
    /// Display name of the author when the clue was submitted.
    pub author_name: String,
    /// Scale copied from the originating prompt.
    pub scale: Scale,
    /// Hidden target copied from the originating prompt.
    pub target: u8,
    /// The submitted hint text, trimmed.
    pub text: String,
}

/// Outcome of revealing the current prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealOutcome {
    /// Prompt that was revealed.
    pub prompt_id: Uuid,
    /// The hidden target, now disclosed.
    pub target: u8,
    /// Shared estimate the room settled on.
    pub guess_value: u8,
    /// Absolute distance between estimate and target.
    pub distance: u32,
    /// Points awarded for this prompt.
    pub points: u32,
    /// Running total after awarding the points.
    pub score: u32,
}

/// State of a single round, exclusively owned by its room.
#[derive(Debug)]
pub struct Game {
    /// Current phase; never `Lobby` (a lobby room owns no game at all).
    pub phase: GamePhase,
    /// Unix-millisecond deadline of the write phase, cleared on leaving it.
    pub write_ends_at_ms: Option<u64>,
    /// Total duration granted for the write phase, cleared on leaving it.
    pub write_duration_ms: Option<u64>,
    /// Per-player writing assignments for this round.
    pub assignments: IndexMap<Uuid, Vec<Prompt>>,
    /// Collected clues keyed by prompt id.
    pub clues: IndexMap<Uuid, Clue>,
    /// Shuffled permutation of the clue keys, fixed once guessing starts.
    pub guess_order: Vec<Uuid>,
    /// Cursor into `guess_order`; equal to its length once the round is done.
    pub current_index: usize,
    /// Running score of the round.
    pub score: u32,
    /// Round ceiling, fixed when guessing starts.
    pub max_score: u32,
    /// Shared live estimate for the prompt currently being guessed.
    pub guess_value: u8,
    /// Whether the current prompt's target has been disclosed.
    pub revealed: bool,
    /// Participants who accepted the current estimate; reset per prompt.
    pub ready_voters: HashSet<Uuid>,
    /// Handle of the pending deadline task while in the write phase.
    pub write_timer: Option<JoinHandle<()>>,
}

/// Points awarded for an absolute distance between estimate and target.
pub fn score_for_distance(distance: u32) -> u32 {
    match distance {
        0..=3 => 4,
        4..=8 => 3,
        9..=14 => 2,
        15..=22 => 1,
        _ => 0,
    }
}

/// Write-phase duration for a round with `total_prompts` assignments.
pub fn write_duration_ms(total_prompts: usize) -> u64 {
    (total_prompts as u64 * WRITE_MS_PER_PROMPT).clamp(WRITE_MIN_MS, WRITE_MAX_MS)
}

impl Game {
    /// Build a fresh round in the write phase with the generated assignments
    /// and deadline metadata. The deadline task is attached by the caller.
    pub fn new(
        assignments: IndexMap<Uuid, Vec<Prompt>>,
        write_ends_at_ms: u64,
        write_duration_ms: u64,
    ) -> Self {
        Self {
            phase: GamePhase::Write,
            write_ends_at_ms: Some(write_ends_at_ms),
            write_duration_ms: Some(write_duration_ms),
            assignments,
            clues: IndexMap::new(),
            guess_order: Vec::new(),
            current_index: 0,
            score: 0,
            max_score: 0,
            guess_value: INITIAL_GUESS,
            revealed: false,
            ready_voters: HashSet::new(),
            write_timer: None,
        }
    }

    /// Sum of all players' assignment counts for this round.
    pub fn total_prompts(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }

    /// Whether every assigned prompt has a collected clue.
    pub fn all_submitted(&self) -> bool {
        self.clues.len() >= self.total_prompts()
    }

    /// Prompt id the guess cursor currently points at, if any.
    pub fn current_prompt_id(&self) -> Option<Uuid> {
        self.guess_order.get(self.current_index).copied()
    }

    /// Clue of the prompt currently being guessed.
    pub fn current_clue(&self) -> Option<&Clue> {
        self.clues.get(&self.current_prompt_id()?)
    }

    /// Enter the guess phase: freeze a shuffled permutation of the collected
    /// clue ids, reset the cursor and score, and fix the round ceiling.
    pub fn start_guessing(&mut self) {
        let mut order: Vec<Uuid> = self.clues.keys().copied().collect();
        if order.len() > 1 {
            let mut rng = rand::rng();
            order.shuffle(&mut rng);
        }

        self.max_score = POINTS_PER_PROMPT * order.len() as u32;
        self.guess_order = order;
        self.current_index = 0;
        self.score = 0;
        self.phase = GamePhase::Guess;
        self.arm_current();
    }

    /// Reset the per-prompt negotiation state for the prompt under the cursor.
    pub fn arm_current(&mut self) {
        self.guess_value = INITIAL_GUESS;
        self.revealed = false;
        self.ready_voters.clear();
    }

    /// Disclose the current prompt: compute distance and points, add them to
    /// the running score, and mark the prompt revealed.
    ///
    /// Returns `None` when the cursor points past the end of the order.
    pub fn reveal_current(&mut self) -> Option<RevealOutcome> {
        let prompt_id = self.current_prompt_id()?;
        let clue = self.clues.get(&prompt_id)?;

        let distance = (i32::from(self.guess_value) - i32::from(clue.target)).unsigned_abs();
        let points = score_for_distance(distance);
        let target = clue.target;

        self.score += points;
        self.revealed = true;

        Some(RevealOutcome {
            prompt_id,
            target,
            guess_value: self.guess_value,
            distance,
            points,
            score: self.score,
        })
    }

    /// Abort the pending deadline task, if any.
    ///
    /// The deadline handler re-checks the phase on firing, so a task that
    /// slips past the abort is still a no-op.
    pub fn cancel_timer(&mut self) {
        if let Some(handle) = self.write_timer.take() {
            handle.abort();
        }
    }

    /// Drop the write-phase deadline metadata when leaving the phase.
    pub fn clear_write_deadline(&mut self) {
        self.cancel_timer();
        self.write_ends_at_ms = None;
        self.write_duration_ms = None;
    }
}
