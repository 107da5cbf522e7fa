use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use tokio::{sync::Mutex, task::JoinHandle, time::sleep};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::events::{
        AssignmentsEvent, OverReason, RevealEvent, RoundOverEvent, ServerMessage,
    },
    error::ServiceError,
    services::{assignment, broadcast},
    state::{
        SharedState,
        game::{self, Clue, Game},
        room::Room,
        state_machine::{GameEvent, GamePhase},
    },
};

/// Normalize a raw room code the way the registry keys rooms.
pub fn normalize_room_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Add a participant to a room, creating the room on first reference.
///
/// The first participant to enter a fresh room becomes its host. Joining an
/// already-joined room updates the display name. The resulting snapshot is
/// broadcast to the whole room, and a joiner landing mid-guess additionally
/// receives the prompt currently being negotiated.
pub async fn join(
    state: &SharedState,
    participant: Uuid,
    raw_code: &str,
    name: &str,
) -> Result<(), ServiceError> {
    let code = normalize_room_code(raw_code);
    if code.is_empty() {
        return Err(ServiceError::InvalidInput("room code must not be empty".into()));
    }
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput("display name must not be empty".into()));
    }

    let room_arc = state.room_or_create(&code);
    let mut room = room_arc.lock().await;
    room.insert_player(participant, trimmed.to_string());
    info!(room = %code, id = %participant, name = %trimmed, "participant joined");

    broadcast::broadcast_room_state(state, &room);
    if room.phase() == GamePhase::Guess {
        if let Some(event) = broadcast::prompt_current_event(&room) {
            broadcast::send_to_participant(
                state,
                participant,
                &ServerMessage::PromptCurrent(event),
            );
        }
    }

    Ok(())
}

/// Remove a participant from every room containing them.
///
/// Host rooms fail over to the next player in join order; rooms left empty
/// are destroyed together with any pending deadline. During the write phase
/// the departed player's assignments (and the clues they had submitted for
/// them) are dropped; during the guess phase their ready vote is withdrawn
/// and the reveal threshold re-checked against the smaller roster.
pub async fn leave(state: &SharedState, participant: Uuid) {
    for (code, room_arc) in state.rooms_snapshot() {
        let mut room = room_arc.lock().await;
        if !room.remove_player(participant) {
            continue;
        }
        info!(room = %code, id = %participant, "participant left");

        scrub_departed(state, &mut room, participant);

        if room.players.is_empty() {
            if let Some(game) = room.game.as_mut() {
                game.cancel_timer();
            }
            drop(room);
            state.remove_room(&code);
            info!(room = %code, "empty room destroyed");
            continue;
        }

        broadcast::broadcast_room_state(state, &room);
    }
}

/// Host-only: start a round from the lobby.
pub async fn start(
    state: &SharedState,
    participant: Uuid,
    raw_code: &str,
) -> Result<(), ServiceError> {
    let room_arc = lookup(state, raw_code)?;
    let mut room = room_arc.lock().await;
    ensure_host(&room, participant)?;
    room.phase().apply(GameEvent::Start)?;

    begin_round(state, &mut room);
    Ok(())
}

/// Host-only: start a fresh round from the final score screen.
pub async fn restart(
    state: &SharedState,
    participant: Uuid,
    raw_code: &str,
) -> Result<(), ServiceError> {
    let room_arc = lookup(state, raw_code)?;
    let mut room = room_arc.lock().await;
    ensure_host(&room, participant)?;
    room.phase().apply(GameEvent::Restart)?;

    begin_round(state, &mut room);
    Ok(())
}

/// Host-only: discard the round and return the room to the lobby.
pub async fn to_lobby(
    state: &SharedState,
    participant: Uuid,
    raw_code: &str,
) -> Result<(), ServiceError> {
    let room_arc = lookup(state, raw_code)?;
    let mut room = room_arc.lock().await;
    ensure_host(&room, participant)?;
    room.phase().apply(GameEvent::Reset)?;

    if let Some(game) = room.game.as_mut() {
        game.cancel_timer();
    }
    room.game = None;
    info!(room = %room.code, "round discarded, back to lobby");

    broadcast::broadcast_phase_changed(state, &room);
    broadcast::broadcast_room_state(state, &room);
    Ok(())
}

/// Record a clue for one of the sender's assigned prompts.
///
/// Accepted only during the write phase. Resubmitting overwrites the stored
/// text; the clue map is keyed by prompt id, so progress counts stay exact.
/// Collecting the final missing clue closes the write phase early.
pub async fn submit_clue(
    state: &SharedState,
    participant: Uuid,
    raw_code: &str,
    prompt_id: Uuid,
    text: &str,
) -> Result<(), ServiceError> {
    let room_arc = lookup(state, raw_code)?;
    let mut room = room_arc.lock().await;

    let Some(author_name) = room.players.get(&participant).cloned() else {
        return Err(ServiceError::Unauthorized("sender is not in the room".into()));
    };
    if room.phase() != GamePhase::Write {
        return Err(ServiceError::InvalidState(
            "clues are only accepted during the write phase".into(),
        ));
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput("clue text must not be empty".into()));
    }

    let Some(game) = room.game.as_mut() else {
        return Err(ServiceError::InvalidState("no round is running".into()));
    };
    let Some(prompt) = game
        .assignments
        .get(&participant)
        .and_then(|prompts| prompts.iter().find(|prompt| prompt.id == prompt_id))
        .cloned()
    else {
        return Err(ServiceError::NotFound(format!(
            "prompt `{prompt_id}` is not assigned to the sender"
        )));
    };

    game.clues.insert(
        prompt_id,
        Clue {
            author_id: participant,
            author_name,
            scale: prompt.scale,
            target: prompt.target,
            text: trimmed.to_string(),
        },
    );
    let done = game.all_submitted();
    debug!(room = %room.code, id = %participant, prompt = %prompt_id, "clue recorded");

    broadcast::broadcast_room_state(state, &room);
    if done {
        close_writing(state, &mut room);
    }
    Ok(())
}

/// Move the shared estimate for the prompt currently being guessed.
pub async fn update_guess(
    state: &SharedState,
    participant: Uuid,
    raw_code: &str,
    prompt_id: Uuid,
    value: f64,
) -> Result<(), ServiceError> {
    let room_arc = lookup(state, raw_code)?;
    let mut room = room_arc.lock().await;
    guard_guess_action(&room, participant, prompt_id)?;

    if !value.is_finite() {
        return Err(ServiceError::InvalidInput(
            "guess value must be a finite number".into(),
        ));
    }
    let clamped = value.clamp(0.0, 100.0).round() as u8;

    let Some(game) = room.game.as_mut() else {
        return Err(ServiceError::InvalidState("no round is running".into()));
    };
    game.guess_value = clamped;

    broadcast::broadcast_to_room(
        state,
        &room,
        &ServerMessage::GuessUpdated {
            prompt_id,
            value: clamped,
            by: participant,
        },
    );
    maybe_reveal(state, &mut room);
    Ok(())
}

/// Accept the current shared estimate; enough votes force the reveal.
pub async fn ready(
    state: &SharedState,
    participant: Uuid,
    raw_code: &str,
    prompt_id: Uuid,
) -> Result<(), ServiceError> {
    let room_arc = lookup(state, raw_code)?;
    let mut room = room_arc.lock().await;
    guard_guess_action(&room, participant, prompt_id)?;

    let required = room.required_ready_count();
    let Some(game) = room.game.as_mut() else {
        return Err(ServiceError::InvalidState("no round is running".into()));
    };
    game.ready_voters.insert(participant);
    let votes = game.ready_voters.len();

    broadcast::broadcast_to_room(
        state,
        &room,
        &ServerMessage::ReadyTally {
            prompt_id,
            votes,
            required,
        },
    );
    maybe_reveal(state, &mut room);
    Ok(())
}

/// Host-only: move past a revealed prompt, ending the round after the last.
pub async fn advance(
    state: &SharedState,
    participant: Uuid,
    raw_code: &str,
) -> Result<(), ServiceError> {
    let room_arc = lookup(state, raw_code)?;
    let mut room = room_arc.lock().await;
    ensure_host(&room, participant)?;

    {
        let Some(game) = room.game.as_ref() else {
            return Err(ServiceError::InvalidState("no round is running".into()));
        };
        if game.phase != GamePhase::Guess {
            return Err(ServiceError::InvalidState(
                "advance is only valid during the guess phase".into(),
            ));
        }
        if !game.revealed {
            return Err(ServiceError::InvalidState(
                "the current prompt has not been revealed".into(),
            ));
        }
    }

    let Some(game) = room.game.as_mut() else {
        return Err(ServiceError::InvalidState("no round is running".into()));
    };
    game.current_index += 1;

    if game.current_index >= game.guess_order.len() {
        let Ok(next) = GamePhase::Guess.apply(GameEvent::RoundFinished) else {
            return Ok(());
        };
        game.phase = next;
        let over = RoundOverEvent {
            reason: OverReason::Finished,
            score: game.score,
            max_score: game.max_score,
        };
        info!(room = %room.code, score = over.score, max_score = over.max_score, "round finished");

        broadcast::broadcast_phase_changed(state, &room);
        broadcast::broadcast_to_room(state, &room, &ServerMessage::RoundOver(over));
        broadcast::broadcast_room_state(state, &room);
    } else {
        game.arm_current();
        broadcast::broadcast_prompt_current(state, &room);
        broadcast::broadcast_room_state(state, &room);
        maybe_reveal(state, &mut room);
    }
    Ok(())
}

/// Deadline handler armed when a round enters the write phase.
///
/// The all-submitted path may have closed the phase (and cancelled the
/// timer) between scheduling and firing; firing late must be a no-op, so the
/// phase is re-checked under the room lock before acting.
pub async fn write_deadline(state: &SharedState, code: &str) {
    let Some(room_arc) = state.room(code) else {
        return;
    };
    let mut room = room_arc.lock().await;
    if room.phase() != GamePhase::Write {
        return;
    }

    info!(room = %room.code, "write deadline fired");
    close_writing(state, &mut room);
}

fn lookup(state: &SharedState, raw_code: &str) -> Result<Arc<Mutex<Room>>, ServiceError> {
    let code = normalize_room_code(raw_code);
    state
        .room(&code)
        .ok_or_else(|| ServiceError::NotFound(format!("room `{code}` not found")))
}

fn ensure_host(room: &Room, participant: Uuid) -> Result<(), ServiceError> {
    if room.is_host(participant) {
        return Ok(());
    }
    Err(ServiceError::Unauthorized(format!(
        "participant `{participant}` is not the host of `{}`",
        room.code
    )))
}

/// Shared guards for guess-phase actions: membership, phase, cursor match,
/// not-yet-revealed, and the author lockout for the current prompt.
fn guard_guess_action(
    room: &Room,
    participant: Uuid,
    prompt_id: Uuid,
) -> Result<(), ServiceError> {
    if !room.players.contains_key(&participant) {
        return Err(ServiceError::Unauthorized("sender is not in the room".into()));
    }
    let Some(game) = room.game.as_ref() else {
        return Err(ServiceError::InvalidState("no round is running".into()));
    };
    if game.phase != GamePhase::Guess {
        return Err(ServiceError::InvalidState(
            "guess actions are only accepted during the guess phase".into(),
        ));
    }
    if game.current_prompt_id() != Some(prompt_id) {
        return Err(ServiceError::StalePrompt(prompt_id));
    }
    if game.revealed {
        return Err(ServiceError::InvalidState(
            "the current prompt has already been revealed".into(),
        ));
    }
    if game
        .current_clue()
        .is_some_and(|clue| clue.author_id == participant)
    {
        return Err(ServiceError::Unauthorized(
            "the author cannot act on their own prompt".into(),
        ));
    }
    Ok(())
}

/// Generate assignments, arm the deadline, and enter the write phase.
///
/// Shared by the initial start and the restart edge; a superseded game has
/// its timer cancelled before being replaced.
fn begin_round(state: &SharedState, room: &mut Room) {
    let assignments = assignment::generate(state.config(), &room.players);
    let total: usize = assignments.values().map(Vec::len).sum();
    let duration_ms = game::write_duration_ms(total);
    let ends_at_ms = unix_now_ms() + duration_ms;

    if let Some(old) = room.game.as_mut() {
        old.cancel_timer();
    }

    let mut game = Game::new(assignments, ends_at_ms, duration_ms);
    game.write_timer = Some(spawn_write_timer(
        Arc::clone(state),
        room.code.clone(),
        duration_ms,
    ));
    room.game = Some(game);

    info!(room = %room.code, prompts = total, duration_ms, "round started, writing phase armed");
    broadcast::broadcast_phase_changed(state, room);
    broadcast::broadcast_room_state(state, room);
    send_private_assignments(state, room);
}

/// Deliver each player's assignment list privately; targets stay hidden from
/// the rest of the room until reveal.
fn send_private_assignments(state: &SharedState, room: &Room) {
    let Some(game) = room.game.as_ref() else {
        return;
    };
    for (participant, prompts) in &game.assignments {
        let message = ServerMessage::Assignments(AssignmentsEvent {
            prompts: prompts.iter().map(Into::into).collect(),
        });
        broadcast::send_to_participant(state, *participant, &message);
    }
}

/// Close the write phase: the single convergence point for the deadline
/// firing and the all-submitted early completion.
///
/// With zero collected clues the round short-circuits straight to `Over`
/// with the distinguished `no_clues` reason; otherwise guessing starts over
/// a shuffled permutation of the clue ids.
fn close_writing(state: &SharedState, room: &mut Room) {
    let Some(game) = room.game.as_mut() else {
        return;
    };
    if game.phase != GamePhase::Write {
        return;
    }
    game.clear_write_deadline();

    if game.clues.is_empty() {
        let Ok(next) = GamePhase::Write.apply(GameEvent::WriteEmpty) else {
            return;
        };
        game.phase = next;
        info!(room = %room.code, "write phase ended with no clues");

        broadcast::broadcast_phase_changed(state, room);
        broadcast::broadcast_to_room(
            state,
            room,
            &ServerMessage::RoundOver(RoundOverEvent {
                reason: OverReason::NoClues,
                score: 0,
                max_score: 0,
            }),
        );
        broadcast::broadcast_room_state(state, room);
        return;
    }

    game.start_guessing();
    let clues = game.guess_order.len();
    let max_score = game.max_score;
    info!(room = %room.code, clues, max_score, "guessing started");

    broadcast::broadcast_phase_changed(state, room);
    broadcast::broadcast_room_state(state, room);
    broadcast::broadcast_prompt_current(state, room);
    maybe_reveal(state, room);
}

/// Reveal the current prompt once the vote threshold is met.
///
/// Called after every mutating guess-phase event, after arming a prompt (a
/// solo room needs zero votes and reveals immediately), and after a
/// departure shrinks the roster.
fn maybe_reveal(state: &SharedState, room: &mut Room) {
    let required = room.required_ready_count();
    let Some(game) = room.game.as_mut() else {
        return;
    };
    if game.phase != GamePhase::Guess || game.revealed {
        return;
    }
    if game.ready_voters.len() < required {
        return;
    }
    let Some(outcome) = game.reveal_current() else {
        return;
    };
    let max_score = game.max_score;

    let message = ServerMessage::PromptRevealed(RevealEvent {
        prompt_id: outcome.prompt_id,
        target: outcome.target,
        guess_value: outcome.guess_value,
        distance: outcome.distance,
        points: outcome.points,
        score: outcome.score,
        max_score,
    });
    info!(
        room = %room.code,
        prompt = %outcome.prompt_id,
        distance = outcome.distance,
        points = outcome.points,
        "prompt revealed"
    );
    broadcast::broadcast_to_room(state, room, &message);
}

/// Drop round state that belonged to a departed participant.
fn scrub_departed(state: &SharedState, room: &mut Room, participant: Uuid) {
    {
        let Some(game) = room.game.as_mut() else {
            return;
        };
        match game.phase {
            GamePhase::Write => {
                if let Some(prompts) = game.assignments.shift_remove(&participant) {
                    for prompt in &prompts {
                        game.clues.shift_remove(&prompt.id);
                    }
                }
            }
            GamePhase::Guess => {
                game.ready_voters.remove(&participant);
            }
            _ => {}
        }
    }

    // A smaller roster can leave an already-met threshold behind.
    if room.phase() == GamePhase::Guess {
        maybe_reveal(state, room);
    }
}

fn spawn_write_timer(state: SharedState, code: String, duration_ms: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(Duration::from_millis(duration_ms)).await;
        write_deadline(&state, &code).await;
    })
}

fn unix_now_ms() -> u64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    (nanos / 1_000_000).max(0) as u64
}
