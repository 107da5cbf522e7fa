//! End-to-end engine flows driven through the service layer, without sockets.
//!
//! No WebSocket connections are registered, so broadcasts fan out to nobody;
//! every assertion reads the room state directly.

use std::collections::HashMap;

use mindscale_back::{
    config::AppConfig,
    services::room_service,
    state::{
        AppState, SharedState,
        game::score_for_distance,
        room::Room,
        state_machine::{FinishReason, GamePhase},
    },
};
use uuid::Uuid;

const CODE: &str = "ABCD";

fn fresh_state() -> SharedState {
    AppState::new(AppConfig::default())
}

async fn join_players(state: &SharedState, count: usize) -> Vec<Uuid> {
    let mut ids = Vec::with_capacity(count);
    for index in 0..count {
        let id = Uuid::new_v4();
        room_service::join(state, id, "abcd", &format!("player-{index}"))
            .await
            .unwrap();
        ids.push(id);
    }
    ids
}

async fn read_room<T>(state: &SharedState, f: impl FnOnce(&Room) -> T) -> T {
    let room_arc = state.room(CODE).expect("room should exist");
    let room = room_arc.lock().await;
    f(&room)
}

/// Prompt ids per player, in assignment order.
async fn assignment_ids(state: &SharedState) -> HashMap<Uuid, Vec<Uuid>> {
    read_room(state, |room| {
        let game = room.game.as_ref().expect("round should be running");
        game.assignments
            .iter()
            .map(|(player, prompts)| (*player, prompts.iter().map(|p| p.id).collect()))
            .collect()
    })
    .await
}

async fn submit_all_clues(state: &SharedState, players: &[Uuid]) {
    let assignments = assignment_ids(state).await;
    for player in players {
        for prompt_id in &assignments[player] {
            room_service::submit_clue(state, *player, CODE, *prompt_id, "somewhere in between")
                .await
                .unwrap();
        }
    }
}

/// Author and hidden target of the prompt currently being guessed.
async fn current_prompt(state: &SharedState) -> (Uuid, Uuid, u8) {
    read_room(state, |room| {
        let game = room.game.as_ref().expect("round should be running");
        let prompt_id = game.current_prompt_id().expect("cursor should be in range");
        let clue = game.current_clue().expect("current prompt should have a clue");
        (prompt_id, clue.author_id, clue.target)
    })
    .await
}

#[tokio::test]
async fn first_joiner_hosts_and_codes_are_normalized() {
    let state = fresh_state();
    let players = join_players(&state, 2).await;

    // joined with lowercase "abcd"; the registry keys the uppercase form
    assert!(state.room("ABCD").is_some());
    assert!(state.room("abcd").is_none());

    read_room(&state, |room| {
        assert_eq!(room.phase(), GamePhase::Lobby);
        assert_eq!(room.host_id, Some(players[0]));
        assert_eq!(room.players.len(), 2);
    })
    .await;
}

#[tokio::test]
async fn full_round_with_three_players_sums_awarded_points() {
    let state = fresh_state();
    let players = join_players(&state, 3).await;
    let host = players[0];

    room_service::start(&state, host, CODE).await.unwrap();

    read_room(&state, |room| {
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.phase, GamePhase::Write);
        assert_eq!(game.assignments.len(), 3);
        assert_eq!(game.total_prompts(), 9);
        assert_eq!(game.write_duration_ms, Some(405_000));
        assert!(game.write_timer.is_some());
    })
    .await;

    submit_all_clues(&state, &players).await;

    // All submitted before the deadline: straight to guessing.
    read_room(&state, |room| {
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.phase, GamePhase::Guess);
        assert_eq!(game.guess_order.len(), 9);
        assert_eq!(game.max_score, 36);
        assert!(game.write_timer.is_none());
        assert!(game.write_ends_at_ms.is_none());

        let mut ordered: Vec<Uuid> = game.guess_order.clone();
        let mut expected: Vec<Uuid> = game.clues.keys().copied().collect();
        ordered.sort();
        expected.sort();
        assert_eq!(ordered, expected, "guess order must permute the clue keys");
    })
    .await;

    let mut expected_total = 0;
    for _ in 0..9 {
        let (prompt_id, author, target) = current_prompt(&state).await;
        let voters: Vec<Uuid> = players.iter().copied().filter(|p| *p != author).collect();

        // Park the shared estimate four away from the target: 3 points.
        let estimate = if target > 50 { target - 4 } else { target + 4 };
        room_service::update_guess(&state, voters[0], CODE, prompt_id, f64::from(estimate))
            .await
            .unwrap();
        expected_total += score_for_distance(4);

        for voter in &voters {
            room_service::ready(&state, *voter, CODE, prompt_id).await.unwrap();
        }

        read_room(&state, |room| {
            let game = room.game.as_ref().unwrap();
            assert!(game.revealed, "two non-author votes must reveal");
            assert_eq!(game.score, expected_total);
        })
        .await;

        room_service::advance(&state, host, CODE).await.unwrap();
    }

    read_room(&state, |room| {
        assert_eq!(room.phase(), GamePhase::Over(FinishReason::Finished));
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.score, expected_total);
        assert_eq!(game.score, 27);
        assert_eq!(game.max_score, 36);
    })
    .await;
}

#[tokio::test]
async fn deadline_with_zero_clues_short_circuits_to_over() {
    let state = fresh_state();
    let players = join_players(&state, 2).await;
    room_service::start(&state, players[0], CODE).await.unwrap();

    // Simulate the countdown firing with nothing submitted.
    room_service::write_deadline(&state, CODE).await;

    read_room(&state, |room| {
        assert_eq!(room.phase(), GamePhase::Over(FinishReason::NoClues));
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.score, 0);
        assert_eq!(game.max_score, 0);
        assert!(game.guess_order.is_empty());
        assert!(game.write_timer.is_none());
    })
    .await;
}

#[tokio::test]
async fn late_deadline_fire_after_early_completion_is_a_no_op() {
    let state = fresh_state();
    let players = join_players(&state, 2).await;
    room_service::start(&state, players[0], CODE).await.unwrap();
    submit_all_clues(&state, &players).await;

    let before = read_room(&state, |room| {
        let game = room.game.as_ref().unwrap();
        (game.phase, game.current_index, game.guess_order.clone())
    })
    .await;
    assert_eq!(before.0, GamePhase::Guess);

    // The scheduled task is not guaranteed cancelled before it fires.
    room_service::write_deadline(&state, CODE).await;

    read_room(&state, |room| {
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.phase, before.0);
        assert_eq!(game.current_index, before.1);
        assert_eq!(game.guess_order, before.2);
    })
    .await;
}

#[tokio::test]
async fn two_player_room_reveals_on_the_single_non_author_vote() {
    let state = fresh_state();
    let players = join_players(&state, 2).await;
    room_service::start(&state, players[0], CODE).await.unwrap();
    submit_all_clues(&state, &players).await;

    let (prompt_id, author, target) = current_prompt(&state).await;
    let voter = players.iter().copied().find(|p| *p != author).unwrap();

    room_service::update_guess(&state, voter, CODE, prompt_id, f64::from(target))
        .await
        .unwrap();
    read_room(&state, |room| {
        let game = room.game.as_ref().unwrap();
        assert!(!game.revealed, "an update alone must not reveal");
        assert_eq!(game.guess_value, target);
    })
    .await;

    room_service::ready(&state, voter, CODE, prompt_id).await.unwrap();
    read_room(&state, |room| {
        let game = room.game.as_ref().unwrap();
        assert!(game.revealed);
        assert_eq!(game.score, 4, "exact estimate scores the full 4 points");
    })
    .await;
}

#[tokio::test]
async fn solo_room_auto_reveals_every_prompt() {
    let state = fresh_state();
    let players = join_players(&state, 1).await;
    let solo = players[0];

    room_service::start(&state, solo, CODE).await.unwrap();
    submit_all_clues(&state, &players).await;

    let mut expected_total = 0;
    for index in 0..3 {
        let points = read_room(&state, |room| {
            let game = room.game.as_ref().unwrap();
            assert_eq!(game.current_index, index);
            assert!(game.revealed, "required count 0 must reveal on arming");
            let clue = game.current_clue().unwrap();
            score_for_distance(u32::from(clue.target.abs_diff(game.guess_value)))
        })
        .await;
        expected_total += points;

        room_service::advance(&state, solo, CODE).await.unwrap();
    }

    read_room(&state, |room| {
        assert_eq!(room.phase(), GamePhase::Over(FinishReason::Finished));
        assert_eq!(room.game.as_ref().unwrap().score, expected_total);
    })
    .await;
}

#[tokio::test]
async fn write_phase_departure_removes_exactly_their_prompts() {
    let state = fresh_state();
    let players = join_players(&state, 3).await;
    room_service::start(&state, players[0], CODE).await.unwrap();

    let assignments = assignment_ids(&state).await;
    let keeper_prompt = assignments[&players[0]][0];
    let leaver_prompt = assignments[&players[1]][0];

    room_service::submit_clue(&state, players[0], CODE, keeper_prompt, "stays")
        .await
        .unwrap();
    room_service::submit_clue(&state, players[1], CODE, leaver_prompt, "goes")
        .await
        .unwrap();

    room_service::leave(&state, players[1]).await;

    read_room(&state, |room| {
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.phase, GamePhase::Write);
        assert!(!game.assignments.contains_key(&players[1]));
        assert_eq!(game.total_prompts(), 6);
        assert!(game.clues.contains_key(&keeper_prompt), "other clues survive");
        assert!(!game.clues.contains_key(&leaver_prompt));
        assert_eq!(game.clues.len(), 1);
    })
    .await;
}

#[tokio::test]
async fn guess_phase_departure_can_complete_the_threshold() {
    let state = fresh_state();
    let players = join_players(&state, 3).await;
    room_service::start(&state, players[0], CODE).await.unwrap();
    submit_all_clues(&state, &players).await;

    let (prompt_id, author, _) = current_prompt(&state).await;
    let voters: Vec<Uuid> = players.iter().copied().filter(|p| *p != author).collect();

    room_service::ready(&state, voters[0], CODE, prompt_id).await.unwrap();
    read_room(&state, |room| {
        assert!(!room.game.as_ref().unwrap().revealed, "one of two votes");
    })
    .await;

    // The silent voter disconnecting drops the requirement to one.
    room_service::leave(&state, voters[1]).await;
    read_room(&state, |room| {
        assert!(room.game.as_ref().unwrap().revealed);
    })
    .await;
}

#[tokio::test]
async fn host_passes_in_join_order_and_empty_rooms_are_destroyed() {
    let state = fresh_state();
    let players = join_players(&state, 3).await;

    room_service::leave(&state, players[0]).await;
    read_room(&state, |room| {
        assert_eq!(room.host_id, Some(players[1]));
        assert_eq!(room.players.len(), 2);
    })
    .await;

    room_service::leave(&state, players[1]).await;
    room_service::leave(&state, players[2]).await;
    assert!(state.room(CODE).is_none());
    assert_eq!(state.room_count(), 0);
}

#[tokio::test]
async fn rejected_actions_leave_the_state_untouched() {
    let state = fresh_state();
    let players = join_players(&state, 3).await;
    let outsider = Uuid::new_v4();

    // Privileged actions from a non-host are discarded.
    assert!(room_service::start(&state, players[1], CODE).await.is_err());
    read_room(&state, |room| assert_eq!(room.phase(), GamePhase::Lobby)).await;

    room_service::start(&state, players[0], CODE).await.unwrap();

    // Guess actions during the write phase are discarded.
    let any_prompt = assignment_ids(&state).await[&players[0]][0];
    assert!(
        room_service::ready(&state, players[1], CODE, any_prompt)
            .await
            .is_err()
    );

    // Submitting someone else's prompt is discarded.
    assert!(
        room_service::submit_clue(&state, players[1], CODE, any_prompt, "not mine")
            .await
            .is_err()
    );

    submit_all_clues(&state, &players).await;
    let (prompt_id, author, _) = current_prompt(&state).await;
    let voter = players.iter().copied().find(|p| *p != author).unwrap();

    // Stale prompt id, author self-vote, outsider vote, late clue: all discarded.
    assert!(
        room_service::ready(&state, voter, CODE, Uuid::new_v4())
            .await
            .is_err()
    );
    assert!(room_service::ready(&state, author, CODE, prompt_id).await.is_err());
    assert!(room_service::ready(&state, outsider, CODE, prompt_id).await.is_err());
    assert!(
        room_service::submit_clue(&state, author, CODE, prompt_id, "too late")
            .await
            .is_err()
    );
    assert!(
        room_service::update_guess(&state, voter, CODE, prompt_id, f64::NAN)
            .await
            .is_err()
    );

    // Advance before reveal and restart mid-guess are invalid transitions.
    assert!(room_service::advance(&state, players[0], CODE).await.is_err());
    assert!(room_service::restart(&state, players[0], CODE).await.is_err());

    read_room(&state, |room| {
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.phase, GamePhase::Guess);
        assert_eq!(game.score, 0);
        assert!(game.ready_voters.is_empty());
        assert!(!game.revealed);
    })
    .await;
}

#[tokio::test]
async fn guess_values_are_clamped_into_range() {
    let state = fresh_state();
    let players = join_players(&state, 2).await;
    room_service::start(&state, players[0], CODE).await.unwrap();
    submit_all_clues(&state, &players).await;

    let (prompt_id, author, _) = current_prompt(&state).await;
    let voter = players.iter().copied().find(|p| *p != author).unwrap();

    room_service::update_guess(&state, voter, CODE, prompt_id, 250.0)
        .await
        .unwrap();
    read_room(&state, |room| {
        assert_eq!(room.game.as_ref().unwrap().guess_value, 100);
    })
    .await;

    room_service::update_guess(&state, voter, CODE, prompt_id, -31.4)
        .await
        .unwrap();
    read_room(&state, |room| {
        assert_eq!(room.game.as_ref().unwrap().guess_value, 0);
    })
    .await;
}

#[tokio::test]
async fn to_lobby_discards_the_round_and_allows_a_fresh_start() {
    let state = fresh_state();
    let players = join_players(&state, 2).await;
    room_service::start(&state, players[0], CODE).await.unwrap();

    room_service::to_lobby(&state, players[0], CODE).await.unwrap();
    read_room(&state, |room| {
        assert_eq!(room.phase(), GamePhase::Lobby);
        assert!(room.game.is_none());
    })
    .await;

    room_service::start(&state, players[0], CODE).await.unwrap();
    read_room(&state, |room| {
        assert_eq!(room.phase(), GamePhase::Write);
    })
    .await;
}

#[tokio::test]
async fn restart_from_over_mints_fresh_prompts() {
    let state = fresh_state();
    let players = join_players(&state, 2).await;
    room_service::start(&state, players[0], CODE).await.unwrap();

    let first_round: Vec<Uuid> = assignment_ids(&state)
        .await
        .into_values()
        .flatten()
        .collect();

    room_service::write_deadline(&state, CODE).await;
    read_room(&state, |room| {
        assert_eq!(room.phase(), GamePhase::Over(FinishReason::NoClues));
    })
    .await;

    room_service::restart(&state, players[0], CODE).await.unwrap();
    read_room(&state, |room| {
        let game = room.game.as_ref().unwrap();
        assert_eq!(game.phase, GamePhase::Write);
        assert!(game.clues.is_empty());
        assert_eq!(game.score, 0);

        let reused = game
            .assignments
            .values()
            .flatten()
            .any(|prompt| first_round.contains(&prompt.id));
        assert!(!reused, "prompt ids are never reused across rounds");
    })
    .await;
}
