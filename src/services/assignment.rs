use indexmap::IndexMap;
use rand::{Rng, seq::IndexedRandom};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    state::game::Prompt,
};

/// Lowest hidden target ever assigned.
const TARGET_MIN: u8 = 8;
/// Highest hidden target ever assigned.
const TARGET_MAX: u8 = 92;

/// Number of prompts each player writes for, by room size.
///
/// Small rooms write more so a round still has enough clues to guess.
pub fn prompts_per_player(player_count: usize) -> usize {
    if player_count <= 4 {
        3
    } else if player_count <= 7 {
        2
    } else {
        1
    }
}

/// Generate the round's writing assignments for every current player.
///
/// Each player receives distinct scales drawn uniformly without replacement
/// from the catalog (capped at the catalog size), paired with a uniform
/// random target in `[TARGET_MIN, TARGET_MAX]` and a freshly minted prompt
/// id. Prompt ids are UUIDs, collision-free for the process lifetime.
pub fn generate(
    config: &AppConfig,
    players: &IndexMap<Uuid, String>,
) -> IndexMap<Uuid, Vec<Prompt>> {
    let per_player = prompts_per_player(players.len());
    let mut rng = rand::rng();

    players
        .keys()
        .map(|participant| {
            let prompts = config
                .scales()
                .choose_multiple(&mut rng, per_player)
                .map(|scale| Prompt {
                    id: Uuid::new_v4(),
                    scale: scale.clone(),
                    target: rng.random_range(TARGET_MIN..=TARGET_MAX),
                })
                .collect();
            (*participant, prompts)
        })
        .collect()
}
