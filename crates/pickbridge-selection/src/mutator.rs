//! Selection state transforms. Callers validate first.

use pickbridge_db::{PlayerId, SelectionState};

use crate::validator::Direction;

/// Insert into or remove from `actor`'s set. Other streamers' sets are untouched.
pub fn apply(
    mut state: SelectionState,
    actor: &str,
    player_id: PlayerId,
    direction: Direction,
) -> SelectionState {
    match direction {
        Direction::Add => {
            let set = state.set_mut(actor);
            if !set.contains(&player_id) {
                set.push(player_id);
            }
        }
        Direction::Remove => {
            state.set_mut(actor).retain(|id| *id != player_id);
            state.prune_empty();
        }
    }
    state
}

/// Remove `player_id` from every set. Returns the streamers that held it.
pub fn purge_player(state: &mut SelectionState, player_id: PlayerId) -> Vec<String> {
    let holders: Vec<String> = state
        .streamers()
        .filter(|(_, ids)| ids.contains(&player_id))
        .map(|(streamer, _)| streamer.to_string())
        .collect();

    for streamer in &holders {
        state.set_mut(streamer).retain(|id| *id != player_id);
    }
    state.prune_empty();
    holders
}

/// Remove a streamer's whole set. Returns the ids it held, in order.
pub fn drop_streamer(state: &mut SelectionState, streamer: &str) -> Vec<PlayerId> {
    state.take(streamer)
}
