//! Exclusivity & capacity rules.
//!
//! Pure: decides whether a proposed change is legal against one document
//! snapshot. Exclusivity is enforced here only; the mutator trusts the
//! verdict, so validate and apply must see the same snapshot.

use pickbridge_db::{Document, PlayerId};
use pickbridge_plugin::PluginAction;
use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Add,
    Remove,
}

impl From<Direction> for PluginAction {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Add => PluginAction::Add,
            Direction::Remove => PluginAction::Remove,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Add => "add",
            Direction::Remove => "remove",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Legal and changes state.
    Apply,
    /// Legal no-op: removing an unselected player, re-adding a held one while under the limit.
    Unchanged,
}

pub fn validate(
    doc: &Document,
    actor: &str,
    player_id: PlayerId,
    direction: Direction,
) -> Result<Verdict, SelectionError> {
    let selections = &doc.selections;

    match direction {
        Direction::Remove => Ok(if selections.contains(actor, player_id) {
            Verdict::Apply
        } else {
            Verdict::Unchanged
        }),
        Direction::Add => {
            if doc.player(player_id).is_none() {
                return Err(SelectionError::NotFound(format!("player {player_id}")));
            }
            let held = selections.of(actor).len();
            let limit = doc.settings.selection_limit;
            if held >= limit as usize {
                return Err(SelectionError::LimitExceeded {
                    streamer: actor.to_string(),
                    held,
                    limit,
                });
            }

            if selections.contains(actor, player_id) {
                return Ok(Verdict::Unchanged);
            }

            if let Some(holder) = selections.holder_of(player_id) {
                return Err(SelectionError::AlreadyClaimed {
                    player_id,
                    holder: holder.to_string(),
                });
            }

            Ok(Verdict::Apply)
        }
    }
}
