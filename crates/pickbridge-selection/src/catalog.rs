//! Player pool and tag catalog.
//!
//! Pool edits go through the same write lock as selection changes so a
//! deleted player can never be claimed in between.

use pickbridge_db::{Document, Player, PlayerId, DEFAULT_PLAYER_COLOR};
use pickbridge_plugin::{ActionNotification, PluginAction};
use serde::Deserialize;

use crate::coordinator::{Change, Coordinator};
use crate::error::SelectionError;
use crate::mutator;

const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerPatch {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub color: Option<String>,
}

fn clean_name(raw: &str, what: &str) -> Result<String, SelectionError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(SelectionError::InvalidInput(format!("{what} must not be empty")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(SelectionError::InvalidInput(format!(
            "{what} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn clean_tags(raw: Vec<String>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// `#rgb` or `#rrggbb`. Blank falls back to the default color.
fn clean_color(raw: Option<String>) -> Result<String, SelectionError> {
    let Some(color) = raw.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) else {
        return Ok(DEFAULT_PLAYER_COLOR.to_string());
    };
    let hex = color.strip_prefix('#').unwrap_or("");
    if matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(color.to_ascii_lowercase())
    } else {
        Err(SelectionError::InvalidInput(format!(
            "color '{color}' is not a #rgb or #rrggbb value"
        )))
    }
}

/// Millisecond wall clock, bumped past the largest id already in use.
/// `None` once the id space above the largest id is exhausted.
pub(crate) fn next_player_id(doc: &Document, now_ms: i64) -> Option<PlayerId> {
    match doc.players.iter().map(|p| p.id).max() {
        Some(max_existing) => max_existing.checked_add(1).map(|next| now_ms.max(next)),
        None => Some(now_ms.max(1)),
    }
}

impl Coordinator {
    pub async fn list_players(&self) -> Result<Vec<Player>, SelectionError> {
        Ok(self.snapshot().await?.players)
    }

    pub async fn get_player(&self, id: PlayerId) -> Result<Player, SelectionError> {
        self.snapshot()
            .await?
            .player(id)
            .cloned()
            .ok_or_else(|| SelectionError::NotFound(format!("player {id}")))
    }

    pub async fn create_player(&self, new: NewPlayer) -> Result<Player, SelectionError> {
        let name = clean_name(&new.name, "player name")?;
        let tags = clean_tags(new.tags);
        let color = clean_color(new.color)?;
        let now_ms = chrono::Utc::now().timestamp_millis();

        let player = self
            .commit(move |doc| {
                let id = next_player_id(doc, now_ms)
                    .filter(|id| doc.player(*id).is_none())
                    .ok_or_else(|| {
                        SelectionError::AlreadyExists("no free player id left".to_string())
                    })?;
                let player = Player {
                    id,
                    name,
                    tags,
                    color,
                };
                doc.players.push(player.clone());
                Ok(Change::write(player))
            })
            .await?;

        tracing::info!(player_id = player.id, name = %player.name, "player created");
        Ok(player)
    }

    /// Apply `patch` to a player. Renaming a selected player re-announces it
    /// to the plugin under the new name.
    pub async fn update_player(
        &self,
        id: PlayerId,
        patch: PlayerPatch,
    ) -> Result<Player, SelectionError> {
        let name = patch
            .name
            .as_deref()
            .map(|n| clean_name(n, "player name"))
            .transpose()?;
        let tags = patch.tags.map(clean_tags);
        let color = match patch.color {
            Some(c) => Some(clean_color(Some(c))?),
            None => None,
        };

        let player = self
            .commit(move |doc| {
                let holder = doc.selections.holder_of(id).map(str::to_string);
                let player = doc
                    .player_mut(id)
                    .ok_or_else(|| SelectionError::NotFound(format!("player {id}")))?;

                let old_name = player.name.clone();
                if let Some(name) = name {
                    player.name = name;
                }
                if let Some(tags) = tags {
                    player.tags = tags;
                }
                if let Some(color) = color {
                    player.color = color;
                }
                let updated = player.clone();

                let mut change = Change::write(updated.clone());
                if let Some(streamer) = holder.filter(|_| old_name != updated.name) {
                    change = change.notify_all([
                        ActionNotification::new(id, old_name, &streamer, PluginAction::Remove),
                        ActionNotification::new(id, &updated.name, &streamer, PluginAction::Add),
                    ]);
                }
                Ok(change)
            })
            .await?;

        tracing::info!(player_id = id, name = %player.name, "player updated");
        Ok(player)
    }

    /// Remove a player from the pool and from whichever set held it.
    pub async fn delete_player(&self, id: PlayerId) -> Result<Player, SelectionError> {
        let (removed, holders) = self
            .commit(|doc| {
                let idx = doc
                    .players
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or_else(|| SelectionError::NotFound(format!("player {id}")))?;
                let removed = doc.players.remove(idx);
                let holders = mutator::purge_player(&mut doc.selections, id);

                let notifications: Vec<ActionNotification> = holders
                    .iter()
                    .map(|s| ActionNotification::new(id, &removed.name, s, PluginAction::Remove))
                    .collect();
                Ok(Change::write((removed, holders)).notify_all(notifications))
            })
            .await?;

        tracing::info!(
            player_id = id,
            name = %removed.name,
            released_from = ?holders,
            "player deleted"
        );
        Ok(removed)
    }

    // ─── Tags ───────────────────────────────────────────────────────

    pub async fn list_tags(&self) -> Result<Vec<String>, SelectionError> {
        Ok(self.snapshot().await?.tags)
    }

    /// Add a tag to the catalog. Adding an existing tag is a no-op.
    pub async fn add_tag(&self, name: &str) -> Result<Vec<String>, SelectionError> {
        let tag = clean_name(name, "tag")?;
        self.commit(move |doc| {
            if doc.tags.contains(&tag) {
                return Ok(Change::unchanged(doc.tags.clone()));
            }
            tracing::info!(tag = %tag, "tag added");
            doc.tags.push(tag);
            Ok(Change::write(doc.tags.clone()))
        })
        .await
    }

    /// Remove a tag from the catalog and strip it from every player.
    pub async fn remove_tag(&self, name: &str) -> Result<Vec<String>, SelectionError> {
        let tag = name.trim().to_string();
        self.commit(move |doc| {
            let before = doc.tags.len();
            doc.tags.retain(|t| *t != tag);
            if doc.tags.len() == before {
                return Err(SelectionError::NotFound(format!("tag {tag}")));
            }
            for player in &mut doc.players {
                player.tags.retain(|t| *t != tag);
            }
            tracing::info!(tag = %tag, "tag removed");
            Ok(Change::write(doc.tags.clone()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pickbridge_db::{MemoryStore, Role, StateStore, UserRecord};
    use pickbridge_plugin::{DeliveryLog, DeliveryOutcome, PluginNotifier};
    use std::sync::{Arc, Mutex};

    use crate::coordinator::Principal;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, String, PluginAction)>>);

    #[async_trait]
    impl PluginNotifier for Recorder {
        async fn notify(&self, n: &ActionNotification) -> DeliveryOutcome {
            self.0
                .lock()
                .unwrap()
                .push((n.streamer.clone(), n.player_name.clone(), n.action));
            DeliveryOutcome::Delivered
        }
    }

    fn setup() -> (Coordinator, Arc<Recorder>, Arc<dyn StateStore>) {
        let mut doc = Document::with_limit(5);
        doc.users.push(UserRecord {
            username: "nova".into(),
            password_hash: String::new(),
            role: Role::Streamer,
        });
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new(doc));
        let recorder = Arc::new(Recorder::default());
        let c = Coordinator::new(store.clone(), recorder.clone(), Arc::new(DeliveryLog::new(20)));
        (c, recorder, store)
    }

    fn new_player(name: &str) -> NewPlayer {
        NewPlayer {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn next_id_follows_clock_but_never_repeats() {
        let mut doc = Document::default();
        assert_eq!(next_player_id(&doc, 1_000), Some(1_000));

        doc.players.push(Player {
            id: 5_000,
            name: "x".into(),
            tags: Vec::new(),
            color: DEFAULT_PLAYER_COLOR.into(),
        });
        assert_eq!(next_player_id(&doc, 1_000), Some(5_001));
        assert_eq!(next_player_id(&doc, 5_000), Some(5_001));
    }

    #[test]
    fn next_id_is_none_past_largest_id() {
        let mut doc = Document::default();
        doc.players.push(Player {
            id: i64::MAX,
            name: "x".into(),
            tags: Vec::new(),
            color: DEFAULT_PLAYER_COLOR.into(),
        });
        assert_eq!(next_player_id(&doc, 1_000), None);
    }

    #[test]
    fn color_validation() {
        assert_eq!(clean_color(None).unwrap(), DEFAULT_PLAYER_COLOR);
        assert_eq!(clean_color(Some("  ".into())).unwrap(), DEFAULT_PLAYER_COLOR);
        assert_eq!(clean_color(Some("#FF0000".into())).unwrap(), "#ff0000");
        assert_eq!(clean_color(Some("#abc".into())).unwrap(), "#abc");
        assert!(clean_color(Some("red".into())).is_err());
        assert!(clean_color(Some("#12345".into())).is_err());
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = clean_tags(vec![" pvp ".into(), "pvp".into(), "".into(), "build".into()]);
        assert_eq!(tags, vec!["pvp".to_string(), "build".to_string()]);
    }

    #[tokio::test]
    async fn create_player_assigns_unique_ids_and_defaults() {
        let (c, _, _) = setup();
        let a = c.create_player(new_player("Steve")).await.unwrap();
        let b = c.create_player(new_player("Alex")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert!(b.id > a.id);
        assert_eq!(a.color, DEFAULT_PLAYER_COLOR);
        assert_eq!(c.list_players().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_player_rejects_exhausted_id_space() {
        let (c, _, store) = setup();
        let mut doc = store.read().await.unwrap();
        doc.players.push(Player {
            id: i64::MAX,
            name: "Edited".into(),
            tags: Vec::new(),
            color: DEFAULT_PLAYER_COLOR.into(),
        });
        store.write(&doc).await.unwrap();

        let err = c.create_player(new_player("Steve")).await.unwrap_err();
        assert!(matches!(err, SelectionError::AlreadyExists(_)));
        assert_eq!(c.list_players().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_player_rejects_blank_name() {
        let (c, _, _) = setup();
        let err = c.create_player(new_player("   ")).await.unwrap_err();
        assert!(matches!(err, SelectionError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn delete_selected_player_releases_and_notifies() {
        let (c, recorder, store) = setup();
        let p = c.create_player(new_player("Steve")).await.unwrap();
        c.toggle_self(&Principal::new("nova", Role::Streamer), p.id)
            .await
            .unwrap();

        c.delete_player(p.id).await.unwrap();
        c.flush_notifications().await;

        let doc = store.read().await.unwrap();
        assert!(doc.players.is_empty());
        assert_eq!(doc.selections.total(), 0);
        assert_eq!(
            recorder.0.lock().unwrap().last().cloned(),
            Some(("nova".into(), "Steve".into(), PluginAction::Remove))
        );
    }

    #[tokio::test]
    async fn delete_unknown_player_is_not_found() {
        let (c, _, _) = setup();
        assert!(matches!(
            c.delete_player(7).await.unwrap_err(),
            SelectionError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn renaming_selected_player_re_announces_it() {
        let (c, recorder, _) = setup();
        let p = c.create_player(new_player("Steve")).await.unwrap();
        c.toggle_self(&Principal::new("nova", Role::Streamer), p.id)
            .await
            .unwrap();

        let updated = c
            .update_player(
                p.id,
                PlayerPatch {
                    name: Some("Steve2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Steve2");
        c.flush_notifications().await;

        let seen = recorder.0.lock().unwrap().clone();
        assert_eq!(
            &seen[1..],
            &[
                ("nova".to_string(), "Steve".to_string(), PluginAction::Remove),
                ("nova".to_string(), "Steve2".to_string(), PluginAction::Add),
            ]
        );
    }

    #[tokio::test]
    async fn recoloring_does_not_notify() {
        let (c, recorder, _) = setup();
        let p = c.create_player(new_player("Steve")).await.unwrap();
        c.toggle_self(&Principal::new("nova", Role::Streamer), p.id)
            .await
            .unwrap();

        c.update_player(
            p.id,
            PlayerPatch {
                color: Some("#123456".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        c.flush_notifications().await;
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn removing_tag_strips_it_from_players() {
        let (c, _, _) = setup();
        c.add_tag("pvp").await.unwrap();
        c.add_tag("build").await.unwrap();
        assert_eq!(c.add_tag("pvp").await.unwrap().len(), 2);

        let p = c
            .create_player(NewPlayer {
                name: "Steve".into(),
                tags: vec!["pvp".into(), "build".into()],
                color: None,
            })
            .await
            .unwrap();

        assert_eq!(c.remove_tag("pvp").await.unwrap(), vec!["build".to_string()]);
        assert_eq!(c.get_player(p.id).await.unwrap().tags, vec!["build".to_string()]);

        assert!(matches!(
            c.remove_tag("pvp").await.unwrap_err(),
            SelectionError::NotFound(_)
        ));
    }
}
