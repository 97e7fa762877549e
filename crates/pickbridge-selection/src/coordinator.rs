//! Selection coordinator: the single entry point for selection changes.
//!
//! Every mutation runs read → validate → apply → write → enqueue under one
//! async write lock, so two requests can never both pass validation against
//! the same snapshot. Notifications are queued before the lock is released,
//! which keeps the dispatcher's FIFO identical to commit order. Delivery
//! itself happens on the dispatcher task and never blocks a request.

use std::collections::BTreeMap;
use std::sync::Arc;

use pickbridge_db::{Document, PlayerId, PluginEndpoint, Role, StateStore};
use pickbridge_plugin::{
    deliver, normalize_endpoint, validate_endpoint, ActionNotification, DeliveryLog,
    NotificationDispatcher, PluginNotifier,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::SelectionError;
use crate::mutator;
use crate::validator::{validate, Direction, Verdict};

/// An authenticated caller, as resolved by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// What a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requested {
    /// Flip the current membership.
    Toggle,
    Set(Direction),
}

/// Result of a selection request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionChange {
    pub streamer: String,
    pub player_id: PlayerId,
    pub direction: Direction,
    /// False when the request was a legal no-op.
    pub applied: bool,
    /// Whether the streamer holds the player after the request.
    pub selected: bool,
    pub selections: Vec<PlayerId>,
}

/// Outcome of a locked read-modify-write step.
pub(crate) struct Change<T> {
    value: T,
    dirty: bool,
    notifications: Vec<ActionNotification>,
}

impl<T> Change<T> {
    pub(crate) fn unchanged(value: T) -> Self {
        Self {
            value,
            dirty: false,
            notifications: Vec::new(),
        }
    }

    pub(crate) fn write(value: T) -> Self {
        Self {
            value,
            dirty: true,
            notifications: Vec::new(),
        }
    }

    pub(crate) fn notify(mut self, notification: ActionNotification) -> Self {
        self.notifications.push(notification);
        self
    }

    pub(crate) fn notify_all(
        mut self,
        notifications: impl IntoIterator<Item = ActionNotification>,
    ) -> Self {
        self.notifications.extend(notifications);
        self
    }
}

pub struct Coordinator {
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn PluginNotifier>,
    dispatcher: NotificationDispatcher,
    write_lock: Mutex<()>,
}

impl Coordinator {
    /// Build the coordinator and spawn its notification dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn PluginNotifier>,
        log: Arc<DeliveryLog>,
    ) -> Self {
        let dispatcher = NotificationDispatcher::spawn(notifier.clone(), log);
        Self {
            store,
            notifier,
            dispatcher,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn delivery_log(&self) -> &Arc<DeliveryLog> {
        self.dispatcher.log()
    }

    /// Current document, read without taking the write lock.
    pub async fn snapshot(&self) -> Result<Document, SelectionError> {
        Ok(self.store.read().await?)
    }

    /// Run `f` against a fresh document under the write lock.
    ///
    /// The document is persisted only when `f` reports it dirty, and its
    /// notifications are queued only after that write succeeded.
    pub(crate) async fn commit<T>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<Change<T>, SelectionError>,
    ) -> Result<T, SelectionError> {
        let _guard = self.write_lock.lock().await;

        let mut doc = self.store.read().await?;
        let change = f(&mut doc)?;

        if change.dirty {
            self.store.write(&doc).await?;
        }
        for notification in change.notifications {
            self.dispatcher.enqueue(notification);
        }
        Ok(change.value)
    }

    // ─── Selections ─────────────────────────────────────────────────

    /// Toggle or set `streamer`'s selection of `player_id`.
    ///
    /// Streamers may only act on their own set. Admins may act on any
    /// registered streamer's set.
    pub async fn toggle_or_set(
        &self,
        principal: &Principal,
        streamer: &str,
        player_id: PlayerId,
        requested: Requested,
    ) -> Result<SelectionChange, SelectionError> {
        let acting_for_other = principal.username != streamer;
        if acting_for_other && !principal.is_admin() {
            return Err(SelectionError::PermissionDenied(format!(
                "{} may not change selections of {streamer}",
                principal.username
            )));
        }

        let result = self
            .commit(|doc| {
                if acting_for_other && !doc.is_streamer(streamer) {
                    return Err(SelectionError::NotFound(format!("streamer {streamer}")));
                }

                let direction = match requested {
                    Requested::Set(direction) => direction,
                    Requested::Toggle if doc.selections.contains(streamer, player_id) => {
                        Direction::Remove
                    }
                    Requested::Toggle => Direction::Add,
                };

                match validate(doc, streamer, player_id, direction)? {
                    Verdict::Unchanged => Ok(Change::unchanged(SelectionChange {
                        streamer: streamer.to_string(),
                        player_id,
                        direction,
                        applied: false,
                        selected: doc.selections.contains(streamer, player_id),
                        selections: doc.selections.of(streamer).to_vec(),
                    })),
                    Verdict::Apply => {
                        let player_name = doc
                            .player(player_id)
                            .map(|p| p.name.clone())
                            .unwrap_or_else(|| player_id.to_string());

                        doc.selections = mutator::apply(
                            std::mem::take(&mut doc.selections),
                            streamer,
                            player_id,
                            direction,
                        );

                        let change = SelectionChange {
                            streamer: streamer.to_string(),
                            player_id,
                            direction,
                            applied: true,
                            selected: direction == Direction::Add,
                            selections: doc.selections.of(streamer).to_vec(),
                        };
                        Ok(Change::write(change).notify(ActionNotification::new(
                            player_id,
                            player_name,
                            streamer,
                            direction.into(),
                        )))
                    }
                }
            })
            .await;

        match &result {
            Ok(change) if change.applied => tracing::info!(
                actor = %principal.username,
                streamer,
                player_id,
                direction = %change.direction,
                "selection changed"
            ),
            Ok(_) => tracing::debug!(streamer, player_id, "selection request was a no-op"),
            Err(e) => tracing::info!(
                actor = %principal.username,
                streamer,
                player_id,
                error = %e,
                "selection request rejected"
            ),
        }
        result
    }

    /// Self-service toggle for the calling principal's own set.
    pub async fn toggle_self(
        &self,
        principal: &Principal,
        player_id: PlayerId,
    ) -> Result<SelectionChange, SelectionError> {
        self.toggle_or_set(principal, &principal.username, player_id, Requested::Toggle)
            .await
    }

    pub async fn admin_add(
        &self,
        principal: &Principal,
        streamer: &str,
        player_id: PlayerId,
    ) -> Result<SelectionChange, SelectionError> {
        self.require_admin(principal)?;
        self.toggle_or_set(principal, streamer, player_id, Requested::Set(Direction::Add))
            .await
    }

    pub async fn admin_remove(
        &self,
        principal: &Principal,
        streamer: &str,
        player_id: PlayerId,
    ) -> Result<SelectionChange, SelectionError> {
        self.require_admin(principal)?;
        self.toggle_or_set(
            principal,
            streamer,
            player_id,
            Requested::Set(Direction::Remove),
        )
        .await
    }

    /// One streamer's selection set. Unknown streamers have an empty set.
    pub async fn get_selection(&self, streamer: &str) -> Result<Vec<PlayerId>, SelectionError> {
        Ok(self.snapshot().await?.selections.of(streamer).to_vec())
    }

    pub async fn get_all_selections(
        &self,
    ) -> Result<BTreeMap<String, Vec<PlayerId>>, SelectionError> {
        Ok(self.snapshot().await?.selections.as_map().clone())
    }

    // ─── Settings ───────────────────────────────────────────────────

    pub async fn get_limit(&self) -> Result<u32, SelectionError> {
        Ok(self.snapshot().await?.settings.selection_limit)
    }

    /// Change the per-streamer limit. Sets already above the new value are
    /// kept; those streamers just cannot add until they drop below it.
    pub async fn set_limit(&self, limit: u32) -> Result<u32, SelectionError> {
        if limit == 0 {
            return Err(SelectionError::InvalidConfig(
                "selection limit must be a positive integer".to_string(),
            ));
        }

        let over_limit = self
            .commit(|doc| {
                doc.settings.selection_limit = limit;
                let over: Vec<String> = doc
                    .selections
                    .streamers()
                    .filter(|(_, ids)| ids.len() > limit as usize)
                    .map(|(s, _)| s.to_string())
                    .collect();
                Ok(Change::write(over))
            })
            .await?;

        tracing::info!(limit, "selection limit updated");
        if !over_limit.is_empty() {
            tracing::info!(
                limit,
                streamers = ?over_limit,
                "existing selections above the new limit are kept"
            );
        }
        Ok(limit)
    }

    pub async fn get_endpoint(&self) -> Result<PluginEndpoint, SelectionError> {
        Ok(self.snapshot().await?.settings.plugin)
    }

    /// Store a new plugin endpoint. The next notification sent uses it.
    pub async fn set_endpoint(
        &self,
        host: &str,
        port: u32,
        auth_token: Option<String>,
    ) -> Result<PluginEndpoint, SelectionError> {
        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| {
                SelectionError::InvalidConfig(format!("port {port} is outside 1-65535"))
            })?;

        let endpoint = normalize_endpoint(host, port, auth_token);
        validate_endpoint(&endpoint)?;

        let stored = endpoint.clone();
        self.commit(move |doc| {
            doc.settings.plugin = stored;
            Ok(Change::write(()))
        })
        .await?;

        tracing::info!(
            host = %endpoint.host,
            port = endpoint.port,
            token = endpoint.auth_token.is_some(),
            "plugin endpoint updated"
        );
        Ok(endpoint)
    }

    // ─── Plugin sync ────────────────────────────────────────────────

    /// Replay every current selection to the plugin as `add`.
    ///
    /// Returns the number of notifications attempted. Individual failures
    /// are logged and recorded, not returned.
    pub async fn resend_all(&self) -> Result<usize, SelectionError> {
        let snapshot = self.snapshot().await?;
        Ok(pickbridge_plugin::resend_all(
            self.notifier.as_ref(),
            self.delivery_log(),
            &snapshot,
        )
        .await)
    }

    /// Send the synthetic connection-test notification and wait for it.
    pub async fn test_ping(&self) -> Result<(), SelectionError> {
        let notification = ActionNotification::test_ping();
        deliver(self.notifier.as_ref(), self.delivery_log(), &notification)
            .await
            .into_result()
            .map_err(SelectionError::DeliveryFailed)
    }

    /// Wait until every notification queued so far has been attempted.
    pub async fn flush_notifications(&self) {
        self.dispatcher.flush().await;
    }

    pub(crate) fn require_admin(&self, principal: &Principal) -> Result<(), SelectionError> {
        if principal.is_admin() {
            Ok(())
        } else {
            Err(SelectionError::PermissionDenied(
                "admin access required".to_string(),
            ))
        }
    }
}
