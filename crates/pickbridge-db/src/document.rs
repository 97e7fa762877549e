//! The persisted document: player pool, tags, users, selections and settings.
//!
//! The whole document is read and written as one unit by a [`StateStore`],
//! so every field here is observed atomically.
//!
//! [`StateStore`]: crate::store::StateStore

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PlayerId = i64;

/// Color assigned to players created without one.
pub const DEFAULT_PLAYER_COLOR: &str = "#667eea";

/// Selection limit used when nothing else is configured.
pub const DEFAULT_SELECTION_LIMIT: u32 = 5;

pub const DEFAULT_PLUGIN_HOST: &str = "127.0.0.1";
pub const DEFAULT_PLUGIN_PORT: u16 = 8123;

fn default_color() -> String {
    DEFAULT_PLAYER_COLOR.to_string()
}

// ─── Pool ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_color")]
    pub color: String,
}

// ─── Users ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Streamer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Streamer => "streamer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(Role::Admin),
            "streamer" => Some(Role::Streamer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

// ─── Selections ─────────────────────────────────────────────────────

/// Streamer username → insertion-ordered set of selected player ids.
///
/// Streamers iterate in sorted order; each streamer's ids keep the order
/// in which they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState(BTreeMap<String, Vec<PlayerId>>);

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The streamer's selected ids (empty if they never selected anything).
    pub fn of(&self, streamer: &str) -> &[PlayerId] {
        self.0.get(streamer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, streamer: &str, player_id: PlayerId) -> bool {
        self.of(streamer).contains(&player_id)
    }

    /// The streamer currently holding `player_id`, if any.
    pub fn holder_of(&self, player_id: PlayerId) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, ids)| ids.contains(&player_id))
            .map(|(streamer, _)| streamer.as_str())
    }

    /// Every (streamer, player id) pair.
    pub fn entries(&self) -> impl Iterator<Item = (&str, PlayerId)> + '_ {
        self.0
            .iter()
            .flat_map(|(streamer, ids)| ids.iter().map(move |id| (streamer.as_str(), *id)))
    }

    pub fn streamers(&self) -> impl Iterator<Item = (&str, &[PlayerId])> + '_ {
        self.0.iter().map(|(s, ids)| (s.as_str(), ids.as_slice()))
    }

    /// Total number of selected entries across all streamers.
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn set_mut(&mut self, streamer: &str) -> &mut Vec<PlayerId> {
        self.0.entry(streamer.to_string()).or_default()
    }

    /// Remove the streamer's whole set, returning it.
    pub fn take(&mut self, streamer: &str) -> Vec<PlayerId> {
        self.0.remove(streamer).unwrap_or_default()
    }

    /// Drop sets that became empty so the document stays compact.
    pub fn prune_empty(&mut self) {
        self.0.retain(|_, ids| !ids.is_empty());
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<PlayerId>> {
        &self.0
    }
}

impl From<BTreeMap<String, Vec<PlayerId>>> for SelectionState {
    fn from(map: BTreeMap<String, Vec<PlayerId>>) -> Self {
        Self(map)
    }
}

// ─── Settings ───────────────────────────────────────────────────────

/// Where accepted selection changes are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEndpoint {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for PluginEndpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_PLUGIN_HOST.to_string(),
            port: DEFAULT_PLUGIN_PORT,
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub selection_limit: u32,
    #[serde(default)]
    pub plugin: PluginEndpoint,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selection_limit: DEFAULT_SELECTION_LIMIT,
            plugin: PluginEndpoint::default(),
        }
    }
}

// ─── Document ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub selections: SelectionState,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl Document {
    /// A fresh document whose selection limit starts at `limit`.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            settings: Settings {
                selection_limit: limit,
                ..Settings::default()
            },
            ..Self::default()
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn user(&self, username: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn is_streamer(&self, username: &str) -> bool {
        self.user(username)
            .is_some_and(|u| u.role == Role::Streamer)
    }
}
