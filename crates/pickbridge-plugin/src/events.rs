//! Notification payloads sent to the game server plugin.

use pickbridge_db::PlayerId;
use serde::{Deserialize, Serialize};

/// Player name used by connection tests. The plugin recognizes the
/// `TestPlayer`/`TestStreamer` pair and only acknowledges it.
pub const TEST_PLAYER_NAME: &str = "TestPlayer";
pub const TEST_STREAMER_NAME: &str = "TestStreamer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginAction {
    Add,
    Remove,
}

impl PluginAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginAction::Add => "add",
            PluginAction::Remove => "remove",
        }
    }
}

impl std::fmt::Display for PluginAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "streamer S performed action A on player P".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionNotification {
    /// `None` for synthetic notifications that do not refer to a pool player.
    pub player_id: Option<PlayerId>,
    pub player_name: String,
    pub streamer: String,
    pub action: PluginAction,
}

impl ActionNotification {
    pub fn new(
        player_id: PlayerId,
        player_name: impl Into<String>,
        streamer: impl Into<String>,
        action: PluginAction,
    ) -> Self {
        Self {
            player_id: Some(player_id),
            player_name: player_name.into(),
            streamer: streamer.into(),
            action,
        }
    }

    /// The synthetic connection-test notification.
    pub fn test_ping() -> Self {
        Self {
            player_id: None,
            player_name: TEST_PLAYER_NAME.to_string(),
            streamer: TEST_STREAMER_NAME.to_string(),
            action: PluginAction::Add,
        }
    }

    /// Form fields in wire order. `token` is only present when configured.
    pub fn form_fields(&self, token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("playerName", self.player_name.clone()),
            ("streamer", self.streamer.clone()),
            ("action", self.action.as_str().to_string()),
        ];
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            fields.push(("token", token.to_string()));
        }
        fields
    }
}
