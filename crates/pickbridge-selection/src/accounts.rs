//! User accounts. Passwords arrive already hashed; hashing belongs to the
//! HTTP layer.

use pickbridge_db::{PlayerId, Role, UserRecord};
use pickbridge_plugin::{ActionNotification, PluginAction};
use serde::Serialize;

use crate::coordinator::{Change, Coordinator};
use crate::error::SelectionError;
use crate::mutator;

/// Account view without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub username: String,
    pub role: Role,
}

impl From<&UserRecord> for AccountSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
        }
    }
}

fn validate_username(username: &str) -> Result<(), SelectionError> {
    if username.len() < 3 || username.len() > 64 {
        return Err(SelectionError::InvalidInput(
            "username must be between 3 and 64 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(SelectionError::InvalidInput(
            "username may only contain letters, digits, '_', '-' and '.'".to_string(),
        ));
    }
    Ok(())
}

impl Coordinator {
    pub async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, SelectionError> {
        Ok(self.snapshot().await?.user(username).cloned())
    }

    pub async fn list_users(&self) -> Result<Vec<AccountSummary>, SelectionError> {
        Ok(self
            .snapshot()
            .await?
            .users
            .iter()
            .map(AccountSummary::from)
            .collect())
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: String,
        role: Role,
    ) -> Result<AccountSummary, SelectionError> {
        let username = username.trim().to_string();
        validate_username(&username)?;

        let summary = self
            .commit(move |doc| {
                if doc.user(&username).is_some() {
                    return Err(SelectionError::AlreadyExists(format!("user {username}")));
                }
                let record = UserRecord {
                    username,
                    password_hash,
                    role,
                };
                let summary = AccountSummary::from(&record);
                doc.users.push(record);
                Ok(Change::write(summary))
            })
            .await?;

        tracing::info!(username = %summary.username, role = %summary.role, "user created");
        Ok(summary)
    }

    /// Delete a streamer account, releasing every player it held.
    /// Admin accounts cannot be deleted.
    pub async fn delete_user(&self, username: &str) -> Result<Vec<PlayerId>, SelectionError> {
        let released = self
            .commit(|doc| {
                let idx = doc
                    .users
                    .iter()
                    .position(|u| u.username == username)
                    .ok_or_else(|| SelectionError::NotFound(format!("user {username}")))?;
                if doc.users[idx].role == Role::Admin {
                    return Err(SelectionError::PermissionDenied(
                        "admin accounts cannot be deleted".to_string(),
                    ));
                }
                doc.users.remove(idx);

                let released = mutator::drop_streamer(&mut doc.selections, username);
                let notifications: Vec<ActionNotification> = released
                    .iter()
                    .map(|id| {
                        let name = doc
                            .player(*id)
                            .map(|p| p.name.clone())
                            .unwrap_or_else(|| id.to_string());
                        ActionNotification::new(*id, name, username, PluginAction::Remove)
                    })
                    .collect();
                Ok(Change::write(released).notify_all(notifications))
            })
            .await?;

        tracing::info!(username, released = released.len(), "user deleted");
        Ok(released)
    }

    /// Create the first admin account when the store has no users yet.
    /// Returns whether an account was created.
    pub async fn bootstrap_admin(
        &self,
        username: &str,
        password_hash: impl FnOnce() -> Result<String, SelectionError>,
    ) -> Result<bool, SelectionError> {
        validate_username(username)?;
        let created = self
            .commit(|doc| {
                if !doc.users.is_empty() {
                    return Ok(Change::unchanged(false));
                }
                doc.users.push(UserRecord {
                    username: username.to_string(),
                    password_hash: password_hash()?,
                    role: Role::Admin,
                });
                Ok(Change::write(true))
            })
            .await?;

        if created {
            tracing::warn!(
                username,
                "no users found, created initial admin account; change its password"
            );
        }
        Ok(created)
    }
}
