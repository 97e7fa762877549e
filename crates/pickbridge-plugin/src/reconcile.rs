//! Reconciliation: replay the full selection state to the plugin.
//!
//! This is the only repair path for missed notifications: there is no
//! background retry queue. It works on a snapshot and takes no lock, so
//! changes committed while it runs may be under- or over-notified.

use pickbridge_db::Document;

use crate::delivery_log::DeliveryLog;
use crate::dispatcher::deliver;
use crate::events::{ActionNotification, PluginAction};
use crate::notifier::{DeliveryOutcome, PluginNotifier};

/// Send one `add` per (streamer, player) pair in `snapshot`.
///
/// Returns how many notifications were attempted. Each failure is logged
/// and recorded but does not stop the remaining sends.
pub async fn resend_all(
    notifier: &dyn PluginNotifier,
    log: &DeliveryLog,
    snapshot: &Document,
) -> usize {
    let total = snapshot.selections.total();
    tracing::info!(entries = total, "resending all selections to plugin");

    let mut attempted = 0;
    let mut delivered = 0;
    for (streamer, player_id) in snapshot.selections.entries() {
        let Some(player) = snapshot.player(player_id) else {
            tracing::warn!(
                player_id,
                streamer = %streamer,
                "selection references a player missing from the pool, skipping"
            );
            continue;
        };

        let notification =
            ActionNotification::new(player.id, &player.name, streamer, PluginAction::Add);
        attempted += 1;
        if let DeliveryOutcome::Delivered = deliver(notifier, log, &notification).await {
            delivered += 1;
        }
    }

    tracing::info!(
        attempted,
        delivered,
        failed = attempted - delivered,
        "resend-all finished"
    );
    attempted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryFailure;
    use async_trait::async_trait;
    use pickbridge_db::{Player, DEFAULT_PLAYER_COLOR};
    use std::sync::Mutex;

    /// Fails every call for `fail_name`, records everything.
    struct Scripted {
        fail_name: Option<&'static str>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl Scripted {
        fn new(fail_name: Option<&'static str>) -> Self {
            Self {
                fail_name,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PluginNotifier for Scripted {
        async fn notify(&self, n: &ActionNotification) -> DeliveryOutcome {
            assert_eq!(n.action, PluginAction::Add);
            self.seen
                .lock()
                .unwrap()
                .push((n.streamer.clone(), n.player_name.clone()));
            if self.fail_name == Some(n.player_name.as_str()) {
                DeliveryOutcome::Failed(DeliveryFailure::Status { status: 503 })
            } else {
                DeliveryOutcome::Delivered
            }
        }
    }

    fn player(id: i64, name: &str) -> Player {
        Player {
            id,
            name: name.to_string(),
            tags: Vec::new(),
            color: DEFAULT_PLAYER_COLOR.to_string(),
        }
    }

    fn two_streamer_snapshot() -> Document {
        let mut doc = Document::with_limit(5);
        doc.players = vec![player(1, "Steve"), player(2, "Alex"), player(3, "Sam")];
        doc.selections.set_mut("nova").push(1);
        doc.selections.set_mut("kai").extend([3, 2]);
        doc
    }

    #[tokio::test]
    async fn test_counts_one_attempt_per_pair() {
        let notifier = Scripted::new(None);
        let log = DeliveryLog::new(10);

        let attempted = resend_all(&notifier, &log, &two_streamer_snapshot()).await;

        assert_eq!(attempted, 3);
        let seen = notifier.seen.lock().unwrap().clone();
        // Within a streamer the set's own order is kept.
        let kai: Vec<_> = seen
            .iter()
            .filter(|(s, _)| s == "kai")
            .map(|(_, p)| p.as_str())
            .collect();
        assert_eq!(kai, vec!["Sam", "Alex"]);
        assert!(seen.contains(&("nova".to_string(), "Steve".to_string())));
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_remaining() {
        let notifier = Scripted::new(Some("Sam"));
        let log = DeliveryLog::new(10);

        let attempted = resend_all(&notifier, &log, &two_streamer_snapshot()).await;

        assert_eq!(attempted, 3);
        assert_eq!(notifier.seen.lock().unwrap().len(), 3);
        assert_eq!(log.stats().failed, 1);
        assert_eq!(log.stats().delivered, 2);
    }

    #[tokio::test]
    async fn test_empty_state_sends_nothing() {
        let notifier = Scripted::new(None);
        let log = DeliveryLog::new(10);

        let attempted = resend_all(&notifier, &log, &Document::default()).await;
        assert_eq!(attempted, 0);
        assert!(notifier.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dangling_selection_is_skipped() {
        let mut doc = two_streamer_snapshot();
        doc.selections.set_mut("nova").push(99);
        let notifier = Scripted::new(None);

        let attempted = resend_all(&notifier, &DeliveryLog::new(10), &doc).await;
        assert_eq!(attempted, 3);
    }
}
