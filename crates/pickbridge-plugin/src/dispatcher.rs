//! Notification dispatcher: delivers accepted changes in commit order.
//!
//! Callers enqueue while they still hold the state write lock, so the queue
//! order is the commit order. A single worker task drains the queue, which
//! keeps notifications for the same player in order without ever running an
//! HTTP call under the write lock.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::delivery_log::DeliveryLog;
use crate::events::ActionNotification;
use crate::notifier::{DeliveryOutcome, PluginNotifier};

enum Job {
    Deliver(ActionNotification),
    Flush(oneshot::Sender<()>),
}

/// Attempt one delivery, then log and record the outcome.
pub async fn deliver(
    notifier: &dyn PluginNotifier,
    log: &DeliveryLog,
    notification: &ActionNotification,
) -> DeliveryOutcome {
    let outcome = notifier.notify(notification).await;
    match &outcome {
        DeliveryOutcome::Delivered => tracing::debug!(
            player = %notification.player_name,
            streamer = %notification.streamer,
            action = %notification.action,
            "plugin notification delivered"
        ),
        DeliveryOutcome::Failed(cause) => tracing::warn!(
            player = %notification.player_name,
            player_id = ?notification.player_id,
            streamer = %notification.streamer,
            action = %notification.action,
            %cause,
            "plugin notification failed, run resend-all once the plugin is reachable"
        ),
    }
    log.record(notification, &outcome);
    outcome
}

/// Handle to the background delivery worker. Cheap to clone.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<Job>,
    log: Arc<DeliveryLog>,
}

impl NotificationDispatcher {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(notifier: Arc<dyn PluginNotifier>, log: Arc<DeliveryLog>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let worker_log = log.clone();

        tokio::spawn(async move {
            tracing::debug!("notification dispatcher started");
            while let Some(job) = rx.recv().await {
                match job {
                    Job::Deliver(notification) => {
                        deliver(notifier.as_ref(), &worker_log, &notification).await;
                    }
                    Job::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("notification dispatcher stopped");
        });

        Self { tx, log }
    }

    /// Queue a notification. Never blocks.
    pub fn enqueue(&self, notification: ActionNotification) {
        if let Err(e) = self.tx.send(Job::Deliver(notification)) {
            let Job::Deliver(lost) = e.0 else { return };
            tracing::error!(
                player = %lost.player_name,
                streamer = %lost.streamer,
                action = %lost.action,
                "notification dispatcher is gone, dropping notification"
            );
        }
    }

    /// Wait until every notification queued before this call was attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Job::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    pub fn log(&self) -> &Arc<DeliveryLog> {
        &self.log
    }
}
