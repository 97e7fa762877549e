//! Delivery log: ring buffer of recent notification outcomes.
//!
//! Failed deliveries are the input for deciding when to run a resend-all,
//! so the admin API exposes the last N outcomes plus running counters.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::events::{ActionNotification, PluginAction};
use crate::notifier::DeliveryOutcome;

/// A single recorded delivery attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRecord {
    /// ISO-8601 timestamp
    pub timestamp: String,
    pub player_name: String,
    pub streamer: String,
    pub action: PluginAction,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
    pub buffered: usize,
}

/// Thread-safe ring buffer of delivery records.
pub struct DeliveryLog {
    entries: Mutex<VecDeque<DeliveryRecord>>,
    capacity: usize,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DeliveryRecord>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the outcome of one attempt, evicting the oldest entry at capacity.
    pub fn record(&self, notification: &ActionNotification, outcome: &DeliveryOutcome) {
        let cause = match outcome {
            DeliveryOutcome::Delivered => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                None
            }
            DeliveryOutcome::Failed(failure) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                Some(failure.to_string())
            }
        };

        if self.capacity == 0 {
            return;
        }
        let record = DeliveryRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            player_name: notification.player_name.clone(),
            streamer: notification.streamer.clone(),
            action: notification.action,
            delivered: cause.is_none(),
            cause,
        };

        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
    }

    /// Return entries (oldest first), optionally only failures and only the last `limit`.
    pub fn entries(&self, failed_only: bool, limit: Option<usize>) -> Vec<DeliveryRecord> {
        let entries = self.lock();
        let matching: Vec<_> = entries
            .iter()
            .filter(|e| !failed_only || !e.delivered)
            .cloned()
            .collect();
        match limit {
            Some(n) if n < matching.len() => matching[matching.len() - n..].to_vec(),
            _ => matching,
        }
    }

    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            buffered: self.lock().len(),
        }
    }

    /// Clear buffered entries. Counters keep running.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
