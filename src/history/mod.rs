//! Bounded in-memory alert history
//!
//! Keeps the most recent alerts in insertion order, evicting the oldest once
//! the capacity is reached. Every read returns an owned snapshot.

use std::collections::VecDeque;

use tokio::sync::RwLock;

use crate::models::{Alert, AlertType};

/// Default number of alerts retained
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Size-capped, concurrently accessible store of recent alerts
///
/// Append and eviction happen under one write lock, so readers never observe
/// more than `capacity` entries or a partially evicted sequence.
pub struct AlertHistoryStore {
    entries: RwLock<VecDeque<Alert>>,
    capacity: usize,
}

impl AlertHistoryStore {
    /// Create a store with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a store retaining at most `capacity` alerts
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
        }
    }

    /// Append an alert, returning how many old alerts were evicted
    pub async fn append(&self, alert: Alert) -> usize {
        let mut entries = self.entries.write().await;
        entries.push_back(alert);

        let mut evicted = 0;
        while entries.len() > self.capacity {
            entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// All retained alerts, most recently appended first
    pub async fn recent(&self) -> Vec<Alert> {
        self.entries.read().await.iter().rev().cloned().collect()
    }

    /// Alerts for one location, newest timestamp first
    pub async fn by_location(&self, location_id: &str) -> Vec<Alert> {
        self.filtered(|a| a.location_id == location_id).await
    }

    /// Alerts of one type, newest timestamp first
    pub async fn by_type(&self, alert_type: AlertType) -> Vec<Alert> {
        self.filtered(|a| a.alert_type == alert_type).await
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<Alert>
    where
        F: Fn(&Alert) -> bool,
    {
        let mut matches: Vec<Alert> = self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|a| predicate(a))
            .cloned()
            .collect();

        // Stable sort over reverse insertion order: equal timestamps keep newer inserts first
        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matches
    }

    /// Number of retained alerts
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for AlertHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
