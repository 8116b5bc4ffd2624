//! Per-location temperature trend tracking
//!
//! Each location keeps a small FIFO of recent `(temperature, timestamp)` readings.
//! After every update the tracker derives the temperature change between the
//! newest reading and the oldest reading that falls inside the lookback window.
//!
//! The lookback is anchored at wall-clock "now" when the update happens, not at
//! the reading's own timestamp, so the same data can yield a different delta
//! depending on when it is processed.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Default number of readings retained per location
pub const DEFAULT_TREND_CAPACITY: usize = 10;

/// Default lookback window in minutes
pub const DEFAULT_TREND_WINDOW_MINUTES: i64 = 30;

/// Readings needed before a delta is considered meaningful
const MIN_READINGS_FOR_TREND: usize = 2;

/// A single retained reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendReading {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of recording a reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendUpdate {
    /// True once at least two readings are held for the location
    pub has_sufficient_history: bool,
    /// Newest value minus the in-window baseline value
    pub temperature_delta: f64,
}

/// Recent temperature history for one location
#[derive(Debug, Clone)]
pub struct TrendState {
    location_name: String,
    readings: VecDeque<TrendReading>,
    capacity: usize,
    window: Duration,
    temperature_delta: f64,
}

impl TrendState {
    /// Create an empty state
    pub fn new(location_name: impl Into<String>, capacity: usize, window: Duration) -> Self {
        Self {
            location_name: location_name.into(),
            readings: VecDeque::with_capacity(capacity + 1),
            capacity,
            window,
            temperature_delta: 0.0,
        }
    }

    /// Append a reading, evict beyond capacity and recompute the delta against `now`
    pub fn record(&mut self, value: f64, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> TrendUpdate {
        self.readings.push_back(TrendReading { value, timestamp });
        while self.readings.len() > self.capacity {
            self.readings.pop_front();
        }

        self.temperature_delta = self.compute_delta(now);

        TrendUpdate {
            has_sufficient_history: self.readings.len() >= MIN_READINGS_FOR_TREND,
            temperature_delta: self.temperature_delta,
        }
    }

    fn compute_delta(&self, now: DateTime<Utc>) -> f64 {
        if self.readings.len() < MIN_READINGS_FOR_TREND {
            return 0.0;
        }

        let cutoff = now - self.window;

        // Earliest reading still inside the window; falls back to the FIFO head
        let baseline = self
            .readings
            .iter()
            .filter(|r| r.timestamp > cutoff)
            .fold(None::<&TrendReading>, |best, r| match best {
                Some(b) if b.timestamp <= r.timestamp => Some(b),
                _ => Some(r),
            })
            .or_else(|| self.readings.front());

        // Newest by timestamp, not by insertion; first wins on ties
        let newest = self.readings.iter().fold(None::<&TrendReading>, |best, r| match best {
            Some(b) if b.timestamp >= r.timestamp => Some(b),
            _ => Some(r),
        });

        match (baseline, newest) {
            (Some(base), Some(newest)) => newest.value - base.value,
            _ => 0.0,
        }
    }

    /// Display name captured when the state was created
    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    /// Most recently computed delta
    pub fn temperature_delta(&self) -> f64 {
        self.temperature_delta
    }

    /// Retained readings in insertion order
    pub fn readings(&self) -> impl Iterator<Item = &TrendReading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Read-only copy of a location's trend state
#[derive(Debug, Clone, Serialize)]
pub struct TrendSnapshot {
    pub location_id: String,
    pub location_name: String,
    pub temperature_delta: f64,
    pub readings: Vec<TrendReading>,
}

/// Tracks trend state for every location seen so far
///
/// The outer map is only write-locked to insert a new location. Each location's
/// state sits behind its own mutex, so updates for one location are serialized
/// while different locations proceed in parallel.
///
/// Locations are never evicted.
pub struct TrendTracker {
    states: RwLock<HashMap<String, Arc<Mutex<TrendState>>>>,
    capacity: usize,
    window: Duration,
}

impl TrendTracker {
    /// Create a tracker with the default capacity and window
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_TREND_CAPACITY, DEFAULT_TREND_WINDOW_MINUTES)
    }

    /// Create a tracker with a custom per-location capacity and lookback
    pub fn with_settings(capacity: usize, window_minutes: i64) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            window: Duration::minutes(window_minutes),
        }
    }

    /// Record a temperature reading for a location
    pub async fn update(
        &self,
        location_id: &str,
        location_name: &str,
        temperature: f64,
        timestamp: DateTime<Utc>,
    ) -> TrendUpdate {
        self.update_at(location_id, location_name, temperature, timestamp, Utc::now())
            .await
    }

    /// Same as [`update`](Self::update) with an explicit wall-clock instant
    pub async fn update_at(
        &self,
        location_id: &str,
        location_name: &str,
        temperature: f64,
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> TrendUpdate {
        let state = self.state_for(location_id, location_name).await;
        let mut state = state.lock().await;
        state.record(temperature, timestamp, now)
    }

    async fn state_for(&self, location_id: &str, location_name: &str) -> Arc<Mutex<TrendState>> {
        if let Some(state) = self.states.read().await.get(location_id) {
            return state.clone();
        }

        let mut states = self.states.write().await;
        states
            .entry(location_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(location_id, location_name, "Tracking new location");
                Arc::new(Mutex::new(TrendState::new(
                    location_name,
                    self.capacity,
                    self.window,
                )))
            })
            .clone()
    }

    /// Copy of one location's state, if it has been seen
    pub async fn snapshot(&self, location_id: &str) -> Option<TrendSnapshot> {
        let state = self.states.read().await.get(location_id).cloned()?;
        let state = state.lock().await;
        Some(TrendSnapshot {
            location_id: location_id.to_string(),
            location_name: state.location_name().to_string(),
            temperature_delta: state.temperature_delta(),
            readings: state.readings().copied().collect(),
        })
    }

    /// Number of locations tracked
    pub async fn location_count(&self) -> usize {
        self.states.read().await.len()
    }
}

impl Default for TrendTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes_ago(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
        now - Duration::minutes(minutes)
    }

    #[test]
    fn test_single_reading_has_no_trend() {
        let now = Utc::now();
        let mut state = TrendState::new("Paris, FR", 10, Duration::minutes(30));
        let update = state.record(12.0, now, now);
        assert!(!update.has_sufficient_history);
        assert_eq!(update.temperature_delta, 0.0);
    }

    #[test]
    fn test_delta_against_oldest_in_window() {
        let now = Utc::now();
        let mut state = TrendState::new("Paris, FR", 10, Duration::minutes(30));
        state.record(30.0, minutes_ago(now, 15), now);
        state.record(30.0, minutes_ago(now, 10), now);
        state.record(30.0, minutes_ago(now, 5), now);
        let update = state.record(20.0, now, now);
        assert!(update.has_sufficient_history);
        assert!((update.temperature_delta + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_readings_outside_window_are_not_baseline() {
        let now = Utc::now();
        let mut state = TrendState::new("Oslo, NO", 10, Duration::minutes(30));
        state.record(5.0, minutes_ago(now, 90), now);
        state.record(18.0, minutes_ago(now, 20), now);
        let update = state.record(20.0, now, now);
        // Baseline is the 20-minute-old reading, not the 90-minute-old one
        assert!((update.temperature_delta - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_falls_back_to_fifo_head_when_window_is_empty() {
        let now = Utc::now();
        let mut state = TrendState::new("Oslo, NO", 10, Duration::minutes(30));
        state.record(5.0, minutes_ago(now, 120), now);
        let update = state.record(12.0, minutes_ago(now, 60), now);
        assert!((update.temperature_delta - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_delta_depends_on_wall_clock() {
        let base = Utc::now();
        let readings = [(10.0, base), (17.0, base + Duration::minutes(10))];

        let mut prompt = TrendState::new("Tokyo, JP", 10, Duration::minutes(30));
        let mut delayed = TrendState::new("Tokyo, JP", 10, Duration::minutes(30));
        let mut prompt_update = None;
        let mut delayed_update = None;
        for (value, ts) in readings {
            prompt_update = Some(prompt.record(value, ts, base + Duration::minutes(10)));
            delayed_update = Some(delayed.record(value, ts, base + Duration::minutes(35)));
        }

        // Processed promptly both readings are in the window
        assert!((prompt_update.unwrap().temperature_delta - 7.0).abs() < 1e-9);
        // Processed 25 minutes late only the newest reading is, so it is its own baseline
        assert_eq!(delayed_update.unwrap().temperature_delta, 0.0);
    }

    #[test]
    fn test_out_of_order_reading_uses_newest_by_timestamp() {
        let now = Utc::now();
        let mut state = TrendState::new("Sydney, AU", 10, Duration::minutes(30));
        state.record(20.0, minutes_ago(now, 20), now);
        state.record(26.0, minutes_ago(now, 1), now);
        // Late arrival, older than the previous reading
        let update = state.record(23.0, minutes_ago(now, 10), now);
        assert!((update.temperature_delta - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let now = Utc::now();
        let mut state = TrendState::new("Berlin, DE", 10, Duration::minutes(30));
        for i in 0..15 {
            state.record(i as f64, now, now);
        }
        assert_eq!(state.len(), 10);
        assert_eq!(state.readings().next().map(|r| r.value), Some(5.0));
    }

    #[test]
    fn test_duplicate_timestamps_are_well_defined() {
        let now = Utc::now();
        let mut state = TrendState::new("Mumbai, IN", 10, Duration::minutes(30));
        state.record(10.0, now, now);
        let update = state.record(16.0, now, now);
        // Both readings share a timestamp; the first recorded is both baseline and newest
        assert_eq!(update.temperature_delta, 0.0);
        assert!(update.has_sufficient_history);
    }

    #[tokio::test]
    async fn test_tracker_sufficient_history_after_second_update() {
        let tracker = TrendTracker::new();
        let now = Utc::now();

        let first = tracker.update("loc-1", "London, GB", 15.0, now).await;
        assert!(!first.has_sufficient_history);

        let second = tracker.update("loc-1", "London, GB", 15.5, now).await;
        assert!(second.has_sufficient_history);

        let other = tracker.update("loc-2", "Cairo, EG", 35.0, now).await;
        assert!(!other.has_sufficient_history);

        assert_eq!(tracker.location_count().await, 2);
    }

    #[tokio::test]
    async fn test_tracker_snapshot() {
        let tracker = TrendTracker::new();
        let now = Utc::now();
        tracker.update("loc-1", "London, GB", 15.0, now).await;

        let snapshot = tracker.snapshot("loc-1").await.unwrap();
        assert_eq!(snapshot.location_name, "London, GB");
        assert_eq!(snapshot.readings.len(), 1);
        assert!(tracker.snapshot("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_updates_keep_capacity() {
        let tracker = Arc::new(TrendTracker::new());
        let now = Utc::now();

        let mut handles = Vec::new();
        for i in 0..50 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                let location = format!("loc-{}", i % 3);
                tracker.update(&location, "Anywhere", i as f64, now).await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(tracker.location_count().await, 3);
        for i in 0..3 {
            let snapshot = tracker.snapshot(&format!("loc-{i}")).await.unwrap();
            assert_eq!(snapshot.readings.len(), 10);
        }
    }
}
