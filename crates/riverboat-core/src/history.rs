//! Bounded in-memory error history.
//!
//! Every taxonomy error the orchestrator surfaces is recorded here for
//! operator visibility. The record buffer is bounded; lifetime totals and
//! per-code counts survive eviction.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use riverboat_types::{ErrorSeverity, RiverboatError};

const DEFAULT_CAPACITY: usize = 1000;
const RECENT_WINDOW: usize = 10;

/// One recorded error occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub code: String,
    pub message: String,
    pub severity: ErrorSeverity,
    pub retryable: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Aggregate view over the history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorStatistics {
    /// Lifetime error count, including evicted records.
    pub total: u64,

    /// Lifetime count per machine code.
    pub by_code: BTreeMap<String, u64>,

    /// Lifetime count per severity label.
    pub by_severity: BTreeMap<String, u64>,

    /// Most recent occurrences, newest first.
    pub recent: Vec<ErrorRecord>,
}

#[derive(Default)]
struct HistoryInner {
    records: VecDeque<ErrorRecord>,
    by_code: BTreeMap<String, u64>,
    by_severity: BTreeMap<String, u64>,
    total: u64,
}

/// Bounded error history shared by the orchestrator.
pub struct ErrorHistory {
    inner: Mutex<HistoryInner>,
    capacity: usize,
}

impl ErrorHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(HistoryInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Record one error occurrence.
    pub async fn record(&self, error: &RiverboatError) {
        let record = ErrorRecord {
            code: error.code(),
            message: error.to_string(),
            severity: error.severity(),
            retryable: error.retryable(),
            occurred_at: Utc::now(),
        };

        let mut inner = self.inner.lock().await;
        inner.total += 1;
        *inner.by_code.entry(record.code.clone()).or_insert(0) += 1;
        *inner
            .by_severity
            .entry(record.severity.to_string())
            .or_insert(0) += 1;
        if inner.records.len() == self.capacity {
            inner.records.pop_front();
        }
        inner.records.push_back(record);
    }

    /// Aggregate statistics plus the most recent occurrences.
    pub async fn statistics(&self) -> ErrorStatistics {
        let inner = self.inner.lock().await;
        ErrorStatistics {
            total: inner.total,
            by_code: inner.by_code.clone(),
            by_severity: inner.by_severity.clone(),
            recent: inner
                .records
                .iter()
                .rev()
                .take(RECENT_WINDOW)
                .cloned()
                .collect(),
        }
    }

    /// Drop all records and counts.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        *inner = HistoryInner::default();
    }
}

impl Default for ErrorHistory {
    fn default() -> Self {
        Self::new()
    }
}
