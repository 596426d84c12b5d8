//! Durable-store record metadata.
//!
//! Every persist call creates one [`RecordMetadata`]; records are never
//! mutated, only deleted by purge or explicit delete. The `id` combines a UTC
//! timestamp with a content digest so ids sort lexicographically by creation
//! time and cannot collide across concurrent requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the pipeline a stored record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Incoming,
    Outgoing,
    Processing,
}

impl Direction {
    /// Storage subdirectory name for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
            Direction::Processing => "processing",
        }
    }

    /// All directions, in storage-lookup order.
    pub fn all() -> [Direction; 3] {
        [Direction::Incoming, Direction::Outgoing, Direction::Processing]
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata describing one stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    /// Record identifier, shared between a request's incoming and outgoing
    /// records.
    pub id: String,

    /// Incoming, outgoing, or processing.
    pub direction: Direction,

    /// When the record was persisted.
    pub timestamp: DateTime<Utc>,

    /// SHA-256 digest of the stored payload, verified on read.
    pub checksum: String,

    /// Stored payload size in bytes.
    pub size_bytes: u64,

    /// Workspace root from the envelope.
    pub workspace_root: String,

    /// Claim (task kind) from the envelope.
    pub claim_type: String,

    /// Task text truncated to 100 characters.
    pub task_summary: String,

    /// Number of attachments persisted alongside the payload.
    pub attachment_count: usize,

    /// Payload path relative to the storage root.
    pub storage_path: String,
}

/// Per-request status view derived from record metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStatus {
    pub id: String,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
    pub claim_type: String,
    pub task_summary: String,
    pub size_bytes: u64,
    pub attachment_count: usize,
    /// "completed" once an outgoing record exists, otherwise "processing".
    pub status: String,
}

impl RecordStatus {
    /// Derive the status view from stored metadata.
    pub fn from_metadata(meta: &RecordMetadata) -> Self {
        let status = if meta.direction == Direction::Outgoing {
            "completed"
        } else {
            "processing"
        };
        Self {
            id: meta.id.clone(),
            direction: meta.direction,
            timestamp: meta.timestamp,
            claim_type: meta.claim_type.clone(),
            task_summary: meta.task_summary.clone(),
            size_bytes: meta.size_bytes,
            attachment_count: meta.attachment_count,
            status: status.to_string(),
        }
    }
}

/// Aggregate storage statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Total records across all directions.
    pub total_records: u64,

    /// Incoming record count.
    pub incoming: u64,

    /// Outgoing record count.
    pub outgoing: u64,

    /// Processing record count.
    pub processing: u64,

    /// Sum of payload sizes in bytes.
    pub total_size_bytes: u64,

    /// Sum of attachment counts.
    pub total_attachments: u64,

    /// Oldest record timestamp, if any records exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest: Option<DateTime<Utc>>,

    /// Newest record timestamp, if any records exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata(direction: Direction) -> RecordMetadata {
        RecordMetadata {
            id: "20250114_101530_123456_a1b2c3d4".into(),
            direction,
            timestamp: Utc::now(),
            checksum: "deadbeef".into(),
            size_bytes: 512,
            workspace_root: "/ws".into(),
            claim_type: "generate_code".into(),
            task_summary: "add two numbers".into(),
            attachment_count: 2,
            storage_path: "incoming/20250114_101530_123456_a1b2c3d4.json".into(),
        }
    }

    #[test]
    fn direction_subdirectory_names() {
        assert_eq!(Direction::Incoming.as_str(), "incoming");
        assert_eq!(Direction::Outgoing.as_str(), "outgoing");
        assert_eq!(Direction::Processing.as_str(), "processing");
    }

    #[test]
    fn status_completed_only_for_outgoing() {
        let incoming = RecordStatus::from_metadata(&sample_metadata(Direction::Incoming));
        assert_eq!(incoming.status, "processing");

        let outgoing = RecordStatus::from_metadata(&sample_metadata(Direction::Outgoing));
        assert_eq!(outgoing.status, "completed");
    }

    #[test]
    fn metadata_serde_roundtrip() {
        let meta = sample_metadata(Direction::Incoming);
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"claimType\""));
        assert!(json.contains("\"sizeBytes\""));
        let restored: RecordMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, meta);
    }

    #[test]
    fn stats_default_is_empty() {
        let stats = StorageStats::default();
        assert_eq!(stats.total_records, 0);
        assert!(stats.oldest.is_none());
        let json = serde_json::to_string(&stats).unwrap();
        assert!(!json.contains("oldest"));
    }
}
