//! Durable filesystem storage for pipeline records.
//!
//! Layout under the storage root:
//!
//! ```text
//! metadata/{id}.{direction}.json     record metadata
//! incoming/{id}.json                 envelope payload as received
//! outgoing/{id}.json                 package payload as delivered
//! processing/{id}.json               intermediate snapshots, when taken
//! attachments/{id}/{direction}/      one file per attachment + sidecar meta
//! ```
//!
//! A request's incoming and outgoing records share one id; the direction is
//! part of the file name, never the id. Payload integrity is verified on
//! load against the checksum captured at save time.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use riverboat_types::envelope::{Attachment, TaskEnvelope};
use riverboat_types::package::Package;
use riverboat_types::record::{Direction, RecordMetadata, StorageStats};
use riverboat_types::{Result, RiverboatError};

/// Subdirectories created under the storage root.
const SUBDIRS: [&str; 5] = ["metadata", "incoming", "outgoing", "processing", "attachments"];

/// Metadata lookup order. Outgoing first so a completed request's status
/// reflects completion.
const LOOKUP: [Direction; 3] = [Direction::Outgoing, Direction::Incoming, Direction::Processing];

/// Attachment file-name encoding: everything but unreserved characters.
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// A stored payload together with its metadata.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub metadata: RecordMetadata,
    pub payload: serde_json::Value,
}

/// Fields shared by every record write.
struct RecordSeed<'a> {
    claim: &'a str,
    task_summary: String,
    workspace_root: &'a str,
    attachments: &'a [Attachment],
}

/// Filesystem-backed record store.
pub struct DurableStore {
    root: PathBuf,
    seq: AtomicU64,
}

impl DurableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            seq: AtomicU64::new(0),
        }
    }

    /// Create the storage root and its subdirectories.
    pub async fn init(&self) -> Result<()> {
        for dir in SUBDIRS {
            fs::create_dir_all(self.root.join(dir))
                .await
                .map_err(|e| RiverboatError::storage("init", e))?;
        }
        debug!(root = %self.root.display(), "store initialized");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generate a record id: UTC timestamp to microseconds plus a short
    /// content digest. A process-local sequence number feeds the digest so
    /// identical payloads arriving in the same microsecond still get
    /// distinct ids.
    pub fn generate_id(&self, payload: &[u8]) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%6f");
        let mut hasher = Sha256::new();
        hasher.update(payload);
        hasher.update(seq.to_le_bytes());
        let digest = hasher.finalize();
        format!("{stamp}_{}", hex_of(&digest[..4]))
    }

    /// Persist an inbound envelope under `id`.
    pub async fn save_envelope(&self, id: &str, envelope: &TaskEnvelope) -> Result<RecordMetadata> {
        let payload = serde_json::to_vec_pretty(envelope)?;
        let seed = RecordSeed {
            claim: &envelope.claim,
            task_summary: envelope.task_summary(),
            workspace_root: &envelope.workspace_root,
            attachments: &envelope.attachments,
        };
        self.write_record(id, Direction::Incoming, &payload, seed)
            .await
    }

    /// Persist an outbound package under the same `id` as its envelope.
    pub async fn save_package(
        &self,
        id: &str,
        package: &Package,
        task_summary: &str,
    ) -> Result<RecordMetadata> {
        let payload = serde_json::to_vec_pretty(package)?;
        let seed = RecordSeed {
            claim: &package.claim,
            task_summary: task_summary.to_string(),
            workspace_root: &package.workspace_root,
            attachments: &package.attachments,
        };
        self.write_record(id, Direction::Outgoing, &payload, seed)
            .await
    }

    async fn write_record(
        &self,
        id: &str,
        direction: Direction,
        payload: &[u8],
        seed: RecordSeed<'_>,
    ) -> Result<RecordMetadata> {
        let relative = format!("{}/{id}.json", direction.as_str());
        fs::write(self.root.join(&relative), payload)
            .await
            .map_err(|e| RiverboatError::storage("save", e))?;

        if !seed.attachments.is_empty() {
            self.write_attachments(id, direction, seed.attachments)
                .await?;
        }

        let metadata = RecordMetadata {
            id: id.to_string(),
            direction,
            timestamp: Utc::now(),
            checksum: hex_of(&Sha256::digest(payload)),
            size_bytes: payload.len() as u64,
            workspace_root: seed.workspace_root.to_string(),
            claim_type: seed.claim.to_string(),
            task_summary: seed.task_summary,
            attachment_count: seed.attachments.len(),
            storage_path: relative,
        };
        let encoded = serde_json::to_vec_pretty(&metadata)?;
        fs::write(self.metadata_path(id, direction), encoded)
            .await
            .map_err(|e| RiverboatError::storage("save", e))?;

        debug!(id, direction = %direction, bytes = metadata.size_bytes, "record persisted");
        Ok(metadata)
    }

    async fn write_attachments(
        &self,
        id: &str,
        direction: Direction,
        attachments: &[Attachment],
    ) -> Result<()> {
        let dir = self
            .root
            .join("attachments")
            .join(id)
            .join(direction.as_str());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| RiverboatError::storage("save", e))?;

        for attachment in attachments {
            let name = utf8_percent_encode(&attachment.path, FILE_NAME).to_string();
            fs::write(dir.join(&name), &attachment.content)
                .await
                .map_err(|e| RiverboatError::storage("save", e))?;

            let sidecar = serde_json::json!({
                "path": attachment.path,
                "mimeType": attachment.mime_type,
                "timestamp": attachment.timestamp,
                "sizeBytes": attachment.size_bytes(),
                "checksum": hex_of(&Sha256::digest(attachment.content.as_bytes())),
            });
            fs::write(
                dir.join(format!("{name}.meta.json")),
                serde_json::to_vec_pretty(&sidecar)?,
            )
            .await
            .map_err(|e| RiverboatError::storage("save", e))?;
        }
        Ok(())
    }

    fn metadata_path(&self, id: &str, direction: Direction) -> PathBuf {
        self.root
            .join("metadata")
            .join(format!("{id}.{}.json", direction.as_str()))
    }

    /// Metadata for `id`, preferring the outgoing record when both exist.
    pub async fn metadata(&self, id: &str) -> Result<Option<RecordMetadata>> {
        for direction in LOOKUP {
            if let Some(metadata) = self.metadata_for(id, direction).await? {
                return Ok(Some(metadata));
            }
        }
        Ok(None)
    }

    /// Metadata for `id` in one specific direction.
    pub async fn metadata_for(
        &self,
        id: &str,
        direction: Direction,
    ) -> Result<Option<RecordMetadata>> {
        let path = self.metadata_path(id, direction);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&path)
            .await
            .map_err(|e| RiverboatError::storage("load", e))?;
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    /// Load the payload for `id`, verifying its checksum.
    ///
    /// When both directions exist the outgoing payload is returned.
    pub async fn load(&self, id: &str) -> Result<Option<StoredRecord>> {
        let Some(metadata) = self.metadata(id).await? else {
            return Ok(None);
        };
        let raw = fs::read(self.root.join(&metadata.storage_path))
            .await
            .map_err(|e| RiverboatError::storage("load", e))?;

        let checksum = hex_of(&Sha256::digest(&raw));
        if checksum != metadata.checksum {
            return Err(RiverboatError::storage(
                "load",
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("checksum mismatch for record {id}"),
                ),
            ));
        }

        let payload = serde_json::from_slice(&raw)?;
        Ok(Some(StoredRecord { metadata, payload }))
    }

    /// List record metadata, newest first.
    ///
    /// Unreadable metadata files are skipped with a warning rather than
    /// failing the whole listing.
    pub async fn list(
        &self,
        direction: Option<Direction>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RecordMetadata>> {
        let mut records = self.read_all_metadata().await?;
        if let Some(wanted) = direction {
            records.retain(|m| m.direction == wanted);
        }
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    async fn read_all_metadata(&self) -> Result<Vec<RecordMetadata>> {
        let dir = self.root.join("metadata");
        let mut records = Vec::new();
        if !dir.exists() {
            return Ok(records);
        }
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| RiverboatError::storage("list", e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RiverboatError::storage("list", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = match fs::read(&path).await {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable metadata");
                    continue;
                }
            };
            match serde_json::from_slice::<RecordMetadata>(&raw) {
                Ok(metadata) => records.push(metadata),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping corrupt metadata");
                }
            }
        }
        Ok(records)
    }

    /// Delete every trace of `id` in all directions.
    ///
    /// Returns whether anything was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut removed = false;
        for direction in LOOKUP {
            let meta_path = self.metadata_path(id, direction);
            if !meta_path.exists() {
                continue;
            }
            if let Some(metadata) = self.metadata_for(id, direction).await? {
                let payload_path = self.root.join(&metadata.storage_path);
                if payload_path.exists() {
                    fs::remove_file(&payload_path)
                        .await
                        .map_err(|e| RiverboatError::storage("delete", e))?;
                }
            }
            fs::remove_file(&meta_path)
                .await
                .map_err(|e| RiverboatError::storage("delete", e))?;
            removed = true;
        }

        let attachment_dir = self.root.join("attachments").join(id);
        if attachment_dir.exists() {
            fs::remove_dir_all(&attachment_dir)
                .await
                .map_err(|e| RiverboatError::storage("delete", e))?;
        }

        if removed {
            debug!(id, "record deleted");
        }
        Ok(removed)
    }

    /// Delete records whose newest entry is older than `max_age_days`.
    ///
    /// Returns the number of record ids purged.
    pub async fn purge(&self, max_age_days: u32) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(max_age_days));
        let mut newest: HashMap<String, chrono::DateTime<Utc>> = HashMap::new();
        for metadata in self.read_all_metadata().await? {
            newest
                .entry(metadata.id)
                .and_modify(|stamp| *stamp = (*stamp).max(metadata.timestamp))
                .or_insert(metadata.timestamp);
        }

        let expired: HashSet<String> = newest
            .into_iter()
            .filter(|(_, stamp)| *stamp < cutoff)
            .map(|(id, _)| id)
            .collect();

        let mut purged = 0;
        for id in &expired {
            if self.delete(id).await? {
                purged += 1;
            }
        }
        if purged > 0 {
            debug!(purged, max_age_days, "retention purge complete");
        }
        Ok(purged)
    }

    /// Aggregate statistics across all stored records.
    pub async fn stats(&self) -> Result<StorageStats> {
        let mut stats = StorageStats::default();
        for metadata in self.read_all_metadata().await? {
            stats.total_records += 1;
            match metadata.direction {
                Direction::Incoming => stats.incoming += 1,
                Direction::Outgoing => stats.outgoing += 1,
                Direction::Processing => stats.processing += 1,
            }
            stats.total_size_bytes += metadata.size_bytes;
            stats.total_attachments += metadata.attachment_count as u64;
            stats.oldest = match stats.oldest {
                Some(old) => Some(old.min(metadata.timestamp)),
                None => Some(metadata.timestamp),
            };
            stats.newest = match stats.newest {
                Some(new) => Some(new.max(metadata.timestamp)),
                None => Some(metadata.timestamp),
            };
        }
        Ok(stats)
    }
}

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
