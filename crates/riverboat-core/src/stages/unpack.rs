//! Stage 1: unpack the envelope into a working task.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use riverboat_types::envelope::{EnvelopeContext, TaskEnvelope};
use riverboat_types::{Result, RiverboatError};

/// The working view of an envelope used by the rest of the pipeline.
///
/// Attachments are flattened into path-keyed maps; context and metadata pass
/// through so packaging can echo them unchanged.
#[derive(Debug, Clone)]
pub struct UnpackedTask {
    pub claim: String,
    pub task: String,
    pub target_os: String,
    pub workspace_root: String,

    /// Attachment path to content.
    pub file_contents: BTreeMap<String, String>,

    /// Attachment path to declared MIME type.
    pub file_types: BTreeMap<String, String>,

    pub context: EnvelopeContext,
    pub metadata: HashMap<String, serde_json::Value>,
    pub unpacked_at: DateTime<Utc>,
}

/// Pure extraction from envelope to working task.
///
/// A missing claim or task is a structural error; this is the shape check,
/// not the security check. A missing workspace root is a boundary failure
/// and belongs to validation.
pub fn unpack(envelope: &TaskEnvelope) -> Result<UnpackedTask> {
    if envelope.claim.trim().is_empty() {
        return Err(RiverboatError::Structural {
            reason: "claim must not be empty".into(),
        });
    }
    if envelope.task.trim().is_empty() {
        return Err(RiverboatError::Structural {
            reason: "task must not be empty".into(),
        });
    }
    let mut file_contents = BTreeMap::new();
    let mut file_types = BTreeMap::new();
    for attachment in &envelope.attachments {
        file_contents.insert(attachment.path.clone(), attachment.content.clone());
        file_types.insert(attachment.path.clone(), attachment.mime_type.clone());
    }

    Ok(UnpackedTask {
        claim: envelope.claim.clone(),
        task: envelope.task.clone(),
        target_os: envelope.target_os.clone(),
        workspace_root: envelope.workspace_root.clone(),
        file_contents,
        file_types,
        context: envelope.context.clone(),
        metadata: envelope.metadata.clone(),
        unpacked_at: Utc::now(),
    })
}
