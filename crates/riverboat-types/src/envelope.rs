//! The inbound task envelope and its parts.
//!
//! A [`TaskEnvelope`] is the unit of work submitted to the pipeline: a claim
//! (task kind), a free-text task description, the workspace root that bounds
//! all attachment paths, the attachments themselves, and editor/terminal
//! context. The wire shape is camelCase JSON.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file attached to a task envelope.
///
/// `path` is relative to the envelope's `workspace_root`; validation rejects
/// any path that escapes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Path relative to the workspace root.
    pub path: String,

    /// Full file content (text).
    pub content: String,

    /// Declared MIME type.
    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    /// When the attachment was captured.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

fn default_mime_type() -> String {
    "text/plain".to_string()
}

impl Attachment {
    /// Create an attachment with the default MIME type and current timestamp.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            mime_type: default_mime_type(),
            timestamp: Utc::now(),
        }
    }

    /// Content size in bytes (UTF-8).
    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }
}

/// Editor and terminal context accompanying a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeContext {
    /// The file currently open in the editor, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,

    /// Paths making up the project tree.
    #[serde(default)]
    pub project_structure: Vec<String>,

    /// Recent terminal lines.
    #[serde(default)]
    pub terminal_history: Vec<String>,
}

/// The unit of work submitted to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEnvelope {
    /// Task kind (e.g. "generate_code", "review", "execute").
    pub claim: String,

    /// Free-text task description.
    pub task: String,

    /// Target operating system (e.g. "linux", "windows").
    #[serde(default = "default_target_os", rename = "targetOS", alias = "targetOs")]
    pub target_os: String,

    /// Path bounding all attachment paths. Must be non-empty to pass
    /// validation.
    pub workspace_root: String,

    /// Ordered file attachments.
    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Editor/terminal context.
    #[serde(default)]
    pub context: EnvelopeContext,

    /// Open string-keyed metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_target_os() -> String {
    "linux".to_string()
}

impl TaskEnvelope {
    /// Create a minimal envelope with no attachments or context.
    pub fn new(
        claim: impl Into<String>,
        task: impl Into<String>,
        workspace_root: impl Into<String>,
    ) -> Self {
        Self {
            claim: claim.into(),
            task: task.into(),
            target_os: default_target_os(),
            workspace_root: workspace_root.into(),
            attachments: Vec::new(),
            context: EnvelopeContext::default(),
            metadata: HashMap::new(),
        }
    }

    /// Total attachment content size in bytes.
    pub fn total_attachment_bytes(&self) -> usize {
        self.attachments.iter().map(Attachment::size_bytes).sum()
    }

    /// Task text truncated to 100 characters, for record metadata.
    pub fn task_summary(&self) -> String {
        self.task.chars().take(100).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serde_roundtrip() {
        let mut env = TaskEnvelope::new("generate_code", "add two numbers", "/ws");
        env.attachments.push(Attachment::new("src/main.rs", "fn main() {}"));
        env.context.current_file = Some("src/main.rs".into());

        let json = serde_json::to_string(&env).unwrap();
        let restored: TaskEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.claim, "generate_code");
        assert_eq!(restored.workspace_root, "/ws");
        assert_eq!(restored.attachments.len(), 1);
        assert_eq!(restored.context.current_file.as_deref(), Some("src/main.rs"));
    }

    #[test]
    fn envelope_wire_shape_is_camel_case() {
        let env = TaskEnvelope::new("review", "check style", "/ws");
        let json = serde_json::to_string(&env).unwrap();
        assert!(json.contains("\"workspaceRoot\""));
        assert!(json.contains("\"targetOS\""));
        assert!(!json.contains("\"workspace_root\""));
    }

    #[test]
    fn envelope_defaults_on_missing_fields() {
        let json = r#"{
            "claim": "generate_code",
            "task": "write a parser",
            "workspaceRoot": "/home/dev/project"
        }"#;
        let env: TaskEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.target_os, "linux");
        assert!(env.attachments.is_empty());
        assert!(env.context.project_structure.is_empty());
        assert!(env.metadata.is_empty());
    }

    #[test]
    fn attachment_mime_type_defaults() {
        let json = r#"{"path": "a.txt", "content": "hello"}"#;
        let att: Attachment = serde_json::from_str(json).unwrap();
        assert_eq!(att.mime_type, "text/plain");
        assert_eq!(att.size_bytes(), 5);
    }

    #[test]
    fn total_attachment_bytes_sums_contents() {
        let mut env = TaskEnvelope::new("x", "y", "/ws");
        env.attachments.push(Attachment::new("a", "12345"));
        env.attachments.push(Attachment::new("b", "678"));
        assert_eq!(env.total_attachment_bytes(), 8);
    }

    #[test]
    fn task_summary_truncates_to_100_chars() {
        let long = "x".repeat(250);
        let env = TaskEnvelope::new("c", long, "/ws");
        assert_eq!(env.task_summary().len(), 100);

        let short = TaskEnvelope::new("c", "short task", "/ws");
        assert_eq!(short.task_summary(), "short task");
    }
}
