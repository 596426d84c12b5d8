//! The outgoing response envelope.
//!
//! A [`Package`] is assembled by the package stage from all worker responses:
//! aggregated files and commands, suggestion summaries, synthesized response
//! attachments, a processing summary, and workflow metadata. The inbound
//! envelope's `workspace_root`, `target_os`, and context pass through
//! unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::{Attachment, EnvelopeContext};
use crate::response::{CamperResponse, FileSpec};

/// Terminal state of the audit gate for one collaboration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    /// Gate ran and found no issues.
    Passed,
    /// Gate ran and flagged at least one issue.
    Blocked,
    /// No gate was configured for the workflow.
    None,
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateStatus::Passed => write!(f, "PASSED"),
            GateStatus::Blocked => write!(f, "BLOCKED"),
            GateStatus::None => write!(f, "NONE"),
        }
    }
}

/// Workflow execution metadata attached to a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReport {
    /// Name of the workflow that ran.
    pub workflow_name: String,

    /// Roles that actually produced responses, in execution order.
    pub roles_involved: Vec<String>,

    /// Number of collaboration steps executed.
    pub step_count: usize,

    /// Audit-gate outcome.
    pub gate_status: GateStatus,
}

/// A suggestion-type response summarized for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSummary {
    /// Role that made the suggestion.
    pub role: String,

    /// Suggestion text.
    pub content: String,

    /// The worker's confidence score.
    pub confidence: f64,
}

/// Counts of what the collaboration produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingSummary {
    /// Workers that contributed a response.
    pub total_campers: usize,

    /// Files in the aggregated `files_to_create`.
    pub files_generated: usize,

    /// Commands in the aggregated `commands_to_execute`.
    pub commands_generated: usize,

    /// Suggestion summaries produced.
    pub suggestions_generated: usize,
}

/// Aggregated results of a collaboration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageResults {
    /// Every worker response, in execution order, audit flags included.
    pub responses: Vec<CamperResponse>,

    /// Files to create, aggregated across unblocked responses.
    #[serde(default)]
    pub files_to_create: Vec<FileSpec>,

    /// Commands to execute, aggregated across unblocked responses.
    #[serde(default)]
    pub commands_to_execute: Vec<String>,

    /// Suggestion-type responses, summarized.
    #[serde(default)]
    pub suggestions: Vec<SuggestionSummary>,

    /// Output counts.
    pub processing_summary: ProcessingSummary,
}

/// Package-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    /// When packaging completed.
    pub processed_at: DateTime<Utc>,

    /// True when this package was served from the cache.
    #[serde(default)]
    pub cache_hit: bool,

    /// Metadata echoed from the inbound envelope.
    #[serde(default)]
    pub original_metadata: HashMap<String, serde_json::Value>,
}

/// The outgoing response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Always "response".
    pub claim: String,

    /// Target OS passed through from the inbound envelope.
    #[serde(rename = "targetOS", alias = "targetOs")]
    pub target_os: String,

    /// Workspace root passed through from the inbound envelope.
    pub workspace_root: String,

    /// One synthesized attachment per produced file, MIME type inferred from
    /// the extension.
    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Context passed through from the inbound envelope.
    #[serde(default)]
    pub context: EnvelopeContext,

    /// Aggregated collaboration results.
    pub results: PackageResults,

    /// Workflow execution metadata.
    pub workflow: WorkflowReport,

    /// Package-level metadata.
    pub metadata: PackageMetadata,
}

impl Package {
    /// Flag this package as served from the cache.
    pub fn mark_cache_hit(&mut self) {
        self.metadata.cache_hit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseType;

    fn sample_package() -> Package {
        let mut resp = CamperResponse::suggestion("BackEndDev", "fn add(a: i32, b: i32) -> i32 { a + b }", 0.8);
        resp.response_type = ResponseType::Code;
        resp.files_to_create.push(FileSpec::new("src/add.rs", "fn add() {}"));

        Package {
            claim: "response".into(),
            target_os: "linux".into(),
            workspace_root: "/ws".into(),
            attachments: vec![Attachment::new("src/add.rs", "fn add() {}")],
            context: EnvelopeContext {
                current_file: Some("src/main.rs".into()),
                ..EnvelopeContext::default()
            },
            results: PackageResults {
                responses: vec![resp],
                files_to_create: vec![FileSpec::new("src/add.rs", "fn add() {}")],
                commands_to_execute: vec![],
                suggestions: vec![],
                processing_summary: ProcessingSummary {
                    total_campers: 1,
                    files_generated: 1,
                    commands_generated: 0,
                    suggestions_generated: 0,
                },
            },
            workflow: WorkflowReport {
                workflow_name: "feature_development".into(),
                roles_involved: vec!["BackEndDev".into()],
                step_count: 1,
                gate_status: GateStatus::Passed,
            },
            metadata: PackageMetadata {
                processed_at: Utc::now(),
                cache_hit: false,
                original_metadata: HashMap::new(),
            },
        }
    }

    #[test]
    fn gate_status_display_is_upper() {
        assert_eq!(GateStatus::Passed.to_string(), "PASSED");
        assert_eq!(GateStatus::Blocked.to_string(), "BLOCKED");
        assert_eq!(GateStatus::None.to_string(), "NONE");
    }

    #[test]
    fn gate_status_serde_is_screaming() {
        assert_eq!(serde_json::to_string(&GateStatus::Blocked).unwrap(), "\"BLOCKED\"");
        let parsed: GateStatus = serde_json::from_str("\"PASSED\"").unwrap();
        assert_eq!(parsed, GateStatus::Passed);
    }

    #[test]
    fn package_serde_roundtrip() {
        let pkg = sample_package();
        let json = serde_json::to_string(&pkg).unwrap();
        assert!(json.contains("\"workspaceRoot\""));
        assert!(json.contains("\"targetOS\""));
        assert!(json.contains("\"processingSummary\""));
        let restored: Package = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, pkg);
    }

    #[test]
    fn mark_cache_hit_sets_flag() {
        let mut pkg = sample_package();
        assert!(!pkg.metadata.cache_hit);
        pkg.mark_cache_hit();
        assert!(pkg.metadata.cache_hit);
    }

    #[test]
    fn context_passthrough_preserved() {
        let pkg = sample_package();
        assert_eq!(pkg.context.current_file.as_deref(), Some("src/main.rs"));
        assert_eq!(pkg.workspace_root, "/ws");
        assert_eq!(pkg.target_os, "linux");
    }
}
