//! Worker response types.
//!
//! A [`CamperResponse`] is one worker's contribution to a collaboration run.
//! Responses are created by workers, appended to the shared context by the
//! collaborate stage, and never mutated afterwards except by the audit gate,
//! which may only set the publication-blocked flag and reason.

use serde::{Deserialize, Serialize};

/// Kind of output a worker produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Generated source files.
    Code,
    /// Free-text advice or analysis.
    Suggestion,
    /// Shell commands to run.
    Command,
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseType::Code => write!(f, "code"),
            ResponseType::Suggestion => write!(f, "suggestion"),
            ResponseType::Command => write!(f, "command"),
        }
    }
}

/// A file a worker wants created, as `path` + full `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSpec {
    /// Path relative to the workspace root.
    pub path: String,
    /// Full file content.
    pub content: String,
}

impl FileSpec {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// One worker's contribution to a collaboration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CamperResponse {
    /// Role that produced this response (e.g. "BackEndDev").
    pub role: String,

    /// What kind of output this is.
    pub response_type: ResponseType,

    /// The raw generated text.
    pub content: String,

    /// Files extracted from the generated text.
    #[serde(default)]
    pub files_to_create: Vec<FileSpec>,

    /// Commands extracted from the generated text.
    #[serde(default)]
    pub commands_to_execute: Vec<String>,

    /// Worker self-assessed confidence in `[0, 1]`.
    pub confidence_score: f64,

    /// Set by the audit gate when publication is blocked.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub publication_blocked: bool,

    /// Why the audit gate blocked this response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

impl CamperResponse {
    /// Create a suggestion-type response with no files or commands.
    pub fn suggestion(role: impl Into<String>, content: impl Into<String>, confidence: f64) -> Self {
        Self {
            role: role.into(),
            response_type: ResponseType::Suggestion,
            content: content.into(),
            files_to_create: Vec::new(),
            commands_to_execute: Vec::new(),
            confidence_score: confidence,
            publication_blocked: false,
            block_reason: None,
        }
    }

    /// Mark this response blocked with the given reason. Only the audit gate
    /// calls this.
    pub fn block(&mut self, reason: impl Into<String>) {
        self.publication_blocked = true;
        self.block_reason = Some(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_type_display() {
        assert_eq!(ResponseType::Code.to_string(), "code");
        assert_eq!(ResponseType::Suggestion.to_string(), "suggestion");
        assert_eq!(ResponseType::Command.to_string(), "command");
    }

    #[test]
    fn response_type_serde_is_snake_case() {
        let json = serde_json::to_string(&ResponseType::Code).unwrap();
        assert_eq!(json, "\"code\"");
        let parsed: ResponseType = serde_json::from_str("\"suggestion\"").unwrap();
        assert_eq!(parsed, ResponseType::Suggestion);
    }

    #[test]
    fn suggestion_constructor() {
        let resp = CamperResponse::suggestion("RequirementsGatherer", "use a queue", 0.8);
        assert_eq!(resp.role, "RequirementsGatherer");
        assert_eq!(resp.response_type, ResponseType::Suggestion);
        assert!(resp.files_to_create.is_empty());
        assert!(!resp.publication_blocked);
    }

    #[test]
    fn block_sets_flag_and_reason() {
        let mut resp = CamperResponse::suggestion("BackEndDev", "code here", 0.9);
        resp.block("Failed audit gate verification");
        assert!(resp.publication_blocked);
        assert_eq!(
            resp.block_reason.as_deref(),
            Some("Failed audit gate verification")
        );
    }

    #[test]
    fn unblocked_response_omits_block_fields_in_json() {
        let resp = CamperResponse::suggestion("Tester", "looks fine", 0.75);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("publicationBlocked"));
        assert!(!json.contains("blockReason"));
    }

    #[test]
    fn blocked_response_serde_roundtrip() {
        let mut resp = CamperResponse::suggestion("BackEndDev", "x", 0.5);
        resp.response_type = ResponseType::Code;
        resp.files_to_create.push(FileSpec::new("a.rs", "fn a() {}"));
        resp.block("low confidence");

        let json = serde_json::to_string(&resp).unwrap();
        let restored: CamperResponse = serde_json::from_str(&json).unwrap();
        assert!(restored.publication_blocked);
        assert_eq!(restored.files_to_create.len(), 1);
        assert_eq!(restored.block_reason.as_deref(), Some("low confidence"));
    }
}
