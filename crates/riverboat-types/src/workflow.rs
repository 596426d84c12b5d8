//! Workflow and worker configuration entities.
//!
//! A [`Workflow`] names an ordered sequence of worker roles plus gating and
//! parallelism flags. A [`WorkerConfig`] is the closed record interpreted by
//! the generic worker implementation -- there is no runtime class synthesis;
//! every worker is the same code driven by one of these.
//!
//! Both are loaded from configuration sources at startup/reload and are
//! immutable until the next explicit reload, at which point the whole set is
//! swapped atomically.

use serde::{Deserialize, Serialize};

/// A named, ordered sequence of worker roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Unique workflow name (also used as the claim-type key).
    pub name: String,

    /// Roles to run, in order.
    pub sequence: Vec<String>,

    /// Run the audit gate after the sequence completes.
    #[serde(default)]
    pub audit_gate: bool,

    /// Dispatch all roles concurrently instead of sequentially.
    #[serde(default)]
    pub parallel_execution: bool,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Workflow {
    /// Create a sequential workflow with no audit gate.
    pub fn new(name: impl Into<String>, sequence: Vec<String>) -> Self {
        Self {
            name: name.into(),
            sequence,
            audit_gate: false,
            parallel_execution: false,
            description: None,
        }
    }
}

/// Code-extraction settings for a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeGeneration {
    /// Extract fenced code blocks into `files_to_create`.
    #[serde(default)]
    pub enabled: bool,

    /// Extension for unnamed extracted files.
    #[serde(default = "default_file_extension")]
    pub default_file_extension: String,
}

fn default_file_extension() -> String {
    ".txt".to_string()
}

impl Default for CodeGeneration {
    fn default() -> Self {
        Self {
            enabled: false,
            default_file_extension: default_file_extension(),
        }
    }
}

/// Command-extraction settings for a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandGeneration {
    /// Extract command lines into `commands_to_execute`.
    #[serde(default)]
    pub enabled: bool,

    /// Cap on extracted commands.
    #[serde(default = "default_max_commands")]
    pub max_commands: usize,
}

fn default_max_commands() -> usize {
    5
}

impl Default for CommandGeneration {
    fn default() -> Self {
        Self {
            enabled: false,
            max_commands: default_max_commands(),
        }
    }
}

/// Configuration record for one named worker role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    /// Role name (e.g. "BackEndDev", "Auditor").
    pub role: String,

    /// Prompt template with `{task}` and `{os}` placeholders.
    pub prompt_template: String,

    /// System prompt sent alongside every generation request.
    #[serde(default)]
    pub system_prompt: String,

    /// Declared specializations, used for relevance and response typing.
    #[serde(default)]
    pub specializations: Vec<String>,

    /// Confidence assigned to successful responses; also the audit-gate
    /// floor.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Cap on generated response length in characters.
    #[serde(default = "default_max_response_length")]
    pub max_response_length: usize,

    /// File-extraction settings.
    #[serde(default)]
    pub code_generation: CodeGeneration,

    /// Command-extraction settings.
    #[serde(default)]
    pub command_generation: CommandGeneration,
}

fn default_confidence_threshold() -> f64 {
    0.7
}

fn default_max_response_length() -> usize {
    2000
}

impl WorkerConfig {
    /// Create a minimal suggestion-only worker.
    pub fn new(role: impl Into<String>, prompt_template: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            prompt_template: prompt_template.into(),
            system_prompt: String::new(),
            specializations: Vec::new(),
            confidence_threshold: default_confidence_threshold(),
            max_response_length: default_max_response_length(),
            code_generation: CodeGeneration::default(),
            command_generation: CommandGeneration::default(),
        }
    }

    /// Whether this worker declares any of the given specializations.
    pub fn has_any_specialization(&self, names: &[&str]) -> bool {
        self.specializations
            .iter()
            .any(|s| names.contains(&s.as_str()))
    }
}
