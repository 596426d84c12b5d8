//! Content rule engine.
//!
//! The [`ContentScanner`] runs every registered [`ContentRule`] against a
//! piece of text and produces [`ContentFinding`]s. Rules are pure pattern
//! matches with no I/O; the [`validator`](crate::validator) maps findings
//! onto verdict check categories.

mod patterns;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a content rule.
///
/// Error-severity rules fail the verdict; warning-severity rules are
/// recorded without failing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSeverity {
    Warning,
    Error,
}

impl fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Category of a content rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// Parent-directory traversal sequences embedded in content.
    PathEscape,
    /// References to sensitive system paths.
    SystemPath,
    /// Destructive shell commands.
    DestructiveCommand,
    /// Dynamic code evaluation and process spawning constructs.
    CodeInjection,
    /// Credential and secret literals.
    SensitiveData,
    /// Outbound network calls.
    NetworkAccess,
    /// Filesystem manipulation outside the workspace.
    FilesystemAccess,
}

impl RuleCategory {
    /// Whether a match in this category fails the verdict.
    pub fn is_error(self) -> bool {
        !matches!(self, Self::NetworkAccess | Self::FilesystemAccess)
    }

    /// Verdict check category this rule category feeds into.
    pub fn check_name(self) -> &'static str {
        match self {
            Self::PathEscape
            | Self::SystemPath
            | Self::DestructiveCommand
            | Self::CodeInjection => "dangerous_patterns",
            Self::SensitiveData => "sensitive_data",
            Self::NetworkAccess => "network_access",
            Self::FilesystemAccess => "filesystem_access",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathEscape => write!(f, "Path Escape"),
            Self::SystemPath => write!(f, "System Path"),
            Self::DestructiveCommand => write!(f, "Destructive Command"),
            Self::CodeInjection => write!(f, "Code Injection"),
            Self::SensitiveData => write!(f, "Sensitive Data"),
            Self::NetworkAccess => write!(f, "Network Access"),
            Self::FilesystemAccess => write!(f, "Filesystem Access"),
        }
    }
}

/// A single finding from a rule match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFinding {
    /// Rule identifier (e.g., "DC-001").
    pub rule_id: String,
    /// Human-readable rule name.
    pub rule_name: String,
    /// Category of the rule.
    pub category: RuleCategory,
    /// Severity of the finding.
    pub severity: RuleSeverity,
    /// Description of the finding.
    pub description: String,
    /// Where the finding was located (attachment path or "task").
    pub location: Option<String>,
    /// The matched content (truncated).
    pub matched_content: Option<String>,
}

/// An individual content rule definition.
#[derive(Debug, Clone)]
pub struct ContentRule {
    /// Rule identifier (e.g., "DC-001").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Category.
    pub category: RuleCategory,
    /// Severity if the rule triggers.
    pub severity: RuleSeverity,
    /// Regex pattern to match against content.
    pub pattern: regex::Regex,
}

/// Scanner that runs all registered content rules.
pub struct ContentScanner {
    rules: Vec<ContentRule>,
}

impl ContentScanner {
    /// Create a scanner with the default rule catalog loaded.
    pub fn new() -> Self {
        Self {
            rules: patterns::all_rules(),
        }
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Scan content against all registered rules.
    ///
    /// At most one finding per rule is produced for a given text; the first
    /// match wins.
    pub fn scan(&self, content: &str, location: Option<&str>) -> Vec<ContentFinding> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            if let Some(mat) = rule.pattern.find(content) {
                let matched = mat.as_str();
                let truncated = if matched.len() > 80 {
                    let cut = matched
                        .char_indices()
                        .take_while(|(i, _)| *i < 80)
                        .last()
                        .map(|(i, c)| i + c.len_utf8())
                        .unwrap_or(0);
                    format!("{}...", &matched[..cut])
                } else {
                    matched.to_string()
                };
                findings.push(ContentFinding {
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    category: rule.category,
                    severity: rule.severity,
                    description: format!("{}: {}", rule.category, rule.name),
                    location: location.map(String::from),
                    matched_content: Some(truncated),
                });
            }
        }
        findings
    }

    /// All unique categories covered by the catalog.
    pub fn categories(&self) -> Vec<RuleCategory> {
        let mut cats: Vec<RuleCategory> = Vec::new();
        for rule in &self.rules {
            if !cats.contains(&rule.category) {
                cats.push(rule.category);
            }
        }
        cats
    }
}

impl Default for ContentScanner {
    fn default() -> Self {
        Self::new()
    }
}
