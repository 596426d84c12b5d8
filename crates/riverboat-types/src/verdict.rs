//! Security validation verdict types.
//!
//! A [`ValidationVerdict`] is produced exactly once per envelope by the
//! validate stage and never re-validated in place. It aggregates per-category
//! check results, itemized errors and warnings, and a derived security level.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single check category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
    Warning,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Passed => write!(f, "passed"),
            CheckStatus::Failed => write!(f, "failed"),
            CheckStatus::Warning => write!(f, "warning"),
        }
    }
}

/// Result of one named check category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Passed, failed, or warning.
    pub status: CheckStatus,

    /// Finding details for this category, one entry per match.
    #[serde(default)]
    pub details: Vec<String>,
}

impl CheckResult {
    pub fn passed() -> Self {
        Self {
            status: CheckStatus::Passed,
            details: Vec::new(),
        }
    }
}

/// Derived ordinal severity of a verdict, worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    /// No errors, no warnings.
    Secure,
    /// Warnings only.
    MediumRisk,
    /// One or two errors.
    HighRisk,
    /// Three or more errors, or any boundary/traversal error.
    CriticalFailure,
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityLevel::Secure => write!(f, "secure"),
            SecurityLevel::MediumRisk => write!(f, "medium_risk"),
            SecurityLevel::HighRisk => write!(f, "high_risk"),
            SecurityLevel::CriticalFailure => write!(f, "critical_failure"),
        }
    }
}

/// The security verdict for one envelope.
///
/// `secure` is true exactly when `errors` is empty. The `checks` map is keyed
/// by category name (`path_traversal`, `workspace_boundary`,
/// `dangerous_patterns`, `file_size_limits`, `content_validation`,
/// `sensitive_data`, `network_access`, `filesystem_access`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    /// True when no error-severity findings were recorded.
    pub secure: bool,

    /// Per-category results, keyed by category name.
    pub checks: BTreeMap<String, CheckResult>,

    /// Error-severity findings. Any entry fails the verdict.
    #[serde(default)]
    pub errors: Vec<String>,

    /// Warning-severity findings. Recorded but do not fail the verdict.
    #[serde(default)]
    pub warnings: Vec<String>,

    /// Derived ordinal severity.
    pub security_level: SecurityLevel,

    /// When validation ran.
    pub validated_at: DateTime<Utc>,
}

impl ValidationVerdict {
    /// Build a verdict from accumulated check results, deriving `secure` and
    /// the security level.
    pub fn from_checks(
        checks: BTreeMap<String, CheckResult>,
        errors: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        let secure = errors.is_empty();
        let boundary_failed = checks
            .get("path_traversal")
            .map(|c| c.status == CheckStatus::Failed)
            .unwrap_or(false)
            || checks
                .get("workspace_boundary")
                .map(|c| c.status == CheckStatus::Failed)
                .unwrap_or(false);

        let security_level = if errors.len() >= 3 || (boundary_failed && !errors.is_empty()) {
            SecurityLevel::CriticalFailure
        } else if !errors.is_empty() {
            SecurityLevel::HighRisk
        } else if !warnings.is_empty() {
            SecurityLevel::MediumRisk
        } else {
            SecurityLevel::Secure
        };

        Self {
            secure,
            checks,
            errors,
            warnings,
            security_level,
            validated_at: Utc::now(),
        }
    }

    /// First error message, used when reporting a rejection.
    pub fn primary_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    /// Name of the first failed check category, if any.
    pub fn first_failed_category(&self) -> Option<&str> {
        self.checks
            .iter()
            .find(|(_, result)| result.status == CheckStatus::Failed)
            .map(|(name, _)| name.as_str())
    }
}
