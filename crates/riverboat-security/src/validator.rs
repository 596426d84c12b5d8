//! Envelope validation entry point.

use std::collections::BTreeMap;
use std::path::Path;

use riverboat_types::envelope::TaskEnvelope;
use riverboat_types::verdict::{CheckResult, CheckStatus, ValidationVerdict};
use tracing::debug;

use crate::boundary::{self, BoundaryViolation};
use crate::checks::ContentScanner;
use crate::limits::ValidationLimits;

/// Error-severity check categories, in reporting order.
const ERROR_CHECKS: [&str; 6] = [
    "path_traversal",
    "workspace_boundary",
    "dangerous_patterns",
    "sensitive_data",
    "file_size_limits",
    "content_validation",
];

/// Warning-severity check categories.
const WARNING_CHECKS: [&str; 2] = ["network_access", "filesystem_access"];

/// Runs every security check over an envelope and produces the verdict.
///
/// Validation is pure with one exception: the boundary check consults the
/// filesystem to catch symlinks under the workspace root that point outside
/// it.
pub struct EnvelopeValidator {
    scanner: ContentScanner,
    limits: ValidationLimits,
}

impl EnvelopeValidator {
    /// Validator with the default rule catalog and ceilings.
    pub fn new() -> Self {
        Self::with_limits(ValidationLimits::default())
    }

    /// Validator with custom ceilings.
    pub fn with_limits(limits: ValidationLimits) -> Self {
        Self {
            scanner: ContentScanner::new(),
            limits,
        }
    }

    /// Validate one envelope. Produces the verdict exactly once; callers
    /// never re-validate in place.
    pub fn validate(&self, envelope: &TaskEnvelope) -> ValidationVerdict {
        let mut findings: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for name in ERROR_CHECKS.iter().chain(WARNING_CHECKS.iter()) {
            findings.insert(name, Vec::new());
        }

        if envelope.workspace_root.trim().is_empty() {
            record(
                &mut findings,
                "workspace_boundary",
                "no workspace root specified".to_string(),
            );
        }

        let root = Path::new(&envelope.workspace_root);
        for attachment in &envelope.attachments {
            match boundary::check_path(root, &attachment.path) {
                Ok(_) => {}
                Err(err @ BoundaryViolation::Traversal { .. }) => {
                    record(&mut findings, "path_traversal", format!("{}: {err}", attachment.path));
                }
                Err(err) => {
                    record(&mut findings, "workspace_boundary", format!("{}: {err}", attachment.path));
                }
            }
        }

        for error in self.limits.check_sizes(&envelope.attachments) {
            record(&mut findings, "file_size_limits", error);
        }

        self.scan_text(&mut findings, "task", &envelope.task);
        for attachment in &envelope.attachments {
            self.scan_text(&mut findings, &attachment.path, &attachment.content);
            for error in self.limits.check_content(&attachment.path, &attachment.content) {
                record(&mut findings, "content_validation", error);
            }
        }

        let mut errors = Vec::new();
        for name in ERROR_CHECKS {
            if let Some(entries) = findings.get(name) {
                errors.extend(entries.iter().cloned());
            }
        }
        let mut warnings = Vec::new();
        for name in WARNING_CHECKS {
            if let Some(entries) = findings.get(name) {
                warnings.extend(entries.iter().cloned());
            }
        }

        let mut checks = BTreeMap::new();
        for name in ERROR_CHECKS {
            checks.insert(name.to_string(), check_result(&findings, name, CheckStatus::Failed));
        }
        for name in WARNING_CHECKS {
            checks.insert(name.to_string(), check_result(&findings, name, CheckStatus::Warning));
        }

        let verdict = ValidationVerdict::from_checks(checks, errors, warnings);
        debug!(
            claim = %envelope.claim,
            secure = verdict.secure,
            level = %verdict.security_level,
            errors = verdict.errors.len(),
            warnings = verdict.warnings.len(),
            "envelope validated"
        );
        verdict
    }

    fn scan_text(
        &self,
        findings: &mut BTreeMap<&'static str, Vec<String>>,
        location: &str,
        content: &str,
    ) {
        for finding in self.scanner.scan(content, Some(location)) {
            let message = format!("{} in {}: {}", finding.category, location, finding.rule_name);
            record(findings, finding.category.check_name(), message);
        }
    }
}

fn record(
    findings: &mut BTreeMap<&'static str, Vec<String>>,
    check: &'static str,
    message: String,
) {
    findings.entry(check).or_default().push(message);
}

impl Default for EnvelopeValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_result(
    findings: &BTreeMap<&'static str, Vec<String>>,
    name: &str,
    failure_status: CheckStatus,
) -> CheckResult {
    match findings.get(name) {
        Some(entries) if !entries.is_empty() => CheckResult {
            status: failure_status,
            details: entries.clone(),
        },
        _ => CheckResult::passed(),
    }
}
