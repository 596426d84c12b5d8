//! The audit gate.
//!
//! Runs after the collaboration sequence when the workflow asks for it.
//! The gate never edits content; on failure it flags every code-type
//! response as publication-blocked with a shared reason and leaves the
//! batch otherwise intact for the caller to inspect.

use tracing::{debug, warn};

use riverboat_security::ContentScanner;
use riverboat_types::package::GateStatus;
use riverboat_types::response::{CamperResponse, ResponseType};

/// Specializations that mark a worker as audit-capable.
pub const AUDIT_SPECIALIZATIONS: [&str; 2] = ["security_analysis", "code_quality_review"];

/// Reason shared by every response blocked in one batch.
const BLOCK_REASON: &str = "Failed audit gate verification";

/// Confidence floor below which a response fails the gate.
const CONFIDENCE_FLOOR: f64 = 0.7;

/// Outcome of one gate run.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub status: GateStatus,
    pub issues: Vec<String>,
}

/// Deterministic checks applied to a finished response batch.
pub struct AuditGate {
    scanner: ContentScanner,
    confidence_floor: f64,
}

impl AuditGate {
    pub fn new() -> Self {
        Self {
            scanner: ContentScanner::new(),
            confidence_floor: CONFIDENCE_FLOOR,
        }
    }

    /// Audit a response batch against `expected_roles` (the workflow
    /// sequence). Blocks code-type responses in place on failure.
    pub fn audit(
        &self,
        responses: &mut [CamperResponse],
        expected_roles: &[String],
    ) -> AuditOutcome {
        let mut issues = Vec::new();

        for response in responses.iter() {
            if response.confidence_score < self.confidence_floor {
                issues.push(format!(
                    "{} confidence {:.2} is below the {:.2} floor",
                    response.role, response.confidence_score, self.confidence_floor
                ));
            }

            for file in &response.files_to_create {
                if file.content.trim().is_empty() {
                    issues.push(format!("{}: generated file is empty", file.path));
                } else if !brackets_balanced(&file.content) {
                    issues.push(format!("{}: unbalanced brackets", file.path));
                }
                for finding in self.scanner.scan(&file.content, Some(&file.path)) {
                    if finding.category.is_error() {
                        issues.push(format!("{}: {}", file.path, finding.description));
                    }
                }
            }

            for command in &response.commands_to_execute {
                for finding in self.scanner.scan(command, None) {
                    if finding.category.is_error() {
                        issues.push(format!("command '{command}': {}", finding.description));
                    }
                }
            }
        }

        for role in expected_roles {
            if !responses.iter().any(|r| r.role == *role) {
                issues.push(format!("expected role {role} produced no response"));
            }
        }

        if issues.is_empty() {
            debug!(responses = responses.len(), "audit gate passed");
            return AuditOutcome {
                status: GateStatus::Passed,
                issues,
            };
        }

        for response in responses.iter_mut() {
            if response.response_type == ResponseType::Code {
                response.block(BLOCK_REASON);
            }
        }
        warn!(issues = issues.len(), "audit gate blocked the batch");
        AuditOutcome {
            status: GateStatus::Blocked,
            issues,
        }
    }
}

impl Default for AuditGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Naive bracket balance over `()`, `[]`, `{}`. String literals are not
/// parsed; this is a cheap syntax screen, not a parser.
fn brackets_balanced(content: &str) -> bool {
    let mut stack = Vec::new();
    for ch in content.chars() {
        match ch {
            '(' | '[' | '{' => stack.push(ch),
            ')' => {
                if stack.pop() != Some('(') {
                    return false;
                }
            }
            ']' => {
                if stack.pop() != Some('[') {
                    return false;
                }
            }
            '}' => {
                if stack.pop() != Some('{') {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}
