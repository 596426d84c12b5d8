//! Security validation for riverboat task envelopes.
//!
//! Every inbound envelope passes through the [`EnvelopeValidator`] before any
//! worker sees it. Validation covers eight check categories:
//!
//! | Category | Scope | Severity |
//! |----------|-------|----------|
//! | `path_traversal` | attachment paths | error |
//! | `workspace_boundary` | resolved attachment paths | error |
//! | `dangerous_patterns` | attachment content and task text | error |
//! | `sensitive_data` | attachment content and task text | error |
//! | `file_size_limits` | per-file, aggregate, and count ceilings | error |
//! | `content_validation` | null bytes, line ceilings | error |
//! | `network_access` | attachment content and task text | warning |
//! | `filesystem_access` | attachment content and task text | warning |
//!
//! Error categories fail the verdict; warning categories are recorded but do
//! not. Content rules live in [`checks`], numeric ceilings in [`limits`], and
//! path resolution in [`boundary`].

pub mod boundary;
pub mod checks;
pub mod limits;
pub mod validator;

pub use boundary::BoundaryViolation;
pub use checks::{ContentFinding, ContentRule, ContentScanner, RuleCategory, RuleSeverity};
pub use limits::ValidationLimits;
pub use validator::EnvelopeValidator;
