//! Error taxonomy for the Riverboat pipeline.
//!
//! Provides [`RiverboatError`] as the top-level error type. Variants are
//! grouped into terminal rejections (security, structural), recoverable
//! failures (network, timeout, resource), and infrastructure failures
//! (processing, storage, config, I/O). Every error exposes a machine code,
//! a user-facing message, suggested actions, a severity, and a retryability
//! hint; the orchestrator is the only layer that translates anything into
//! this taxonomy.

use thiserror::Error;

/// Severity attached to each taxonomy error, worst last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "low"),
            ErrorSeverity::Medium => write!(f, "medium"),
            ErrorSeverity::High => write!(f, "high"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Top-level error type for the Riverboat pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RiverboatError {
    // ── Terminal rejections ──────────────────────────────────────────

    /// Security validation failed. Never retryable; the envelope is
    /// rejected outright.
    #[error("security validation failed ({category}): {reason}")]
    Security {
        /// Failing check category (e.g. "path_traversal").
        category: String,
        /// First validation error recorded.
        reason: String,
    },

    /// The envelope is structurally malformed (missing claim/task, bad
    /// shape). Never retryable.
    #[error("invalid envelope: {reason}")]
    Structural {
        /// What is wrong with the envelope.
        reason: String,
    },

    // ── Recoverable ──────────────────────────────────────────────────

    /// A call to an external collaborator failed at the network layer.
    #[error("network error during {operation}: {message}")]
    Network {
        /// Operation that was in flight.
        operation: String,
        /// Underlying failure description.
        message: String,
    },

    /// An operation (or the whole pipeline) exceeded its deadline.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Human-readable name of the operation that timed out.
        operation: String,
    },

    /// A size or count ceiling was exceeded. Retryable after the client
    /// adjusts the payload.
    #[error("resource limit exceeded ({kind}): {reason}")]
    Resource {
        /// Which ceiling (e.g. "file_size", "attachment_count").
        kind: String,
        /// What exceeded it.
        reason: String,
    },

    // ── Infrastructure ───────────────────────────────────────────────

    /// A pipeline stage failed. Wrapped with stage identity and operation
    /// name by the orchestrator.
    #[error("processing failed in {stage} during {operation}: {source}")]
    Processing {
        /// Stage that failed (e.g. "collaborate").
        stage: String,
        /// Operation within the stage (e.g. "execute_workflow").
        operation: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O failure against the durable store, with operation context.
    #[error("storage operation failed ({operation}): {source}")]
    Storage {
        /// Store operation that failed (e.g. "save", "load", "purge").
        operation: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration is malformed or semantically invalid.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// Underlying I/O error without storage context.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RiverboatError {
    /// Build a [`RiverboatError::Processing`] from a stage, an operation,
    /// and any error.
    pub fn processing(
        stage: impl Into<String>,
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Processing {
            stage: stage.into(),
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Build a [`RiverboatError::Storage`] from an operation and an I/O
    /// error.
    pub fn storage(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            operation: operation.into(),
            source,
        }
    }

    /// Machine-readable error code.
    ///
    /// Security codes follow `SECURITY_{CATEGORY}_FAILED`, processing codes
    /// `PROCESSING_{STAGE}_{OPERATION}_FAILED`, resource codes
    /// `RESOURCE_{KIND}_EXCEEDED`; storage codes collapse to the specific
    /// permission/not-found/no-space cases when the I/O kind identifies one.
    pub fn code(&self) -> String {
        match self {
            Self::Security { category, .. } => {
                format!("SECURITY_{}_FAILED", category.to_uppercase())
            }
            Self::Structural { .. } => "ENVELOPE_INVALID".to_string(),
            Self::Network { message, .. } => {
                let lower = message.to_lowercase();
                if lower.contains("timeout") || lower.contains("timed out") {
                    "NETWORK_TIMEOUT".to_string()
                } else if lower.contains("connect") {
                    "NETWORK_CONNECTION_ERROR".to_string()
                } else {
                    "NETWORK_ERROR".to_string()
                }
            }
            Self::Timeout { .. } => "OPERATION_TIMEOUT".to_string(),
            Self::Resource { kind, .. } => {
                format!("RESOURCE_{}_EXCEEDED", kind.to_uppercase())
            }
            Self::Processing { stage, operation, .. } => format!(
                "PROCESSING_{}_{}_FAILED",
                stage.to_uppercase(),
                operation.to_uppercase()
            ),
            Self::Storage { operation, source } => match source.kind() {
                std::io::ErrorKind::PermissionDenied => "STORAGE_PERMISSION_DENIED".to_string(),
                std::io::ErrorKind::NotFound => "STORAGE_NOT_FOUND".to_string(),
                std::io::ErrorKind::StorageFull => "STORAGE_NO_SPACE".to_string(),
                _ => format!("STORAGE_{}_FAILED", operation.to_uppercase()),
            },
            Self::ConfigInvalid { .. } => "CONFIG_INVALID".to_string(),
            Self::Io(_) => "IO_ERROR".to_string(),
            Self::Json(_) => "JSON_ERROR".to_string(),
        }
    }

    /// User-facing message for this error. Falls back to the technical
    /// message when no friendlier wording exists for the code.
    pub fn user_message(&self) -> String {
        match self.code().as_str() {
            "SECURITY_PATH_TRAVERSAL_FAILED" => {
                "Security check failed: Invalid file path detected".to_string()
            }
            "SECURITY_WORKSPACE_BOUNDARY_FAILED" => {
                "Security check failed: File path outside workspace".to_string()
            }
            "SECURITY_DANGEROUS_PATTERNS_FAILED" => {
                "Security check failed: Potentially dangerous content detected".to_string()
            }
            "SECURITY_FILE_SIZE_LIMITS_FAILED" => {
                "Security check failed: File size limits exceeded".to_string()
            }
            "ENVELOPE_INVALID" => "Invalid request format. Please check your input.".to_string(),
            "NETWORK_TIMEOUT" => "Request timed out. Please try again.".to_string(),
            "NETWORK_CONNECTION_ERROR" => "Unable to connect to external service.".to_string(),
            "STORAGE_PERMISSION_DENIED" => {
                "Permission denied. Please check file permissions.".to_string()
            }
            "STORAGE_NO_SPACE" => "Insufficient storage space available.".to_string(),
            "OPERATION_TIMEOUT" => {
                "Operation took too long to complete. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Suggested remediation steps for this error.
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self.code().as_str() {
            "SECURITY_PATH_TRAVERSAL_FAILED" => {
                vec!["Check file paths", "Ensure paths are relative to the workspace"]
            }
            "SECURITY_WORKSPACE_BOUNDARY_FAILED" => {
                vec!["Verify workspace configuration", "Check file paths"]
            }
            "SECURITY_DANGEROUS_PATTERNS_FAILED" => {
                vec!["Review content for security issues", "Contact an administrator"]
            }
            "ENVELOPE_INVALID" => vec!["Check the request format", "Validate input data"],
            "NETWORK_TIMEOUT" => {
                vec!["Check the network connection", "Retry the request", "Increase the timeout"]
            }
            "NETWORK_CONNECTION_ERROR" => {
                vec!["Check service status", "Verify network connectivity"]
            }
            "STORAGE_PERMISSION_DENIED" => {
                vec!["Check file permissions", "Run with appropriate privileges"]
            }
            "STORAGE_NO_SPACE" => vec!["Free up disk space", "Check storage limits"],
            "OPERATION_TIMEOUT" => vec!["Retry the operation", "Check system resources"],
            _ => vec!["Check the logs for details"],
        }
    }

    /// Severity used for logging and error statistics.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Security { .. } => ErrorSeverity::Critical,
            Self::Storage { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                ErrorSeverity::Critical
            }
            Self::Structural { .. }
            | Self::Network { .. }
            | Self::Timeout { .. }
            | Self::Resource { .. }
            | Self::Storage { .. } => ErrorSeverity::High,
            Self::Processing { .. } | Self::ConfigInvalid { .. } | Self::Io(_) | Self::Json(_) => {
                ErrorSeverity::Medium
            }
        }
    }

    /// Whether retrying the request could succeed.
    ///
    /// Security and structural rejections never are; network, timeout, and
    /// resource errors always are; storage errors are unless the I/O kind is
    /// permission-denied or not-found; processing errors defer to their
    /// underlying cause when it is itself a taxonomy error.
    pub fn retryable(&self) -> bool {
        match self {
            Self::Security { .. } | Self::Structural { .. } | Self::ConfigInvalid { .. } => false,
            Self::Network { .. } | Self::Timeout { .. } | Self::Resource { .. } => true,
            Self::Storage { source, .. } => !matches!(
                source.kind(),
                std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::NotFound
            ),
            Self::Processing { source, .. } => source
                .downcast_ref::<RiverboatError>()
                .map(RiverboatError::retryable)
                .unwrap_or(false),
            Self::Io(_) | Self::Json(_) => false,
        }
    }
}

/// A convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RiverboatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_code_embeds_category() {
        let err = RiverboatError::Security {
            category: "path_traversal".into(),
            reason: "escape attempt".into(),
        };
        assert_eq!(err.code(), "SECURITY_PATH_TRAVERSAL_FAILED");
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(!err.retryable());
        assert_eq!(
            err.user_message(),
            "Security check failed: Invalid file path detected"
        );
    }

    #[test]
    fn processing_code_embeds_stage_and_operation() {
        let err = RiverboatError::processing("collaborate", "execute_workflow", "boom");
        assert_eq!(err.code(), "PROCESSING_COLLABORATE_EXECUTE_WORKFLOW_FAILED");
        assert!(err.to_string().contains("collaborate"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn processing_retryability_follows_cause() {
        let timeout = RiverboatError::Timeout {
            operation: "generate".into(),
        };
        let wrapped = RiverboatError::processing("collaborate", "generate", timeout);
        assert!(wrapped.retryable());

        let security = RiverboatError::Security {
            category: "dangerous_patterns".into(),
            reason: "eval".into(),
        };
        let wrapped = RiverboatError::processing("validate", "scan", security);
        assert!(!wrapped.retryable());
    }

    #[test]
    fn storage_permission_denied_is_critical_not_retryable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = RiverboatError::storage("save", io);
        assert_eq!(err.code(), "STORAGE_PERMISSION_DENIED");
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(!err.retryable());
        assert_eq!(
            err.user_message(),
            "Permission denied. Please check file permissions."
        );
    }

    #[test]
    fn storage_generic_failure_is_retryable() {
        let io = std::io::Error::other("disk hiccup");
        let err = RiverboatError::storage("save", io);
        assert_eq!(err.code(), "STORAGE_SAVE_FAILED");
        assert!(err.retryable());
    }

    #[test]
    fn network_code_sniffs_timeout() {
        let err = RiverboatError::Network {
            operation: "generate".into(),
            message: "connection timed out after 30s".into(),
        };
        assert_eq!(err.code(), "NETWORK_TIMEOUT");
        assert!(err.retryable());
    }

    #[test]
    fn resource_code_embeds_kind() {
        let err = RiverboatError::Resource {
            kind: "file_size".into(),
            reason: "1048577 bytes".into(),
        };
        assert_eq!(err.code(), "RESOURCE_FILE_SIZE_EXCEEDED");
        assert!(err.retryable());
    }

    #[test]
    fn timeout_user_message_and_actions() {
        let err = RiverboatError::Timeout {
            operation: "pipeline".into(),
        };
        assert_eq!(err.code(), "OPERATION_TIMEOUT");
        assert!(err.user_message().contains("took too long"));
        assert!(err.suggested_actions().contains(&"Retry the operation"));
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: RiverboatError = io_err.into();
        assert!(matches!(err, RiverboatError::Io(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad}}").unwrap_err();
        let err: RiverboatError = json_err.into();
        assert!(matches!(err, RiverboatError::Json(_)));
    }

    #[test]
    fn severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[test]
    fn unknown_code_falls_back_to_display() {
        let err = RiverboatError::ConfigInvalid {
            reason: "missing workflows table".into(),
        };
        assert_eq!(err.user_message(), err.to_string());
        assert_eq!(err.suggested_actions(), vec!["Check the logs for details"]);
    }
}
