//! Stage 2: security validation.

use tracing::info;

use riverboat_security::{EnvelopeValidator, ValidationLimits};
use riverboat_types::envelope::TaskEnvelope;
use riverboat_types::verdict::ValidationVerdict;

/// Wraps the envelope validator with the configured ceilings.
///
/// Validation always runs, cache hit or not; a verdict is never skipped.
pub struct ValidateStage {
    validator: EnvelopeValidator,
}

impl ValidateStage {
    pub fn new(limits: ValidationLimits) -> Self {
        Self {
            validator: EnvelopeValidator::with_limits(limits),
        }
    }

    pub fn run(&self, envelope: &TaskEnvelope) -> ValidationVerdict {
        let verdict = self.validator.validate(envelope);
        if !verdict.secure {
            info!(
                claim = %envelope.claim,
                level = %verdict.security_level,
                errors = verdict.errors.len(),
                category = verdict.first_failed_category().unwrap_or("unknown"),
                "envelope rejected by security validation"
            );
        }
        verdict
    }
}

impl Default for ValidateStage {
    fn default() -> Self {
        Self::new(ValidationLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riverboat_types::envelope::Attachment;

    #[test]
    fn clean_envelope_is_secure() {
        let envelope = TaskEnvelope::new("generate_code", "add two numbers", "/ws");
        let verdict = ValidateStage::default().run(&envelope);
        assert!(verdict.secure);
    }

    #[test]
    fn traversal_attachment_is_rejected() {
        let mut envelope = TaskEnvelope::new("generate_code", "task", "/ws");
        envelope
            .attachments
            .push(Attachment::new("../../etc/passwd", "x"));

        let verdict = ValidateStage::default().run(&envelope);
        assert!(!verdict.secure);
        assert_eq!(verdict.first_failed_category(), Some("path_traversal"));
    }

    #[test]
    fn configured_ceiling_is_applied() {
        let limits = ValidationLimits {
            max_file_bytes: 8,
            ..ValidationLimits::default()
        };
        let mut envelope = TaskEnvelope::new("generate_code", "task", "/ws");
        envelope
            .attachments
            .push(Attachment::new("big.txt", "123456789"));

        let verdict = ValidateStage::new(limits).run(&envelope);
        assert!(!verdict.secure);
        assert_eq!(verdict.first_failed_category(), Some("file_size_limits"));
    }
}
