//! Numeric ceilings applied during validation.

use riverboat_types::envelope::Attachment;
use serde::{Deserialize, Serialize};

/// Size and shape ceilings for an envelope.
///
/// All violations are error severity. The line ceilings exist to stop
/// pathological inputs from stalling downstream regex scans. Every field
/// defaults so a config file may override only some ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Per-attachment content ceiling in bytes.
    pub max_file_bytes: usize,
    /// Aggregate content ceiling across all attachments, in bytes.
    pub max_total_bytes: usize,
    /// Maximum number of attachments.
    pub max_attachments: usize,
    /// Longest permitted single line, in bytes.
    pub max_line_length: usize,
    /// Maximum number of lines per attachment.
    pub max_lines: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            max_total_bytes: 10 * 1024 * 1024,
            max_attachments: 100,
            max_line_length: 10_000,
            max_lines: 50_000,
        }
    }
}

impl ValidationLimits {
    /// Check per-file, aggregate, and count ceilings.
    ///
    /// Returns one error string per violation.
    pub fn check_sizes(&self, attachments: &[Attachment]) -> Vec<String> {
        let mut errors = Vec::new();

        if attachments.len() > self.max_attachments {
            errors.push(format!(
                "too many attachments: {} exceeds limit of {}",
                attachments.len(),
                self.max_attachments
            ));
        }

        let mut total = 0usize;
        for attachment in attachments {
            let size = attachment.size_bytes();
            total += size;
            if size > self.max_file_bytes {
                errors.push(format!(
                    "file too large: {} is {} bytes, limit is {}",
                    attachment.path, size, self.max_file_bytes
                ));
            }
        }

        if total > self.max_total_bytes {
            errors.push(format!(
                "total attachment size {} bytes exceeds limit of {}",
                total, self.max_total_bytes
            ));
        }

        errors
    }

    /// Check one attachment's content for null bytes and line ceilings.
    pub fn check_content(&self, path: &str, content: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if content.contains('\0') {
            errors.push(format!("null byte in {path}"));
        }

        let mut line_count = 0usize;
        let mut long_line_reported = false;
        for line in content.lines() {
            line_count += 1;
            if !long_line_reported && line.len() > self.max_line_length {
                errors.push(format!(
                    "line {} in {} is {} bytes, limit is {}",
                    line_count,
                    path,
                    line.len(),
                    self.max_line_length
                ));
                long_line_reported = true;
            }
        }
        if line_count > self.max_lines {
            errors.push(format!(
                "{} has {} lines, limit is {}",
                path, line_count, self.max_lines
            ));
        }

        errors
    }
}
