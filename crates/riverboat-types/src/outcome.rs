//! The typed pipeline result.
//!
//! Expected rejection (a failed security verdict) and unexpected failure (a
//! taxonomy error) travel on different channels: the orchestrator returns
//! `Result<PipelineOutcome>`, where [`PipelineOutcome::Rejected`] carries the
//! verdict and `Err` carries a [`RiverboatError`]. Callers cannot conflate
//! the two.
//!
//! [`RiverboatError`]: crate::error::RiverboatError

use serde::{Deserialize, Serialize};

use crate::package::Package;
use crate::verdict::ValidationVerdict;

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The pipeline ran to completion.
    Completed(Package),

    /// Security validation rejected the envelope; no further stage ran.
    Rejected(Box<ValidationVerdict>),
}

impl PipelineOutcome {
    /// The package, if the pipeline completed.
    pub fn package(&self) -> Option<&Package> {
        match self {
            PipelineOutcome::Completed(pkg) => Some(pkg),
            PipelineOutcome::Rejected(_) => None,
        }
    }

    /// The rejection verdict, if the envelope was rejected.
    pub fn verdict(&self) -> Option<&ValidationVerdict> {
        match self {
            PipelineOutcome::Completed(_) => None,
            PipelineOutcome::Rejected(verdict) => Some(verdict),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn rejected_exposes_verdict_not_package() {
        let verdict = ValidationVerdict::from_checks(
            BTreeMap::new(),
            vec!["path traversal attempt".into()],
            vec![],
        );
        let outcome = PipelineOutcome::Rejected(Box::new(verdict));
        assert!(!outcome.is_completed());
        assert!(outcome.package().is_none());
        assert!(outcome.verdict().is_some());
        assert!(!outcome.verdict().unwrap().secure);
    }

    #[test]
    fn outcome_serde_tags_variant() {
        let verdict = ValidationVerdict::from_checks(BTreeMap::new(), vec!["x".into()], vec![]);
        let outcome = PipelineOutcome::Rejected(Box::new(verdict));
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"outcome\":\"rejected\""));
    }
}
