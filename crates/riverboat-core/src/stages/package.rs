//! Stage 4: package the collaboration into the outgoing envelope.
//!
//! Pure aggregation. Blocked responses stay in the batch for the caller to
//! inspect, but their files and commands are left out of the aggregates and
//! no attachments are synthesized for them.

use chrono::Utc;

use riverboat_types::envelope::Attachment;
use riverboat_types::package::{
    Package, PackageMetadata, PackageResults, ProcessingSummary, SuggestionSummary,
};
use riverboat_types::response::ResponseType;

use crate::mime;
use crate::stages::collaborate::CollaborationOutput;
use crate::stages::unpack::UnpackedTask;

/// Claim carried by every outgoing package.
const RESPONSE_CLAIM: &str = "response";

/// Fold the collaboration output into a package. The inbound workspace
/// root, target OS, and context pass through unchanged.
pub fn build_package(unpacked: &UnpackedTask, output: &CollaborationOutput) -> Package {
    let mut files_to_create = Vec::new();
    let mut commands_to_execute = Vec::new();
    let mut suggestions = Vec::new();

    for response in &output.responses {
        if response.response_type == ResponseType::Suggestion {
            suggestions.push(SuggestionSummary {
                role: response.role.clone(),
                content: response.content.clone(),
                confidence: response.confidence_score,
            });
        }
        if response.publication_blocked {
            continue;
        }
        files_to_create.extend(response.files_to_create.iter().cloned());
        commands_to_execute.extend(response.commands_to_execute.iter().cloned());
    }

    let attachments: Vec<Attachment> = files_to_create
        .iter()
        .map(|file| {
            let mut attachment = Attachment::new(&file.path, &file.content);
            attachment.mime_type = mime::infer(&file.path).to_string();
            attachment
        })
        .collect();

    let processing_summary = ProcessingSummary {
        total_campers: output.responses.len(),
        files_generated: files_to_create.len(),
        commands_generated: commands_to_execute.len(),
        suggestions_generated: suggestions.len(),
    };

    Package {
        claim: RESPONSE_CLAIM.into(),
        target_os: unpacked.target_os.clone(),
        workspace_root: unpacked.workspace_root.clone(),
        attachments,
        context: unpacked.context.clone(),
        results: PackageResults {
            responses: output.responses.clone(),
            files_to_create,
            commands_to_execute,
            suggestions,
            processing_summary,
        },
        workflow: output.report.clone(),
        metadata: PackageMetadata {
            processed_at: Utc::now(),
            cache_hit: false,
            original_metadata: unpacked.metadata.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::unpack;
    use riverboat_types::envelope::TaskEnvelope;
    use riverboat_types::package::{GateStatus, WorkflowReport};
    use riverboat_types::response::{CamperResponse, FileSpec};

    fn unpacked() -> UnpackedTask {
        let mut envelope = TaskEnvelope::new("generate_code", "add two numbers", "/ws");
        envelope.target_os = "linux".into();
        envelope.context.current_file = Some("src/main.rs".into());
        envelope
            .metadata
            .insert("requestId".into(), serde_json::json!("r-42"));
        unpack::unpack(&envelope).unwrap()
    }

    fn output(responses: Vec<CamperResponse>, gate_status: GateStatus) -> CollaborationOutput {
        let report = WorkflowReport {
            workflow_name: "feature_development".into(),
            roles_involved: responses.iter().map(|r| r.role.clone()).collect(),
            step_count: responses.len(),
            gate_status,
        };
        CollaborationOutput {
            responses,
            report,
            audit_issues: vec![],
        }
    }

    fn code_response(role: &str, path: &str, content: &str) -> CamperResponse {
        let mut response = CamperResponse::suggestion(role, content, 0.8);
        response.response_type = ResponseType::Code;
        response.files_to_create.push(FileSpec::new(path, content));
        response
    }

    #[test]
    fn aggregates_across_responses() {
        let mut command = CamperResponse::suggestion("OSExpert", "run it", 0.8);
        command.response_type = ResponseType::Command;
        command.commands_to_execute.push("cargo build".into());

        let responses = vec![
            CamperResponse::suggestion("RequirementsGatherer", "keep it pure", 0.8),
            command,
            code_response("BackEndDev", "src/add.rs", "fn add() {}"),
        ];
        let package = build_package(&unpacked(), &output(responses, GateStatus::Passed));

        assert_eq!(package.claim, "response");
        assert_eq!(package.results.files_to_create.len(), 1);
        assert_eq!(package.results.commands_to_execute, vec!["cargo build"]);
        assert_eq!(package.results.suggestions.len(), 1);
        assert_eq!(package.results.suggestions[0].role, "RequirementsGatherer");

        let summary = &package.results.processing_summary;
        assert_eq!(summary.total_campers, 3);
        assert_eq!(summary.files_generated, 1);
        assert_eq!(summary.commands_generated, 1);
        assert_eq!(summary.suggestions_generated, 1);
    }

    #[test]
    fn blocked_output_is_withheld_but_response_delivered() {
        let mut blocked = code_response("BackEndDev", "src/bad.rs", "rm -rf /");
        blocked.block("Failed audit gate verification");

        let package = build_package(&unpacked(), &output(vec![blocked], GateStatus::Blocked));

        assert!(package.results.files_to_create.is_empty());
        assert!(package.attachments.is_empty());
        assert_eq!(package.results.processing_summary.files_generated, 0);
        // the flagged response itself is still delivered
        assert_eq!(package.results.responses.len(), 1);
        assert!(package.results.responses[0].publication_blocked);
        assert_eq!(package.workflow.gate_status, GateStatus::Blocked);
    }

    #[test]
    fn attachments_carry_inferred_mime_types() {
        let responses = vec![
            code_response("BackEndDev", "src/add.rs", "fn add() {}"),
            code_response("BackEndDev", "setup.py", "print()"),
        ];
        let package = build_package(&unpacked(), &output(responses, GateStatus::Passed));

        assert_eq!(package.attachments.len(), 2);
        assert_eq!(package.attachments[0].path, "src/add.rs");
        assert_eq!(package.attachments[0].mime_type, "text/x-rust");
        assert_eq!(package.attachments[1].mime_type, "text/x-python");
    }

    #[test]
    fn envelope_fields_pass_through_unchanged() {
        let package = build_package(&unpacked(), &output(vec![], GateStatus::None));

        assert_eq!(package.workspace_root, "/ws");
        assert_eq!(package.target_os, "linux");
        assert_eq!(package.context.current_file.as_deref(), Some("src/main.rs"));
        assert_eq!(package.metadata.original_metadata["requestId"], "r-42");
        assert!(!package.metadata.cache_hit);
    }
}
