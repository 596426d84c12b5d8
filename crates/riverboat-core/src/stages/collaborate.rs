//! Stage 3: multi-worker collaboration.
//!
//! Runs the resolved workflow's roles in declared order, each worker seeing
//! the relevant prior responses. Audit-capable roles are reviewers: they get
//! the accumulated responses as their subject instead of the raw task. When
//! the workflow declares an audit gate, the deterministic gate checks run
//! after the sequence and may flag code responses.
//!
//! This stage degrades instead of failing: a broken generation service
//! yields low-confidence responses, an empty registry yields a system
//! response, and the caller always gets a batch plus a report.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use riverboat_gen::GenerationService;
use riverboat_types::package::{GateStatus, WorkflowReport};
use riverboat_types::response::CamperResponse;
use riverboat_types::workflow::{WorkerConfig, Workflow};

use crate::audit::{AUDIT_SPECIALIZATIONS, AuditGate};
use crate::registry::WorkflowSnapshot;
use crate::stages::unpack::UnpackedTask;
use crate::worker::Camper;

/// Per-response excerpt bound inside an audit subject.
const AUDIT_EXCERPT_CHARS: usize = 500;

/// The response batch and its execution report.
#[derive(Debug, Clone)]
pub struct CollaborationOutput {
    pub responses: Vec<CamperResponse>,
    pub report: WorkflowReport,
    pub audit_issues: Vec<String>,
}

/// Drives workers through a workflow.
pub struct CollaborateStage {
    service: Arc<dyn GenerationService>,
    gate: AuditGate,
}

impl CollaborateStage {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service,
            gate: AuditGate::new(),
        }
    }

    pub async fn run(
        &self,
        unpacked: &UnpackedTask,
        snapshot: &WorkflowSnapshot,
    ) -> CollaborationOutput {
        let Some(workflow) = resolved_workflow(snapshot, &unpacked.claim) else {
            warn!(claim = %unpacked.claim, "no workers available");
            return unavailable_output();
        };
        debug!(
            workflow = %workflow.name,
            steps = workflow.sequence.len(),
            parallel = workflow.parallel_execution,
            "collaboration started"
        );

        let mut responses = if workflow.parallel_execution {
            self.run_parallel(unpacked, snapshot, &workflow).await
        } else {
            self.run_sequential(unpacked, snapshot, &workflow).await
        };

        let (gate_status, audit_issues) = if workflow.audit_gate {
            let outcome = self.gate.audit(&mut responses, &workflow.sequence);
            (outcome.status, outcome.issues)
        } else {
            (GateStatus::None, Vec::new())
        };

        let report = WorkflowReport {
            workflow_name: workflow.name.clone(),
            roles_involved: responses.iter().map(|r| r.role.clone()).collect(),
            step_count: responses.len(),
            gate_status,
        };
        info!(
            workflow = %report.workflow_name,
            campers = report.step_count,
            gate = %report.gate_status,
            "collaboration finished"
        );
        CollaborationOutput {
            responses,
            report,
            audit_issues,
        }
    }

    async fn run_sequential(
        &self,
        unpacked: &UnpackedTask,
        snapshot: &WorkflowSnapshot,
        workflow: &Workflow,
    ) -> Vec<CamperResponse> {
        let mut responses = Vec::new();
        for role in &workflow.sequence {
            let Some(config) = snapshot.worker(role) else {
                warn!(role = %role, workflow = %workflow.name, "role has no worker config, skipping");
                continue;
            };
            let camper = Camper::new(config.clone(), self.service.clone());
            let subject = subject_for(config, &unpacked.task, &responses);
            let response = camper
                .process(&subject, &unpacked.target_os, &responses)
                .await;
            responses.push(response);
        }
        responses
    }

    /// Parallel dispatch: every non-reviewer role runs concurrently against
    /// an empty shared context, joined in declared order; reviewers then run
    /// sequentially over the joined batch. Output order stays deterministic.
    async fn run_parallel(
        &self,
        unpacked: &UnpackedTask,
        snapshot: &WorkflowSnapshot,
        workflow: &Workflow,
    ) -> Vec<CamperResponse> {
        let mut concurrent = Vec::new();
        let mut reviewers = Vec::new();
        for role in &workflow.sequence {
            let Some(config) = snapshot.worker(role) else {
                warn!(role = %role, workflow = %workflow.name, "role has no worker config, skipping");
                continue;
            };
            if is_reviewer(config) {
                reviewers.push(config.clone());
            } else {
                concurrent.push(config.clone());
            }
        }

        let futures = concurrent.into_iter().map(|config| {
            let camper = Camper::new(config, self.service.clone());
            let task = unpacked.task.clone();
            let target_os = unpacked.target_os.clone();
            async move { camper.process(&task, &target_os, &[]).await }
        });
        let mut responses = join_all(futures).await;

        for config in reviewers {
            let camper = Camper::new(config.clone(), self.service.clone());
            let subject = subject_for(&config, &unpacked.task, &responses);
            let response = camper
                .process(&subject, &unpacked.target_os, &responses)
                .await;
            responses.push(response);
        }
        responses
    }
}

fn is_reviewer(config: &WorkerConfig) -> bool {
    config.has_any_specialization(&AUDIT_SPECIALIZATIONS)
}

/// Reviewers get the accumulated batch as their subject, everyone else the
/// raw task.
fn subject_for(config: &WorkerConfig, task: &str, prior: &[CamperResponse]) -> String {
    if is_reviewer(config) && !prior.is_empty() {
        audit_subject(prior)
    } else {
        task.to_string()
    }
}

fn audit_subject(responses: &[CamperResponse]) -> String {
    let mut parts = vec!["Responses under review:".to_string()];
    for response in responses {
        let excerpt: String = response.content.chars().take(AUDIT_EXCERPT_CHARS).collect();
        parts.push(format!(
            "[{} | {} | confidence {:.2}]\n{excerpt}",
            response.role, response.response_type, response.confidence_score
        ));
    }
    parts.join("\n\n")
}

fn resolved_workflow(snapshot: &WorkflowSnapshot, claim: &str) -> Option<Workflow> {
    if let Some(workflow) = snapshot.resolve(claim) {
        return Some(workflow.clone());
    }
    // no workflows defined; fall back to a single default role
    let role = snapshot
        .workers
        .get("RequirementsGatherer")
        .or_else(|| snapshot.workers.values().next())
        .map(|config| config.role.clone())?;
    Some(Workflow::new("default", vec![role]))
}

fn unavailable_output() -> CollaborationOutput {
    let response = CamperResponse::suggestion(
        "System",
        "No workers are available to process this task.",
        0.0,
    );
    CollaborationOutput {
        responses: vec![response],
        report: WorkflowReport {
            workflow_name: "unavailable".into(),
            roles_involved: vec!["System".into()],
            step_count: 0,
            gate_status: GateStatus::None,
        },
        audit_issues: Vec::new(),
    }
}
