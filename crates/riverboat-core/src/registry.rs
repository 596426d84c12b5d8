//! Workflow registry with atomic reload.
//!
//! All workflow and worker configuration lives in an immutable
//! [`WorkflowSnapshot`]. Readers clone an `Arc` to the current snapshot and
//! keep using it for the whole request; writers (reload, activation) build
//! a complete replacement snapshot and swap the pointer, so no reader ever
//! observes a partially updated registry.
//!
//! A definition file overlays the built-in roster: entries with the same
//! name win, everything else stays available.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use riverboat_types::workflow::{CodeGeneration, CommandGeneration, WorkerConfig, Workflow};
use riverboat_types::{Result, RiverboatError};

/// Workflow activated when nothing else is configured.
pub const DEFAULT_ACTIVE: &str = "feature_development";

/// On-disk registry definition.
#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    active: Option<String>,
    #[serde(default)]
    workers: BTreeMap<String, WorkerConfig>,
    #[serde(default)]
    workflows: BTreeMap<String, Workflow>,
}

/// An immutable view of every workflow and worker plus the active pointer.
#[derive(Debug, Clone)]
pub struct WorkflowSnapshot {
    pub workflows: BTreeMap<String, Workflow>,
    pub workers: BTreeMap<String, WorkerConfig>,
    pub active: String,
    pub loaded_at: DateTime<Utc>,
}

impl WorkflowSnapshot {
    /// The built-in roster.
    pub fn builtin() -> Self {
        Self {
            workflows: builtin_workflows(),
            workers: builtin_workers(),
            active: DEFAULT_ACTIVE.to_string(),
            loaded_at: Utc::now(),
        }
    }

    /// Overlay `file` onto the built-ins and validate the result.
    fn overlaid(file: RegistryFile) -> Result<Self> {
        let mut snapshot = Self::builtin();
        snapshot.workers.extend(file.workers);
        snapshot.workflows.extend(file.workflows);
        if let Some(active) = file.active {
            snapshot.active = active;
        }
        snapshot.loaded_at = Utc::now();
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<()> {
        if !self.workflows.contains_key(&self.active) {
            return Err(RiverboatError::ConfigInvalid {
                reason: format!("active workflow '{}' is not defined", self.active),
            });
        }
        for (name, workflow) in &self.workflows {
            if workflow.sequence.is_empty() {
                return Err(RiverboatError::ConfigInvalid {
                    reason: format!("workflow '{name}' has an empty sequence"),
                });
            }
            for role in &workflow.sequence {
                if !self.workers.contains_key(role) {
                    return Err(RiverboatError::ConfigInvalid {
                        reason: format!("workflow '{name}' references unknown role '{role}'"),
                    });
                }
            }
        }
        Ok(())
    }

    /// The currently active workflow.
    pub fn active_workflow(&self) -> Option<&Workflow> {
        self.workflows.get(&self.active)
    }

    /// Workflow for a claim: a workflow named exactly like the claim wins,
    /// otherwise the active one.
    pub fn resolve(&self, claim: &str) -> Option<&Workflow> {
        self.workflows.get(claim).or_else(|| self.active_workflow())
    }

    pub fn worker(&self, role: &str) -> Option<&WorkerConfig> {
        self.workers.get(role)
    }
}

/// Shared registry handle.
#[derive(Debug)]
pub struct WorkflowRegistry {
    snapshot: RwLock<Arc<WorkflowSnapshot>>,
    source: Option<PathBuf>,
}

impl WorkflowRegistry {
    /// Registry backed only by the built-in roster.
    pub fn builtin() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(WorkflowSnapshot::builtin())),
            source: None,
        }
    }

    /// Load from a definition file (missing file means built-ins only) and
    /// optionally override the active workflow.
    pub async fn load(source: Option<PathBuf>, active: Option<&str>) -> Result<Self> {
        let snapshot = match &source {
            Some(path) => read_snapshot(path).await?,
            None => WorkflowSnapshot::builtin(),
        };
        let registry = Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            source,
        };
        if let Some(name) = active {
            registry.set_active(name).await?;
        }
        Ok(registry)
    }

    /// The current snapshot. Cheap; holds the lock only for the clone.
    pub async fn snapshot(&self) -> Arc<WorkflowSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Re-read the definition file and swap the snapshot atomically.
    ///
    /// The active workflow survives a reload when it still exists in the
    /// new definition. Returns the number of workflows now registered.
    pub async fn reload(&self) -> Result<usize> {
        let mut fresh = match &self.source {
            Some(path) => read_snapshot(path).await?,
            None => WorkflowSnapshot::builtin(),
        };

        let mut guard = self.snapshot.write().await;
        let previous = guard.active.clone();
        if fresh.workflows.contains_key(&previous) {
            fresh.active = previous;
        } else {
            warn!(
                dropped = %previous,
                active = %fresh.active,
                "previously active workflow vanished on reload"
            );
        }
        let count = fresh.workflows.len();
        *guard = Arc::new(fresh);
        info!(workflows = count, "workflow registry reloaded");
        Ok(count)
    }

    /// Point the registry at another workflow.
    pub async fn set_active(&self, name: &str) -> Result<()> {
        let mut guard = self.snapshot.write().await;
        if !guard.workflows.contains_key(name) {
            return Err(RiverboatError::ConfigInvalid {
                reason: format!("unknown workflow '{name}'"),
            });
        }
        let mut fresh = (**guard).clone();
        fresh.active = name.to_string();
        *guard = Arc::new(fresh);
        debug!(active = name, "workflow activated");
        Ok(())
    }

    /// Registered workflow names, with the active one first.
    pub async fn list(&self) -> Vec<String> {
        let snapshot = self.snapshot.read().await;
        let mut names: Vec<String> = snapshot.workflows.keys().cloned().collect();
        names.sort_by_key(|name| (*name != snapshot.active, name.clone()));
        names
    }
}

async fn read_snapshot(path: &Path) -> Result<WorkflowSnapshot> {
    if !path.exists() {
        debug!(path = %path.display(), "workflow file missing, using built-ins");
        return Ok(WorkflowSnapshot::builtin());
    }
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| RiverboatError::storage("workflow read", e))?;
    let file: RegistryFile = toml::from_str(&raw).map_err(|e| RiverboatError::ConfigInvalid {
        reason: format!("{}: {e}", path.display()),
    })?;
    WorkflowSnapshot::overlaid(file)
}

fn builtin_workers() -> BTreeMap<String, WorkerConfig> {
    let mut workers = BTreeMap::new();

    let mut gatherer = WorkerConfig::new(
        "RequirementsGatherer",
        "Analyze the following task and list its key requirements and constraints.\n\nTask: {task}\nTarget OS: {os}",
    );
    gatherer.system_prompt =
        "You are a requirements analyst. Be concrete and exhaustive.".into();
    gatherer.specializations = vec!["requirements_analysis".into()];
    workers.insert(gatherer.role.clone(), gatherer);

    let mut os_expert = WorkerConfig::new(
        "OSExpert",
        "Give {os}-specific guidance for this task, including the exact commands to run.\n\nTask: {task}",
    );
    os_expert.system_prompt =
        "You are an operating system specialist. Prefer commands over prose.".into();
    os_expert.specializations = vec!["command_line_operations".into(), "os_configuration".into()];
    os_expert.command_generation = CommandGeneration {
        enabled: true,
        max_commands: 5,
    };
    workers.insert(os_expert.role.clone(), os_expert);

    let mut backend = WorkerConfig::new(
        "BackEndDev",
        "Implement the following task. Return complete files in fenced code blocks with the file path on the fence line.\n\nTask: {task}\nTarget OS: {os}",
    );
    backend.system_prompt = "You are a senior backend developer. Ship working code.".into();
    backend.specializations = vec!["api_development".into()];
    backend.code_generation = CodeGeneration {
        enabled: true,
        default_file_extension: ".txt".into(),
    };
    workers.insert(backend.role.clone(), backend);

    let mut tester = WorkerConfig::new(
        "TestWriter",
        "Write tests for the solution to the following task. Return complete test files in fenced code blocks.\n\nTask: {task}\nTarget OS: {os}",
    );
    tester.system_prompt = "You are a test engineer. Cover the edge cases.".into();
    tester.specializations = vec!["testing".into(), "api_development".into()];
    tester.code_generation = CodeGeneration {
        enabled: true,
        default_file_extension: ".txt".into(),
    };
    workers.insert(tester.role.clone(), tester);

    let mut auditor = WorkerConfig::new(
        "Auditor",
        "Audit the collaboration below for quality and security problems. Point at anything that should not ship.\n\n{task}",
    );
    auditor.system_prompt = "You are a security and quality reviewer.".into();
    auditor.specializations = vec!["security_analysis".into(), "code_quality_review".into()];
    workers.insert(auditor.role.clone(), auditor);

    workers
}

fn builtin_workflows() -> BTreeMap<String, Workflow> {
    let mut workflows = BTreeMap::new();

    let mut feature = Workflow::new(
        DEFAULT_ACTIVE,
        vec![
            "RequirementsGatherer".into(),
            "OSExpert".into(),
            "BackEndDev".into(),
            "TestWriter".into(),
            "Auditor".into(),
        ],
    );
    feature.audit_gate = true;
    feature.description = Some("Requirements through audited implementation".into());
    workflows.insert(feature.name.clone(), feature);

    let mut quick = Workflow::new("quick_response", vec!["BackEndDev".into()]);
    quick.description = Some("Single-role fast path, no gate".into());
    workflows.insert(quick.name.clone(), quick);

    let mut review = Workflow::new(
        "security_review",
        vec!["BackEndDev".into(), "Auditor".into()],
    );
    review.audit_gate = true;
    review.description = Some("Implementation plus audit".into());
    workflows.insert(review.name.clone(), review);

    workflows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_roster_is_consistent() {
        let snapshot = WorkflowSnapshot::builtin();
        assert!(snapshot.validate().is_ok());
        assert_eq!(snapshot.workflows.len(), 3);
        assert_eq!(snapshot.workers.len(), 5);
        assert_eq!(snapshot.active, "feature_development");
        assert!(snapshot.active_workflow().unwrap().audit_gate);
    }

    #[test]
    fn resolve_prefers_exact_claim_match() {
        let snapshot = WorkflowSnapshot::builtin();
        assert_eq!(snapshot.resolve("security_review").unwrap().name, "security_review");
        assert_eq!(
            snapshot.resolve("generate_code").unwrap().name,
            "feature_development"
        );
    }

    #[tokio::test]
    async fn set_active_swaps_and_validates() {
        let registry = WorkflowRegistry::builtin();
        registry.set_active("quick_response").await.unwrap();
        assert_eq!(registry.snapshot().await.active, "quick_response");

        let err = registry.set_active("nonexistent").await.unwrap_err();
        assert!(matches!(err, RiverboatError::ConfigInvalid { .. }));
        assert_eq!(registry.snapshot().await.active, "quick_response");
    }

    #[tokio::test]
    async fn list_puts_active_first() {
        let registry = WorkflowRegistry::builtin();
        let names = registry.list().await;
        assert_eq!(names[0], "feature_development");
        assert_eq!(names.len(), 3);

        registry.set_active("security_review").await.unwrap();
        assert_eq!(registry.list().await[0], "security_review");
    }

    #[tokio::test]
    async fn file_overlays_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflows.toml");
        let raw = r#"
active = "docs_only"

[workflows.docs_only]
name = "docs_only"
sequence = ["RequirementsGatherer"]

[workers.RequirementsGatherer]
role = "RequirementsGatherer"
promptTemplate = "Summarize: {task}"
"#;
        tokio::fs::write(&path, raw).await.unwrap();

        let registry = WorkflowRegistry::load(Some(path), None).await.unwrap();
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.active, "docs_only");
        // built-ins still present alongside the new workflow
        assert_eq!(snapshot.workflows.len(), 4);
        assert_eq!(
            snapshot.worker("RequirementsGatherer").unwrap().prompt_template,
            "Summarize: {task}"
        );
    }

    #[tokio::test]
    async fn unknown_role_in_sequence_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflows.toml");
        let raw = r#"
[workflows.broken]
name = "broken"
sequence = ["NoSuchRole"]
"#;
        tokio::fs::write(&path, raw).await.unwrap();

        let err = WorkflowRegistry::load(Some(path), None).await.unwrap_err();
        assert!(err.to_string().contains("NoSuchRole"));
    }

    #[tokio::test]
    async fn reload_swaps_snapshot_and_keeps_active() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflows.toml");
        tokio::fs::write(&path, "").await.unwrap();

        let registry = WorkflowRegistry::load(Some(path.clone()), Some("quick_response"))
            .await
            .unwrap();
        let before = registry.snapshot().await;

        let raw = r#"
[workflows.extra]
name = "extra"
sequence = ["BackEndDev"]
"#;
        tokio::fs::write(&path, raw).await.unwrap();

        let count = registry.reload().await.unwrap();
        assert_eq!(count, 4);

        let after = registry.snapshot().await;
        assert_eq!(after.active, "quick_response");
        assert!(after.workflows.contains_key("extra"));
        // the old snapshot an in-flight request may hold is untouched
        assert!(!before.workflows.contains_key("extra"));
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_builtins() {
        let registry = WorkflowRegistry::load(Some(PathBuf::from("/nonexistent/wf.toml")), None)
            .await
            .unwrap();
        assert_eq!(registry.snapshot().await.workflows.len(), 3);
    }
}
