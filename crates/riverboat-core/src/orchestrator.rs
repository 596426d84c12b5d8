//! The pipeline orchestrator.
//!
//! [`Riverboat`] owns the stages and their collaborators and is the single
//! entry point: `receive` runs an envelope through unpack, validate,
//! collaborate, and package, persisting the incoming and outgoing records
//! under one id and publishing lifecycle events along the way.
//!
//! Expected rejection and unexpected failure travel separately: a failed
//! security verdict comes back as `Ok(PipelineOutcome::Rejected)`, taxonomy
//! errors as `Err`. Every surfaced error lands in the bounded history.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use riverboat_gen::{GenerationService, HttpGenerator};
use riverboat_types::envelope::TaskEnvelope;
use riverboat_types::record::{Direction, RecordMetadata, RecordStatus, StorageStats};
use riverboat_types::{PipelineOutcome, Result, RiverboatError};

use crate::cache::{self, CacheBackend, InMemoryCache};
use crate::config::RiverboatConfig;
use crate::events::{EventSink, LogSink, channels, publish_best_effort};
use crate::history::{ErrorHistory, ErrorStatistics};
use crate::registry::WorkflowRegistry;
use crate::stages::{CollaborateStage, ValidateStage, build_package, unpack};
use crate::store::{DurableStore, StoredRecord};

/// The staged task-processing pipeline.
pub struct Riverboat {
    config: RiverboatConfig,
    store: DurableStore,
    cache: Arc<dyn CacheBackend>,
    events: Arc<dyn EventSink>,
    registry: WorkflowRegistry,
    validate: ValidateStage,
    collaborate: CollaborateStage,
    history: ErrorHistory,
    cancel: CancellationToken,
}

impl Riverboat {
    /// Build a pipeline with the default collaborators: an HTTP generation
    /// service, an in-process cache, and a logging event sink.
    pub async fn new(config: RiverboatConfig) -> Result<Self> {
        let service: Arc<dyn GenerationService> =
            Arc::new(HttpGenerator::new(config.generation.clone()));
        Self::with_collaborators(
            config,
            service,
            Arc::new(InMemoryCache::new()),
            Arc::new(LogSink),
        )
        .await
    }

    /// Build a pipeline around explicit collaborators.
    pub async fn with_collaborators(
        config: RiverboatConfig,
        service: Arc<dyn GenerationService>,
        cache: Arc<dyn CacheBackend>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let store = DurableStore::new(config.storage.root.clone());
        store.init().await?;
        let registry = WorkflowRegistry::load(
            config.registry.workflows_path.clone(),
            config.registry.active.as_deref(),
        )
        .await?;
        Ok(Self {
            validate: ValidateStage::new(config.limits.clone()),
            collaborate: CollaborateStage::new(service),
            store,
            cache,
            events,
            registry,
            history: ErrorHistory::new(),
            cancel: CancellationToken::new(),
            config,
        })
    }

    /// Process one envelope end to end.
    ///
    /// Bounded by the configured whole-pipeline deadline; hitting it aborts
    /// the request with a Timeout error and leaves any already-persisted
    /// incoming record in place.
    pub async fn receive(&self, envelope: TaskEnvelope) -> Result<PipelineOutcome> {
        let deadline = Duration::from_secs(self.config.pipeline.timeout_secs);
        let result = tokio::select! {
            _ = self.cancel.cancelled() => Err(RiverboatError::Timeout {
                operation: "pipeline shutdown".into(),
            }),
            run = timeout(deadline, self.process(&envelope)) => match run {
                Ok(outcome) => outcome,
                Err(_) => Err(RiverboatError::Timeout {
                    operation: "pipeline".into(),
                }),
            },
        };

        if let Err(err) = &result {
            self.history.record(err).await;
            error!(claim = %envelope.claim, code = %err.code(), error = %err, "pipeline failed");
            publish_best_effort(
                self.events.as_ref(),
                channels::ERROR,
                serde_json::json!({
                    "claim": envelope.claim,
                    "code": err.code(),
                    "message": err.to_string(),
                    "retryable": err.retryable(),
                }),
            )
            .await;
        }
        result
    }

    async fn process(&self, envelope: &TaskEnvelope) -> Result<PipelineOutcome> {
        let raw = serde_json::to_vec(envelope)?;
        let id = self.store.generate_id(&raw);
        info!(
            id,
            claim = %envelope.claim,
            attachments = envelope.attachments.len(),
            "envelope received"
        );

        self.store.save_envelope(&id, envelope).await?;
        publish_best_effort(
            self.events.as_ref(),
            channels::RECEIVED,
            serde_json::json!({
                "id": id,
                "claim": envelope.claim,
                "attachments": envelope.attachments.len(),
            }),
        )
        .await;

        let unpacked = unpack(envelope)?;

        let verdict = self.validate.run(envelope);
        if !verdict.secure {
            let rejection = RiverboatError::Security {
                category: verdict
                    .first_failed_category()
                    .unwrap_or("content_validation")
                    .into(),
                reason: verdict
                    .primary_error()
                    .unwrap_or("security validation failed")
                    .into(),
            };
            self.history.record(&rejection).await;
            publish_best_effort(
                self.events.as_ref(),
                channels::SECURITY_FAILED,
                serde_json::json!({
                    "id": id,
                    "claim": envelope.claim,
                    "level": verdict.security_level,
                    "errors": verdict.errors,
                }),
            )
            .await;
            return Ok(PipelineOutcome::Rejected(Box::new(verdict)));
        }

        let fingerprint = cache::fingerprint(&envelope.claim, &envelope.task);
        if self.config.pipeline.cache_enabled {
            match self.cache.get(&fingerprint).await {
                Ok(Some(mut package)) => {
                    package.mark_cache_hit();
                    info!(id, "cache hit, skipping collaboration");
                    self.store
                        .save_package(&id, &package, &envelope.task_summary())
                        .await?;
                    self.publish_completed(&id, envelope, &package).await;
                    return Ok(PipelineOutcome::Completed(package));
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, "cache read failed"),
            }
        }

        let snapshot = self.registry.snapshot().await;
        let output = self.collaborate.run(&unpacked, &snapshot).await;
        let package = build_package(&unpacked, &output);

        self.store
            .save_package(&id, &package, &envelope.task_summary())
            .await?;

        if self.config.pipeline.cache_enabled {
            let ttl = Duration::from_secs(self.config.pipeline.cache_ttl_secs);
            if let Err(err) = self.cache.set(&fingerprint, &package, ttl).await {
                warn!(error = %err, "cache write failed");
            }
        }

        self.publish_completed(&id, envelope, &package).await;
        info!(
            id,
            campers = package.results.processing_summary.total_campers,
            gate = %package.workflow.gate_status,
            "pipeline completed"
        );
        Ok(PipelineOutcome::Completed(package))
    }

    async fn publish_completed(
        &self,
        id: &str,
        envelope: &TaskEnvelope,
        package: &riverboat_types::package::Package,
    ) {
        publish_best_effort(
            self.events.as_ref(),
            channels::COMPLETED,
            serde_json::json!({
                "id": id,
                "claim": envelope.claim,
                "campers": package.results.processing_summary.total_campers,
                "gate": package.workflow.gate_status,
                "cacheHit": package.metadata.cache_hit,
            }),
        )
        .await;
    }

    // ── Record access ──

    pub async fn get_record(&self, id: &str) -> Result<Option<StoredRecord>> {
        self.store.load(id).await
    }

    pub async fn get_status(&self, id: &str) -> Result<Option<RecordStatus>> {
        Ok(self
            .store
            .metadata(id)
            .await?
            .map(|meta| RecordStatus::from_metadata(&meta)))
    }

    pub async fn list_records(
        &self,
        direction: Option<Direction>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RecordMetadata>> {
        self.store.list(direction, limit, offset).await
    }

    /// Delete one record across all directions. Returns false when the id
    /// is unknown.
    pub async fn delete_record(&self, id: &str) -> Result<bool> {
        self.store.delete(id).await
    }

    /// Delete records older than `max_age_days`, defaulting to the
    /// configured retention.
    pub async fn purge(&self, max_age_days: Option<u32>) -> Result<usize> {
        let days = max_age_days.unwrap_or(self.config.pipeline.retention_days);
        self.store.purge(days).await
    }

    pub async fn stats(&self) -> Result<StorageStats> {
        self.store.stats().await
    }

    // ── Workflow control ──

    pub async fn list_workflows(&self) -> Vec<String> {
        self.registry.list().await
    }

    pub async fn workflow_snapshot(&self) -> Arc<crate::registry::WorkflowSnapshot> {
        self.registry.snapshot().await
    }

    pub async fn set_active_workflow(&self, name: &str) -> Result<()> {
        self.registry.set_active(name).await
    }

    pub async fn reload_workflows(&self) -> Result<usize> {
        self.registry.reload().await
    }

    // ── Observability ──

    pub async fn error_statistics(&self) -> ErrorStatistics {
        self.history.statistics().await
    }

    pub fn config(&self) -> &RiverboatConfig {
        &self.config
    }

    /// Abort in-flight and future requests; they surface Timeout errors.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use riverboat_gen::{GenerationError, GenerationRequest, GenerationResponse};
    use riverboat_types::envelope::Attachment;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService {
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl CountingService {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: None,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Some(delay),
            })
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationService for CountingService {
        fn name(&self) -> &str {
            "counting"
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> riverboat_gen::Result<GenerationResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
                return Err(GenerationError::Timeout);
            }
            Ok(GenerationResponse::new(
                "```src/add.rs\nfn add(a: i32, b: i32) -> i32 { a + b }\n```",
            ))
        }
    }

    fn config_in(dir: &tempfile::TempDir) -> RiverboatConfig {
        let mut config = RiverboatConfig::default();
        config.storage.root = dir.path().join("storage");
        config
    }

    async fn pipeline(
        dir: &tempfile::TempDir,
        service: Arc<CountingService>,
    ) -> Riverboat {
        Riverboat::with_collaborators(
            config_in(dir),
            service,
            Arc::new(InMemoryCache::new()),
            Arc::new(LogSink),
        )
        .await
        .unwrap()
    }

    fn envelope() -> TaskEnvelope {
        TaskEnvelope::new("generate_code", "add two numbers", "/ws")
    }

    #[tokio::test]
    async fn completed_run_persists_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        let boat = pipeline(&dir, CountingService::new()).await;

        let outcome = boat.receive(envelope()).await.unwrap();
        let package = outcome.package().unwrap();
        assert_eq!(package.results.processing_summary.total_campers, 5);

        let incoming = boat
            .list_records(Some(Direction::Incoming), 10, 0)
            .await
            .unwrap();
        assert_eq!(incoming.len(), 1);
        let id = &incoming[0].id;

        let outgoing = boat
            .list_records(Some(Direction::Outgoing), 10, 0)
            .await
            .unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(&outgoing[0].id, id, "both directions share the id");

        let status = boat.get_status(id).await.unwrap().unwrap();
        assert_eq!(status.status, "completed");

        let record = boat.get_record(id).await.unwrap().unwrap();
        assert_eq!(record.metadata.direction, Direction::Outgoing);
        assert_eq!(record.payload["claim"], "response");
    }

    #[tokio::test]
    async fn rejection_short_circuits_before_collaboration() {
        let dir = tempfile::tempdir().unwrap();
        let service = CountingService::new();
        let boat = pipeline(&dir, service.clone()).await;

        let mut bad = envelope();
        bad.attachments
            .push(Attachment::new("../../etc/passwd", "x"));

        let outcome = boat.receive(bad).await.unwrap();
        let verdict = outcome.verdict().unwrap();
        assert!(!verdict.secure);
        assert_eq!(verdict.first_failed_category(), Some("path_traversal"));

        assert_eq!(service.count(), 0, "generation never invoked");
        let outgoing = boat
            .list_records(Some(Direction::Outgoing), 10, 0)
            .await
            .unwrap();
        assert!(outgoing.is_empty());
        // the incoming record stays for the audit trail
        let incoming = boat
            .list_records(Some(Direction::Incoming), 10, 0)
            .await
            .unwrap();
        assert_eq!(incoming.len(), 1);

        let stats = boat.error_statistics().await;
        assert_eq!(stats.by_code["SECURITY_PATH_TRAVERSAL_FAILED"], 1);
    }

    #[tokio::test]
    async fn identical_requests_hit_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let service = CountingService::new();
        let boat = pipeline(&dir, service.clone()).await;

        let first = boat.receive(envelope()).await.unwrap();
        let calls_after_first = service.count();
        assert!(calls_after_first > 0);
        assert!(!first.package().unwrap().metadata.cache_hit);

        let second = boat.receive(envelope()).await.unwrap();
        assert_eq!(service.count(), calls_after_first, "served from cache");
        let cached = second.package().unwrap();
        assert!(cached.metadata.cache_hit);
        assert_eq!(
            cached.results.processing_summary,
            first.package().unwrap().results.processing_summary
        );

        // the cached run still persisted its own outgoing record
        let outgoing = boat
            .list_records(Some(Direction::Outgoing), 10, 0)
            .await
            .unwrap();
        assert_eq!(outgoing.len(), 2);
    }

    #[tokio::test]
    async fn cache_disabled_always_collaborates() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.pipeline.cache_enabled = false;
        let service = CountingService::new();
        let boat = Riverboat::with_collaborators(
            config,
            service.clone(),
            Arc::new(InMemoryCache::new()),
            Arc::new(LogSink),
        )
        .await
        .unwrap();

        boat.receive(envelope()).await.unwrap();
        let after_first = service.count();
        boat.receive(envelope()).await.unwrap();
        assert_eq!(service.count(), after_first * 2);
    }

    #[tokio::test]
    async fn structural_error_surfaces_directly() {
        let dir = tempfile::tempdir().unwrap();
        let boat = pipeline(&dir, CountingService::new()).await;

        let err = boat
            .receive(TaskEnvelope::new("", "task", "/ws"))
            .await
            .unwrap_err();
        assert!(matches!(err, RiverboatError::Structural { .. }));

        let stats = boat.error_statistics().await;
        assert_eq!(stats.by_code["ENVELOPE_INVALID"], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_aborts_with_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.pipeline.timeout_secs = 1;
        let service = CountingService::slow(Duration::from_secs(10));
        let boat = Riverboat::with_collaborators(
            config,
            service,
            Arc::new(InMemoryCache::new()),
            Arc::new(LogSink),
        )
        .await
        .unwrap();

        let err = boat.receive(envelope()).await.unwrap_err();
        assert!(matches!(err, RiverboatError::Timeout { .. }));

        // no rollback of the incoming record
        let incoming = boat
            .list_records(Some(Direction::Incoming), 10, 0)
            .await
            .unwrap();
        assert_eq!(incoming.len(), 1);
        let outgoing = boat
            .list_records(Some(Direction::Outgoing), 10, 0)
            .await
            .unwrap();
        assert!(outgoing.is_empty());
    }

    #[tokio::test]
    async fn shutdown_aborts_new_requests() {
        let dir = tempfile::tempdir().unwrap();
        let boat = pipeline(&dir, CountingService::new()).await;
        boat.shutdown();

        let err = boat.receive(envelope()).await.unwrap_err();
        assert!(matches!(err, RiverboatError::Timeout { .. }));
    }

    #[tokio::test]
    async fn workflow_controls_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let boat = pipeline(&dir, CountingService::new()).await;

        let names = boat.list_workflows().await;
        assert!(names.contains(&"feature_development".to_string()));

        boat.set_active_workflow("quick_response").await.unwrap();
        let outcome = boat.receive(envelope()).await.unwrap();
        assert_eq!(
            outcome.package().unwrap().workflow.workflow_name,
            "quick_response"
        );
    }
}
