//! The generic worker.
//!
//! Every worker role is the same code interpreting one [`WorkerConfig`]:
//! format the prompt template, append relevant shared context, call the
//! generation service once, and shape the text into a typed response. A
//! failed generation degrades to a low-confidence suggestion instead of
//! failing the collaboration.

use std::sync::Arc;

use tracing::{debug, warn};

use riverboat_gen::{GenerationRequest, GenerationService};
use riverboat_types::response::{CamperResponse, ResponseType};
use riverboat_types::workflow::WorkerConfig;

use crate::extract;
use crate::relevance::{self, RelevanceTable};

/// Confidence assigned to degraded responses.
const FALLBACK_CONFIDENCE: f64 = 0.1;

/// Specializations that make a worker produce code.
const CODE_SPECIALIZATIONS: [&str; 3] =
    ["api_development", "ui_development", "infrastructure_as_code"];

/// Specializations that make a worker produce commands.
const COMMAND_SPECIALIZATIONS: [&str; 2] = ["command_line_operations", "debugging_commands"];

/// One configured worker role bound to a generation service.
pub struct Camper {
    config: WorkerConfig,
    service: Arc<dyn GenerationService>,
    relevance: RelevanceTable,
}

impl Camper {
    pub fn new(config: WorkerConfig, service: Arc<dyn GenerationService>) -> Self {
        Self {
            config,
            service,
            relevance: RelevanceTable::new(),
        }
    }

    pub fn role(&self) -> &str {
        &self.config.role
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// The response type this worker's specializations imply.
    pub fn response_type(&self) -> ResponseType {
        if self.config.has_any_specialization(&CODE_SPECIALIZATIONS) {
            ResponseType::Code
        } else if self.config.has_any_specialization(&COMMAND_SPECIALIZATIONS) {
            ResponseType::Command
        } else {
            ResponseType::Suggestion
        }
    }

    /// Run one collaboration step.
    pub async fn process(
        &self,
        task: &str,
        target_os: &str,
        prior: &[CamperResponse],
    ) -> CamperResponse {
        let prompt = self.build_prompt(task, target_os, prior);
        let request = GenerationRequest::new(&self.config.system_prompt, prompt)
            .with_max_tokens(u32::try_from(self.config.max_response_length).unwrap_or(u32::MAX));

        match self.service.generate(&request).await {
            Ok(generated) => {
                debug!(role = %self.config.role, chars = generated.content.len(), "worker responded");
                self.shape(generated.content, target_os)
            }
            Err(err) => {
                warn!(role = %self.config.role, error = %err, "generation failed, degrading response");
                CamperResponse::suggestion(
                    &self.config.role,
                    format!("Unable to generate a response: {err}"),
                    FALLBACK_CONFIDENCE,
                )
            }
        }
    }

    fn build_prompt(&self, task: &str, target_os: &str, prior: &[CamperResponse]) -> String {
        let mut prompt = self
            .config
            .prompt_template
            .replace("{task}", task)
            .replace("{os}", target_os);
        if let Some(block) = relevance::context_block(&self.relevance, &self.config, prior) {
            prompt.push_str("\n\n");
            prompt.push_str(&block);
        }
        prompt
    }

    fn shape(&self, content: String, target_os: &str) -> CamperResponse {
        let files_to_create = if self.config.code_generation.enabled {
            extract::code_blocks(
                &content,
                &self.config.role,
                &self.config.code_generation.default_file_extension,
            )
        } else {
            Vec::new()
        };
        let commands_to_execute = if self.config.command_generation.enabled {
            extract::commands(
                &content,
                target_os,
                self.config.command_generation.max_commands,
            )
        } else {
            Vec::new()
        };

        CamperResponse {
            role: self.config.role.clone(),
            response_type: self.response_type(),
            content,
            files_to_create,
            commands_to_execute,
            confidence_score: self.config.confidence_threshold,
            publication_blocked: false,
            block_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use riverboat_gen::{GenerationError, GenerationResponse};
    use tokio::sync::Mutex;

    struct ScriptedService {
        reply: String,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedService {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GenerationService for ScriptedService {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> riverboat_gen::Result<GenerationResponse> {
            self.requests.lock().await.push(request.clone());
            Ok(GenerationResponse::new(self.reply.clone()))
        }
    }

    struct BrokenService;

    #[async_trait]
    impl GenerationService for BrokenService {
        fn name(&self) -> &str {
            "broken"
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> riverboat_gen::Result<GenerationResponse> {
            Err(GenerationError::Timeout)
        }
    }

    fn coder_config() -> WorkerConfig {
        let mut config = WorkerConfig::new("BackEndDev", "Implement: {task}\nTarget OS: {os}");
        config.system_prompt = "You write production code.".into();
        config.specializations = vec!["api_development".into()];
        config.code_generation.enabled = true;
        config.code_generation.default_file_extension = ".rs".into();
        config
    }

    #[tokio::test]
    async fn prompt_template_is_formatted() {
        let service = ScriptedService::new("done");
        let camper = Camper::new(coder_config(), service.clone());

        camper.process("add two numbers", "linux", &[]).await;

        let requests = service.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].prompt,
            "Implement: add two numbers\nTarget OS: linux"
        );
        assert_eq!(requests[0].system_prompt, "You write production code.");
        assert_eq!(requests[0].max_tokens, Some(2000));
    }

    #[tokio::test]
    async fn relevant_context_is_appended() {
        let service = ScriptedService::new("done");
        let camper = Camper::new(coder_config(), service.clone());
        let prior = vec![CamperResponse::suggestion(
            "RequirementsGatherer",
            "must be pure functions",
            0.8,
        )];

        camper.process("add two numbers", "linux", &prior).await;

        let requests = service.requests.lock().await;
        assert!(requests[0].prompt.contains(relevance::CONTEXT_HEADER));
        assert!(requests[0]
            .prompt
            .contains("RequirementsGatherer: must be pure functions"));
    }

    #[tokio::test]
    async fn irrelevant_context_is_omitted() {
        let service = ScriptedService::new("done");
        let camper = Camper::new(coder_config(), service.clone());
        let prior = vec![CamperResponse::suggestion("TestWriter", "test notes", 0.8)];

        camper.process("add two numbers", "linux", &prior).await;

        let requests = service.requests.lock().await;
        assert!(!requests[0].prompt.contains(relevance::CONTEXT_HEADER));
    }

    #[tokio::test]
    async fn code_worker_extracts_files_at_threshold_confidence() {
        let service =
            ScriptedService::new("```src/add.rs\nfn add(a: i32, b: i32) -> i32 { a + b }\n```");
        let camper = Camper::new(coder_config(), service);

        let response = camper.process("add two numbers", "linux", &[]).await;
        assert_eq!(response.response_type, ResponseType::Code);
        assert_eq!(response.confidence_score, 0.7);
        assert_eq!(response.files_to_create.len(), 1);
        assert_eq!(response.files_to_create[0].path, "src/add.rs");
        assert!(!response.publication_blocked);
    }

    #[tokio::test]
    async fn command_worker_extracts_commands() {
        let mut config = WorkerConfig::new("OSExpert", "Guide: {task} on {os}");
        config.specializations = vec!["command_line_operations".into()];
        config.command_generation.enabled = true;
        let service = ScriptedService::new("$ mkdir build\n$ cargo build\n");
        let camper = Camper::new(config, service);

        let response = camper.process("set up the project", "linux", &[]).await;
        assert_eq!(response.response_type, ResponseType::Command);
        assert_eq!(
            response.commands_to_execute,
            vec!["mkdir build", "cargo build"]
        );
        assert!(response.files_to_create.is_empty());
    }

    #[tokio::test]
    async fn generation_failure_degrades_to_low_confidence() {
        let camper = Camper::new(coder_config(), Arc::new(BrokenService));

        let response = camper.process("add two numbers", "linux", &[]).await;
        assert_eq!(response.response_type, ResponseType::Suggestion);
        assert_eq!(response.confidence_score, 0.1);
        assert!(response.content.starts_with("Unable to generate a response"));
        assert!(response.files_to_create.is_empty());
    }

    #[tokio::test]
    async fn plain_worker_defaults_to_suggestion() {
        let config = WorkerConfig::new("RequirementsGatherer", "Analyze: {task}");
        let service = ScriptedService::new("requirement one");
        let camper = Camper::new(config, service);

        let response = camper.process("add two numbers", "linux", &[]).await;
        assert_eq!(response.response_type, ResponseType::Suggestion);
        assert_eq!(response.content, "requirement one");
    }
}
