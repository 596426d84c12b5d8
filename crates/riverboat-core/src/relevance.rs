//! Relevance table for shared collaboration context.
//!
//! Decides which prior responses a worker gets to see. The decision is a
//! data-driven table of (consumer, producer) rules rather than role-name
//! conditionals: a response is relevant to a worker when any rule whose
//! consumer selector matches the worker also matches the response.

use riverboat_types::response::{CamperResponse, ResponseType};
use riverboat_types::workflow::WorkerConfig;

/// Matches the response side of a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Producer {
    /// Any prior response.
    Any,
    /// Responses of one type.
    OfType(ResponseType),
    /// Responses from one named role.
    Role(&'static str),
}

impl Producer {
    fn matches(&self, response: &CamperResponse) -> bool {
        match self {
            Producer::Any => true,
            Producer::OfType(kind) => response.response_type == *kind,
            Producer::Role(role) => response.role == *role,
        }
    }
}

/// One row: workers declaring `consumer_specialization` see responses
/// matching `producer`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceRule {
    pub consumer_specialization: &'static str,
    pub producer: Producer,
}

fn rule(consumer_specialization: &'static str, producer: Producer) -> RelevanceRule {
    RelevanceRule {
        consumer_specialization,
        producer,
    }
}

/// The rule set applied during collaboration.
#[derive(Debug, Clone)]
pub struct RelevanceTable {
    rules: Vec<RelevanceRule>,
}

impl RelevanceTable {
    /// The built-in rules:
    ///
    /// - review roles see everything
    /// - test roles see code responses
    /// - code roles see requirements and OS guidance
    /// - command roles see code responses and OS guidance
    pub fn new() -> Self {
        Self {
            rules: vec![
                rule("security_analysis", Producer::Any),
                rule("code_quality_review", Producer::Any),
                rule("testing", Producer::OfType(ResponseType::Code)),
                rule("test_generation", Producer::OfType(ResponseType::Code)),
                rule("api_development", Producer::Role("RequirementsGatherer")),
                rule("api_development", Producer::Role("OSExpert")),
                rule("ui_development", Producer::Role("RequirementsGatherer")),
                rule("ui_development", Producer::Role("OSExpert")),
                rule("infrastructure_as_code", Producer::Role("RequirementsGatherer")),
                rule("infrastructure_as_code", Producer::Role("OSExpert")),
                rule("command_line_operations", Producer::OfType(ResponseType::Code)),
                rule("command_line_operations", Producer::Role("RequirementsGatherer")),
                rule("debugging_commands", Producer::OfType(ResponseType::Code)),
            ],
        }
    }

    /// Whether `response` should be shown to a worker with `config`.
    ///
    /// No matching rule means not relevant.
    pub fn is_relevant(&self, config: &WorkerConfig, response: &CamperResponse) -> bool {
        self.rules.iter().any(|rule| {
            config
                .specializations
                .iter()
                .any(|s| s == rule.consumer_specialization)
                && rule.producer.matches(response)
        })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for RelevanceTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Header line above shared context in a worker prompt.
pub const CONTEXT_HEADER: &str = "--- CONTEXT FROM PREVIOUS CAMPERS ---";

/// Footer line below shared context.
pub const CONTEXT_FOOTER: &str = "--- END CONTEXT ---";

/// Per-response excerpt bound inside the context block.
const EXCERPT_CHARS: usize = 200;

/// Build the shared-context block for one worker, or `None` when no prior
/// response is relevant.
pub fn context_block(
    table: &RelevanceTable,
    config: &WorkerConfig,
    prior: &[CamperResponse],
) -> Option<String> {
    let lines: Vec<String> = prior
        .iter()
        .filter(|response| table.is_relevant(config, response))
        .map(|response| {
            let excerpt: String = response.content.chars().take(EXCERPT_CHARS).collect();
            format!("{}: {excerpt}", response.role)
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(format!(
        "{CONTEXT_HEADER}\n{}\n{CONTEXT_FOOTER}",
        lines.join("\n")
    ))
}
