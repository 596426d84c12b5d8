//! # riverboat-types
//!
//! Core type definitions for the Riverboat task-processing pipeline.
//!
//! This crate is the foundation of the dependency graph -- all other
//! riverboat crates depend on it. It contains:
//!
//! - **[`envelope`]** -- [`TaskEnvelope`] and its attachment/context parts
//! - **[`response`]** -- Worker [`CamperResponse`] contributions
//! - **[`verdict`]** -- Security [`ValidationVerdict`] produced by validation
//! - **[`workflow`]** -- [`Workflow`] and [`WorkerConfig`] configuration entities
//! - **[`record`]** -- Durable-store [`RecordMetadata`]
//! - **[`package`]** -- The outgoing [`Package`] envelope
//! - **[`outcome`]** -- The typed [`PipelineOutcome`] result
//! - **[`error`]** -- [`RiverboatError`] taxonomy and [`Result`] alias
//!
//! [`TaskEnvelope`]: envelope::TaskEnvelope
//! [`CamperResponse`]: response::CamperResponse
//! [`ValidationVerdict`]: verdict::ValidationVerdict
//! [`Workflow`]: workflow::Workflow
//! [`WorkerConfig`]: workflow::WorkerConfig
//! [`RecordMetadata`]: record::RecordMetadata
//! [`Package`]: package::Package
//! [`PipelineOutcome`]: outcome::PipelineOutcome
//! [`RiverboatError`]: error::RiverboatError

pub mod envelope;
pub mod error;
pub mod outcome;
pub mod package;
pub mod record;
pub mod response;
pub mod verdict;
pub mod workflow;

pub use error::{ErrorSeverity, Result, RiverboatError};
pub use outcome::PipelineOutcome;
