//! # riverboat-core
//!
//! The staged task-processing pipeline behind Riverboat.
//!
//! An inbound [`TaskEnvelope`] travels through four stages: unpack,
//! validate, collaborate, and package. [`Riverboat`] owns the stages and
//! their collaborators (durable store, result cache, workflow registry,
//! event sink) and exposes the whole pipeline as one `receive` call.
//!
//! - **[`orchestrator`]** -- the [`Riverboat`] pipeline front door
//! - **[`stages`]** -- the four stage implementations
//! - **[`worker`]** -- role-configured [`Camper`] generation workers
//! - **[`audit`]** -- the pre-publication [`AuditGate`]
//! - **[`registry`]** -- hot-reloadable workflow and worker definitions
//! - **[`store`]** -- durable envelope and package records
//! - **[`cache`]** -- fingerprint-keyed result cache
//! - **[`events`]** -- lifecycle notification channels
//! - **[`config`]** -- TOML-backed runtime configuration
//! - **[`history`]** -- bounded in-memory error history
//!
//! The remaining modules ([`extract`], [`relevance`], [`mime`]) are content
//! helpers shared by the workers and the packaging stage.
//!
//! [`TaskEnvelope`]: riverboat_types::envelope::TaskEnvelope
//! [`Riverboat`]: orchestrator::Riverboat
//! [`Camper`]: worker::Camper
//! [`AuditGate`]: audit::AuditGate

pub mod audit;
pub mod cache;
pub mod config;
pub mod events;
pub mod extract;
pub mod history;
pub mod mime;
pub mod orchestrator;
pub mod registry;
pub mod relevance;
pub mod stages;
pub mod store;
pub mod worker;

pub use audit::AuditGate;
pub use cache::{CacheBackend, InMemoryCache};
pub use config::RiverboatConfig;
pub use events::{EventSink, LogSink};
pub use history::{ErrorHistory, ErrorStatistics};
pub use orchestrator::Riverboat;
pub use registry::{WorkflowRegistry, WorkflowSnapshot};
pub use store::{DurableStore, StoredRecord};
pub use worker::Camper;
