//! Generation service client for riverboat workers.
//!
//! Workers delegate text generation to an external OpenAI-compatible
//! endpoint through the [`GenerationService`] trait. The shipped
//! implementation is [`HttpGenerator`]; tests substitute their own
//! implementations to avoid the network.

pub mod error;
pub mod http;
pub mod service;
pub mod types;

pub use error::{GenerationError, Result};
pub use http::{GeneratorConfig, HttpGenerator};
pub use service::GenerationService;
pub use types::{GenerationRequest, GenerationResponse};
