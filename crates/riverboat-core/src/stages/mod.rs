//! The four pipeline stages.
//!
//! Unpack and package are pure data transforms; validate wraps the security
//! crate; collaborate is the only stage that talks to the generation
//! service. The orchestrator sequences them.

pub mod collaborate;
pub mod package;
pub mod unpack;
pub mod validate;

pub use collaborate::{CollaborateStage, CollaborationOutput};
pub use package::build_package;
pub use unpack::{UnpackedTask, unpack};
pub use validate::ValidateStage;
