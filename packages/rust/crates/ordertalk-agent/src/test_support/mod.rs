//! Test doubles for the pipeline's outbound collaborators.
//!
//! Shared by unit tests and integration tests so neither needs a live model
//! endpoint or order service.

mod logistics;
mod model;

pub use logistics::{RecordedCall, RecordingLogisticsApi, ScriptedApiReply};
pub use model::ScriptedModel;
