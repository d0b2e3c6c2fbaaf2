//! Structured data exchanged between pipeline stages.

mod action;
mod envelope;
mod input;
pub(crate) mod lenient;
mod perception;
mod reasoning;
mod stage;

pub use action::{
    ActionCommand, ActionFields, ActionKind, ActionResult, NodeInsert, NodeUpdate, StatusUpdate,
    ValidatedCommand,
};
pub use envelope::{ChatRequest, DEFAULT_USER_ID, EnvelopeData, ResponseEnvelope};
pub use input::{
    ContentItem, INLINE_IMAGE_PLACEHOLDER, ModelContentPart, ModelImageUrl, UserInput,
};
pub use perception::PerceptionResult;
pub use reasoning::{Intent, ModifyType, ReasoningResult, TransportStatus};
pub use stage::StageKind;
