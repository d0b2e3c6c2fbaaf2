//! Conversational pipeline: stages, validation gate and per-turn orchestration.

mod action;
mod orchestrator;
mod perception;
mod reasoning;
mod response;
mod validation;

pub use action::ActionStage;
pub use orchestrator::Pipeline;
pub use perception::{PerceptionStage, extract_order_number};
pub use reasoning::{ReasoningStage, recent_turns};
pub use response::{ResponseStage, template_reply};
pub use validation::{
    clarification_question, is_date_format, optional_fields, required_fields, validate,
    violations,
};
