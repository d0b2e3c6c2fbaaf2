//! Conversational shipment-tracking backend.
//!
//! - **Pipeline**: Perceive -> Reason -> (Validate + Act)? -> Respond, one turn per request.
//! - **Session**: per-(user, session) message log (in-memory or Valkey) with per-session serialization.
//! - **Gateway**: axum HTTP routes and a stdio loop over the same pipeline.

#![allow(missing_docs)]

mod business;
mod config;
mod contracts;
mod error;
mod gateway;
mod llm;
mod observability;
mod pipeline;
mod session;
#[doc(hidden)]
pub mod test_support;

pub use business::{HttpLogisticsApi, LogisticsApi, node_id_from_response};
pub use config::{
    BusinessApiSettings, DASHSCOPE_COMPATIBLE_URL, DEFAULT_BUSINESS_API_BASE_URL, DEFAULT_MODEL,
    GatewaySettings, LlmSettings, MAX_REASONING_HISTORY_TURNS, PerceptionMode, PipelineConfig,
    PipelineSettings, RuntimeSettings, SessionSettings, load_runtime_settings,
    load_runtime_settings_from_paths, runtime_settings_paths, set_config_home_override,
};
pub use contracts::{
    ActionCommand, ActionFields, ActionKind, ActionResult, ChatRequest, ContentItem,
    DEFAULT_USER_ID, EnvelopeData, INLINE_IMAGE_PLACEHOLDER, Intent, ModelContentPart,
    ModelImageUrl, ModifyType, NodeInsert, NodeUpdate, PerceptionResult, ReasoningResult,
    ResponseEnvelope, StageKind, StatusUpdate, TransportStatus, UserInput, ValidatedCommand,
};
pub use error::{
    ActionError, BusinessApiError, ErrorKind, ModelError, PipelineError, StructuredOutputError,
    ValidationError,
};
pub use gateway::{
    DEFAULT_STDIO_SESSION_ID, DEFAULT_TURN_TIMEOUT_SECS, GatewayHealthResponse, GatewayState,
    HistoryQuery, OrderTalkRequest, OrderTalkResponse, SessionClearRequest, SessionClearResponse,
    SessionHistoryResponse, router, run_http, run_lines, run_stdio, validate_order_talk_request,
};
pub use llm::{ChatModel, CompletionRequest, LlmClient, LlmContent, LlmMessage, parse_structured};
pub use observability::PipelineEvent;
pub use pipeline::{
    ActionStage, PerceptionStage, Pipeline, ReasoningStage, ResponseStage, clarification_question,
    extract_order_number, is_date_format, optional_fields, recent_turns, required_fields,
    template_reply, validate, violations,
};
pub use session::{
    Message, MessageContent, MessageRole, SessionGate, SessionGuard, SessionKey, SessionMemory,
    SessionStore,
};
