//! Stable event names for structured logs.
//!
//! Every `tracing` call that marks a pipeline or session milestone carries
//! `event = PipelineEvent::X.as_str()` so log queries do not depend on message text.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    TurnStarted,
    TurnCompleted,
    TurnFaulted,
    PerceptionCompleted,
    PerceptionSkipped,
    PerceptionFailed,
    ReasoningCompleted,
    ReasoningFailed,
    ReasoningRequirementsUnmet,
    ActionDispatched,
    ActionCompleted,
    ActionRejected,
    ActionUpstreamFailed,
    ActionUnknown,
    ResponseRendered,
    ResponseFallback,
    SessionBackendEnabled,
    SessionMessagesAppended,
    SessionMessagesLoaded,
    SessionMessageDecodeFailed,
    SessionMessagesCleared,
    SessionPersistFailed,
    SessionValkeyConnected,
    SessionValkeyCommandRetryFailed,
    SessionGateContended,
}

impl PipelineEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TurnStarted => "ordertalk.turn.started",
            Self::TurnCompleted => "ordertalk.turn.completed",
            Self::TurnFaulted => "ordertalk.turn.faulted",
            Self::PerceptionCompleted => "ordertalk.perception.completed",
            Self::PerceptionSkipped => "ordertalk.perception.skipped",
            Self::PerceptionFailed => "ordertalk.perception.failed",
            Self::ReasoningCompleted => "ordertalk.reasoning.completed",
            Self::ReasoningFailed => "ordertalk.reasoning.failed",
            Self::ReasoningRequirementsUnmet => "ordertalk.reasoning.requirements_unmet",
            Self::ActionDispatched => "ordertalk.action.dispatched",
            Self::ActionCompleted => "ordertalk.action.completed",
            Self::ActionRejected => "ordertalk.action.rejected",
            Self::ActionUpstreamFailed => "ordertalk.action.upstream_failed",
            Self::ActionUnknown => "ordertalk.action.unknown",
            Self::ResponseRendered => "ordertalk.response.rendered",
            Self::ResponseFallback => "ordertalk.response.fallback",
            Self::SessionBackendEnabled => "ordertalk.session.backend_enabled",
            Self::SessionMessagesAppended => "ordertalk.session.messages_appended",
            Self::SessionMessagesLoaded => "ordertalk.session.messages_loaded",
            Self::SessionMessageDecodeFailed => "ordertalk.session.message_decode_failed",
            Self::SessionMessagesCleared => "ordertalk.session.messages_cleared",
            Self::SessionPersistFailed => "ordertalk.session.persist_failed",
            Self::SessionValkeyConnected => "ordertalk.session.valkey_connected",
            Self::SessionValkeyCommandRetryFailed => "ordertalk.session.valkey_command_retry_failed",
            Self::SessionGateContended => "ordertalk.session.gate_contended",
        }
    }
}
