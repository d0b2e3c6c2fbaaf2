//! Gateway namespace: HTTP and stdio entrypoints.

mod http;
mod stdio;

pub use http::{
    DEFAULT_TURN_TIMEOUT_SECS, GatewayHealthResponse, GatewayState, HistoryQuery,
    OrderTalkRequest, OrderTalkResponse, SessionClearRequest, SessionClearResponse,
    SessionHistoryResponse, router, run_http, validate_order_talk_request,
};
pub use stdio::{DEFAULT_STDIO_SESSION_ID, run_lines, run_stdio};
