use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::business::LogisticsApi;
use crate::contracts::{ActionKind, NodeInsert, NodeUpdate, StatusUpdate};
use crate::error::BusinessApiError;

/// Canned outcome of one order-service operation.
#[derive(Debug, Clone)]
pub enum ScriptedApiReply {
    Body(Value),
    Rejected(String),
    Status(u16),
}

/// One call received by [`RecordingLogisticsApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    GetOrderInfo(String),
    UpdateOrderInfo(StatusUpdate),
    UpdateTrackInfo(NodeUpdate),
    InsertTrackInfo(NodeInsert),
}

impl RecordedCall {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::GetOrderInfo(_) => ActionKind::Query,
            Self::UpdateOrderInfo(_) => ActionKind::Modify,
            Self::UpdateTrackInfo(_) => ActionKind::ModifyNode,
            Self::InsertTrackInfo(_) => ActionKind::Insert,
        }
    }
}

/// `LogisticsApi` with one canned reply per operation (default `{"success": true}`).
#[derive(Default)]
pub struct RecordingLogisticsApi {
    replies: HashMap<ActionKind, ScriptedApiReply>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingLogisticsApi {
    #[must_use]
    pub fn respond(mut self, kind: ActionKind, body: Value) -> Self {
        self.replies.insert(kind, ScriptedApiReply::Body(body));
        self
    }

    #[must_use]
    pub fn reject(mut self, kind: ActionKind, message: impl Into<String>) -> Self {
        self.replies
            .insert(kind, ScriptedApiReply::Rejected(message.into()));
        self
    }

    #[must_use]
    pub fn status(mut self, kind: ActionKind, status: u16) -> Self {
        self.replies.insert(kind, ScriptedApiReply::Status(status));
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn record(&self, call: RecordedCall) -> Result<Value, BusinessApiError> {
        let kind = call.kind();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        match self.replies.get(&kind) {
            None => Ok(json!({"success": true})),
            Some(ScriptedApiReply::Body(body)) => Ok(body.clone()),
            Some(ScriptedApiReply::Rejected(message)) => {
                Err(BusinessApiError::Rejected(message.clone()))
            }
            Some(ScriptedApiReply::Status(status)) => Err(BusinessApiError::Status {
                status: *status,
                body: "scripted failure".to_string(),
            }),
        }
    }
}

#[async_trait]
impl LogisticsApi for RecordingLogisticsApi {
    async fn get_order_info(&self, order_number: &str) -> Result<Value, BusinessApiError> {
        self.record(RecordedCall::GetOrderInfo(order_number.to_string()))
    }

    async fn update_order_info(&self, update: &StatusUpdate) -> Result<Value, BusinessApiError> {
        self.record(RecordedCall::UpdateOrderInfo(update.clone()))
    }

    async fn update_track_info(&self, update: &NodeUpdate) -> Result<Value, BusinessApiError> {
        self.record(RecordedCall::UpdateTrackInfo(update.clone()))
    }

    async fn insert_track_info(&self, insert: &NodeInsert) -> Result<Value, BusinessApiError> {
        self.record(RecordedCall::InsertTrackInfo(insert.clone()))
    }
}
