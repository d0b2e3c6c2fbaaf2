use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ActionError, ErrorKind};

use super::reasoning::{Intent, ModifyType, ReasoningResult, TransportStatus};

/// Action names the Action stage dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Query,
    /// Overall status change.
    Modify,
    ModifyNode,
    Insert,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Modify => "modify",
            Self::ModifyNode => "modify_node",
            Self::Insert => "insert",
        }
    }

    /// `modify` without a sub-type is a node edit when a `tracking_id` is present.
    #[must_use]
    pub fn for_reasoning(reasoning: &ReasoningResult) -> Option<Self> {
        match reasoning.intent {
            Intent::Query => Some(Self::Query),
            Intent::Insert => Some(Self::Insert),
            Intent::Modify => Some(match reasoning.modify_type {
                Some(ModifyType::ModifyStatus) => Self::Modify,
                Some(ModifyType::ModifyNode) => Self::ModifyNode,
                None if reasoning.tracking_id.is_some() => Self::ModifyNode,
                None => Self::Modify,
            }),
            Intent::Clarify | Intent::Unknown => None,
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "query" => Some(Self::Query),
            "modify" => Some(Self::Modify),
            "modify_node" => Some(Self::ModifyNode),
            "insert" => Some(Self::Insert),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated action parameters copied from a reasoning result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_status_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_plate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ActionFields {
    #[must_use]
    pub fn from_reasoning(reasoning: &ReasoningResult) -> Self {
        Self {
            order_id: reasoning.order_id.clone(),
            order_number: reasoning.order_number.clone(),
            transport_status_name: reasoning.transport_status_name.clone(),
            tracking_id: reasoning.tracking_id.clone(),
            node_location: reasoning.node_location.clone(),
            status_description: reasoning.status_description.clone(),
            operator: reasoning.operator.clone(),
            vehicle_plate: reasoning.vehicle_plate.clone(),
            occurred_at_str: reasoning.occurred_at_str.clone(),
            remark: reasoning.remark.clone(),
            content: reasoning.content.clone(),
        }
    }
}

/// Command handed to the Action stage.
///
/// `action` stays a string so a name the stage does not know can be reported
/// as `unknown_action` rather than rejected while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCommand {
    pub action: String,
    pub session_id: String,
    #[serde(flatten)]
    pub fields: ActionFields,
}

impl ActionCommand {
    #[must_use]
    pub fn new(action: ActionKind, session_id: impl Into<String>, fields: ActionFields) -> Self {
        Self {
            action: action.as_str().to_string(),
            session_id: session_id.into(),
            fields,
        }
    }

    /// Deterministic mapping from reasoning output; `None` for non-actionable intents.
    #[must_use]
    pub fn from_reasoning(reasoning: &ReasoningResult, session_id: &str) -> Option<Self> {
        let kind = ActionKind::for_reasoning(reasoning)?;
        Some(Self::new(
            kind,
            session_id,
            ActionFields::from_reasoning(reasoning),
        ))
    }
}

/// Payload of `updateOrderInfo`. At least one of `order_id`/`order_number` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    pub transport_status_name: TransportStatus,
    pub session_id: String,
}

/// Payload of `updateLogisticsTrackInfo`; absent optionals are omitted so the
/// upstream keeps its stored values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    pub order_id: String,
    pub session_id: String,
    #[serde(rename = "id")]
    pub tracking_id: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_at_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Payload of `insertLogisticsTrackInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInsert {
    pub order_id: String,
    pub session_id: String,
    pub status_description: String,
    pub location: String,
    pub occurred_at_str: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A command that passed the validation gate; the only input of a business call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedCommand {
    Query { order_number: String },
    ModifyStatus(StatusUpdate),
    ModifyNode(NodeUpdate),
    Insert(NodeInsert),
}

impl ValidatedCommand {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Query { .. } => ActionKind::Query,
            Self::ModifyStatus(_) => ActionKind::Modify,
            Self::ModifyNode(_) => ActionKind::ModifyNode,
            Self::Insert(_) => ActionKind::Insert,
        }
    }
}

/// Terminal artifact of the Action stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub action: String,
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Field that failed validation, when the rejection names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_field: Option<String>,
}

impl ActionResult {
    #[must_use]
    pub fn succeeded(action: ActionKind, message: impl Into<String>, data: Value) -> Self {
        Self {
            action: action.as_str().to_string(),
            success: true,
            message: message.into(),
            data,
            error: None,
            error_kind: None,
            error_field: None,
        }
    }

    #[must_use]
    pub fn failed(action: impl Into<String>, message: impl Into<String>, error: &ActionError) -> Self {
        Self {
            action: action.into(),
            success: false,
            message: message.into(),
            data: Value::Object(serde_json::Map::new()),
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            error_field: error.field().map(str::to_string),
        }
    }

    /// True when the failure is a validation rejection and should be answered with a question.
    #[must_use]
    pub fn is_validation_failure(&self) -> bool {
        self.error_kind.is_some_and(ErrorKind::is_validation)
    }
}
