use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ErrorKind;

use super::lenient;

/// Classified purpose of a user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Query,
    Modify,
    Insert,
    Clarify,
    Unknown,
}

impl Intent {
    const NAMES: [&'static str; 5] = ["query", "modify", "insert", "clarify", "unknown"];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Modify => "modify",
            Self::Insert => "insert",
            Self::Clarify => "clarify",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "query" => Some(Self::Query),
            "modify" => Some(Self::Modify),
            "insert" => Some(Self::Insert),
            "clarify" => Some(Self::Clarify),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Intents that enter the Action stage.
    #[must_use]
    pub const fn is_actionable(self) -> bool {
        matches!(self, Self::Query | Self::Modify | Self::Insert)
    }
}

impl<'de> Deserialize<'de> for Intent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| de::Error::unknown_variant(raw.trim(), &Self::NAMES))
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-type of a `modify` intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifyType {
    /// Change the overall transport status of an order.
    ModifyStatus,
    /// Edit one existing tracking node.
    ModifyNode,
}

impl ModifyType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ModifyStatus => "modify_status",
            Self::ModifyNode => "modify_node",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "modify_status" | "status" => Some(Self::ModifyStatus),
            "modify_node" | "node" => Some(Self::ModifyNode),
            _ => None,
        }
    }
}

fn lenient_modify_type<'de, D>(deserializer: D) -> Result<Option<ModifyType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::opt_string(deserializer)?.and_then(|raw| ModifyType::parse(&raw)))
}

/// The five transport status labels accepted by the order service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportStatus {
    AwaitingPickup,
    InTransit,
    Delivered,
    ReceiptReturned,
    Detained,
}

impl TransportStatus {
    pub const ALL: [Self; 5] = [
        Self::AwaitingPickup,
        Self::InTransit,
        Self::Delivered,
        Self::ReceiptReturned,
        Self::Detained,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingPickup => "待提货",
            Self::InTransit => "运输中",
            Self::Delivered => "已送达",
            Self::ReceiptReturned => "已回单",
            Self::Detained => "异常滞留",
        }
    }

    /// Exact label match after trimming surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }

    /// Labels joined by `、`, for error messages and prompts.
    #[must_use]
    pub fn allowed_labels() -> String {
        Self::ALL
            .iter()
            .map(|status| status.as_str())
            .collect::<Vec<_>>()
            .join("、")
    }
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransportStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransportStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            de::Error::custom(format!(
                "unknown transport status `{raw}`; expected one of {}",
                Self::allowed_labels()
            ))
        })
    }
}

/// Structured output of the Reasoning stage.
///
/// `transport_status_name` stays a raw string here; enum membership is checked
/// by the validation gate so an invalid label becomes a clarification instead
/// of a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningResult {
    pub intent: Intent,
    #[serde(
        default,
        deserialize_with = "lenient_modify_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub modify_type: Option<ModifyType>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub transport_status_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub tracking_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub node_location: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub operator: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub vehicle_plate: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub occurred_at_str: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub remark: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub clarification_questions: Vec<String>,
    #[serde(default, deserialize_with = "lenient::confidence")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub reasoning: String,
    /// Set by the Reasoning stage when the model call or its decoding failed; never read
    /// from model output.
    #[serde(skip)]
    pub failure: Option<ErrorKind>,
}

impl ReasoningResult {
    /// Blank result for `intent`; every optional field is `None`.
    #[must_use]
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            modify_type: None,
            order_id: None,
            order_number: None,
            transport_status_name: None,
            tracking_id: None,
            node_location: None,
            status_description: None,
            operator: None,
            vehicle_plate: None,
            occurred_at_str: None,
            remark: None,
            content: None,
            clarification_questions: Vec::new(),
            confidence: 0.0,
            reasoning: String::new(),
            failure: None,
        }
    }

    /// Synthetic result for a failed or unparsable reasoning call.
    #[must_use]
    pub fn unknown(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            ..Self::new(Intent::Unknown)
        }
    }

    /// `unknown` result marking a reasoning call that did not produce an answer.
    #[must_use]
    pub fn failed(kind: ErrorKind, reasoning: impl Into<String>) -> Self {
        Self {
            failure: Some(kind),
            ..Self::unknown(reasoning)
        }
    }

    /// Node fields a `modify_node` may change, paired with their field names.
    #[must_use]
    pub fn mutable_node_fields(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("node_location", self.node_location.as_deref()),
            ("status_description", self.status_description.as_deref()),
            ("operator", self.operator.as_deref()),
            ("vehicle_plate", self.vehicle_plate.as_deref()),
            ("occurred_at_str", self.occurred_at_str.as_deref()),
            ("remark", self.remark.as_deref()),
            ("content", self.content.as_deref()),
        ]
    }
}
