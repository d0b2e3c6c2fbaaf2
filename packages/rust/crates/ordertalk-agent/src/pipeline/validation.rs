//! Validation gate: the only path from untrusted action fields to a business call.

use std::sync::LazyLock;

use regex::Regex;

use crate::contracts::{
    ActionFields, ActionKind, NodeInsert, NodeUpdate, StatusUpdate, TransportStatus,
    ValidatedCommand,
};
use crate::error::ValidationError;

/// `yyyy-MM-dd`, ASCII digits only.
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$")
        .unwrap_or_else(|err| panic!("invalid DATE_PATTERN regex: {err}"))
});

const QUERY_REQUIRED: &[&str] = &["order_number"];
const MODIFY_REQUIRED: &[&str] = &["order_number|order_id", "transport_status_name"];
const MODIFY_NODE_REQUIRED: &[&str] = &["order_id", "tracking_id", "node_location"];
const INSERT_REQUIRED: &[&str] = &[
    "order_id",
    "status_description",
    "node_location",
    "occurred_at_str",
];
const MODIFY_NODE_OPTIONAL: &[&str] = &[
    "status_description",
    "operator",
    "vehicle_plate",
    "occurred_at_str",
    "remark",
    "content",
];
const INSERT_OPTIONAL: &[&str] = &["operator", "vehicle_plate", "remark", "content"];

/// Required fields per action; `a|b` means either one.
#[must_use]
pub fn required_fields(action: ActionKind) -> &'static [&'static str] {
    match action {
        ActionKind::Query => QUERY_REQUIRED,
        ActionKind::Modify => MODIFY_REQUIRED,
        ActionKind::ModifyNode => MODIFY_NODE_REQUIRED,
        ActionKind::Insert => INSERT_REQUIRED,
    }
}

#[must_use]
pub fn optional_fields(action: ActionKind) -> &'static [&'static str] {
    match action {
        ActionKind::Query | ActionKind::Modify => &[],
        ActionKind::ModifyNode => MODIFY_NODE_OPTIONAL,
        ActionKind::Insert => INSERT_OPTIONAL,
    }
}

#[must_use]
pub fn is_date_format(raw: &str) -> bool {
    DATE_PATTERN.is_match(raw)
}

fn present(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require(field: &'static str, value: Option<&String>) -> Result<String, ValidationError> {
    present(value).ok_or(ValidationError::ParameterMissing { field })
}

fn check_date(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if is_date_format(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidDateFormat {
            field,
            value: value.to_string(),
        })
    }
}

fn parse_status(value: &str) -> Result<TransportStatus, ValidationError> {
    TransportStatus::parse(value).ok_or_else(|| ValidationError::InvalidEnumValue {
        field: "transport_status_name",
        value: value.to_string(),
        allowed: TransportStatus::allowed_labels(),
    })
}

fn has_mutable_node_field(fields: &ActionFields) -> bool {
    [
        &fields.node_location,
        &fields.status_description,
        &fields.operator,
        &fields.vehicle_plate,
        &fields.occurred_at_str,
        &fields.remark,
        &fields.content,
    ]
    .into_iter()
    .any(|value| present(value.as_ref()).is_some())
}

/// Check presence, enum membership and date format; first violation wins.
///
/// # Errors
/// The first [`ValidationError`] found, in the order the fields are asked for.
pub fn validate(
    action: ActionKind,
    session_id: &str,
    fields: &ActionFields,
) -> Result<ValidatedCommand, ValidationError> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(ValidationError::ParameterMissing {
            field: "session_id",
        });
    }
    let session_id = session_id.to_string();

    match action {
        ActionKind::Query => Ok(ValidatedCommand::Query {
            order_number: require("order_number", fields.order_number.as_ref())?,
        }),
        ActionKind::Modify => {
            let order_id = present(fields.order_id.as_ref());
            let order_number = present(fields.order_number.as_ref());
            if order_id.is_none() && order_number.is_none() {
                return Err(ValidationError::ParameterMissing {
                    field: "order_number",
                });
            }
            let status = require(
                "transport_status_name",
                fields.transport_status_name.as_ref(),
            )?;
            Ok(ValidatedCommand::ModifyStatus(StatusUpdate {
                order_id,
                order_number,
                transport_status_name: parse_status(&status)?,
                session_id,
            }))
        }
        ActionKind::ModifyNode => {
            let order_id = require("order_id", fields.order_id.as_ref())?;
            let tracking_id = require("tracking_id", fields.tracking_id.as_ref())?;
            if !has_mutable_node_field(fields) {
                return Err(ValidationError::NoMutableField);
            }
            let location = require("node_location", fields.node_location.as_ref())?;
            let occurred_at_str = present(fields.occurred_at_str.as_ref());
            if let Some(ref date) = occurred_at_str {
                check_date("occurred_at_str", date)?;
            }
            Ok(ValidatedCommand::ModifyNode(NodeUpdate {
                order_id,
                session_id,
                tracking_id,
                location,
                status_description: present(fields.status_description.as_ref()),
                operator: present(fields.operator.as_ref()),
                vehicle_plate: present(fields.vehicle_plate.as_ref()),
                occurred_at_str,
                remark: present(fields.remark.as_ref()),
                content: present(fields.content.as_ref()),
            }))
        }
        ActionKind::Insert => {
            let order_id = require("order_id", fields.order_id.as_ref())?;
            let status_description =
                require("status_description", fields.status_description.as_ref())?;
            let location = require("node_location", fields.node_location.as_ref())?;
            let occurred_at_str = require("occurred_at_str", fields.occurred_at_str.as_ref())?;
            check_date("occurred_at_str", &occurred_at_str)?;
            Ok(ValidatedCommand::Insert(NodeInsert {
                order_id,
                session_id,
                status_description,
                location,
                occurred_at_str,
                operator: present(fields.operator.as_ref()),
                vehicle_plate: present(fields.vehicle_plate.as_ref()),
                remark: present(fields.remark.as_ref()),
                content: present(fields.content.as_ref()),
            }))
        }
    }
}

/// Every violation of `fields` for `action`, one entry per field.
#[must_use]
pub fn violations(action: ActionKind, fields: &ActionFields) -> Vec<ValidationError> {
    let mut out = Vec::new();
    let mut missing = |field: &'static str, value: &Option<String>| {
        if present(value.as_ref()).is_none() {
            out.push(ValidationError::ParameterMissing { field });
            true
        } else {
            false
        }
    };
    let mut extra = Vec::new();
    match action {
        ActionKind::Query => {
            missing("order_number", &fields.order_number);
        }
        ActionKind::Modify => {
            if present(fields.order_id.as_ref()).is_none() {
                missing("order_number", &fields.order_number);
            }
            if !missing("transport_status_name", &fields.transport_status_name)
                && let Some(ref status) = fields.transport_status_name
                && let Err(error) = parse_status(status)
            {
                extra.push(error);
            }
        }
        ActionKind::ModifyNode => {
            missing("order_id", &fields.order_id);
            missing("tracking_id", &fields.tracking_id);
            if has_mutable_node_field(fields) {
                missing("node_location", &fields.node_location);
            } else {
                extra.push(ValidationError::NoMutableField);
            }
            if let Some(date) = present(fields.occurred_at_str.as_ref())
                && let Err(error) = check_date("occurred_at_str", &date)
            {
                extra.push(error);
            }
        }
        ActionKind::Insert => {
            missing("order_id", &fields.order_id);
            missing("status_description", &fields.status_description);
            missing("node_location", &fields.node_location);
            if !missing("occurred_at_str", &fields.occurred_at_str)
                && let Some(date) = present(fields.occurred_at_str.as_ref())
                && let Err(error) = check_date("occurred_at_str", &date)
            {
                extra.push(error);
            }
        }
    }
    out.extend(extra);
    out
}

/// User-facing question that resolves `error`.
#[must_use]
pub fn clarification_question(error: &ValidationError) -> String {
    match error {
        ValidationError::ParameterMissing { field } => missing_field_question(field),
        ValidationError::InvalidEnumValue { value, allowed, .. } => {
            format!("「{value}」不是有效的运输状态，请从以下选项中选择：{allowed}。")
        }
        ValidationError::InvalidDateFormat { value, .. } => {
            format!("发生时间「{value}」格式不正确，请按 yyyy-MM-dd 格式提供，例如 2024-01-15。")
        }
        ValidationError::NoMutableField => {
            "请问需要修改该物流节点的哪些信息？（地点、状态描述、操作人、车牌号、发生时间、备注或物流信息）"
                .to_string()
        }
    }
}

fn missing_field_question(field: &str) -> String {
    match field {
        "order_number" => "请问您要操作的订单号是多少？".to_string(),
        "order_id" => "请先告诉我订单号，我查询订单后才能确定要操作的订单。".to_string(),
        "transport_status_name" => format!(
            "请问要把运输状态修改为什么？可选：{}。",
            TransportStatus::allowed_labels()
        ),
        "tracking_id" => "请问要修改哪一个物流节点？可以先查询订单的物流轨迹再指定节点。".to_string(),
        "node_location" => "请问该物流节点的发生地点是哪里？".to_string(),
        "status_description" => "请问该物流节点的状态描述是什么？（例如：已到达北京转运中心）".to_string(),
        "occurred_at_str" => "请问该物流节点的发生时间是哪一天？（格式：yyyy-MM-dd）".to_string(),
        "session_id" => "会话标识缺失，请重新发起对话。".to_string(),
        other => format!("请补充 {other} 信息。"),
    }
}

#[cfg(test)]
#[path = "../../tests/pipeline/validation.rs"]
mod tests;
