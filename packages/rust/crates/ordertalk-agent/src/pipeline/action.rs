//! Action stage: validated dispatch to the order service.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::business::{LogisticsApi, node_id_from_response};
use crate::contracts::{ActionCommand, ActionKind, ActionResult, ValidatedCommand};
use crate::error::{ActionError, BusinessApiError};
use crate::observability::PipelineEvent;

use super::validation::validate;

pub struct ActionStage {
    api: Arc<dyn LogisticsApi>,
}

impl ActionStage {
    #[must_use]
    pub fn new(api: Arc<dyn LogisticsApi>) -> Self {
        Self { api }
    }

    /// Validate `command` and run it. Every failure is folded into the result.
    pub async fn act(&self, command: &ActionCommand) -> ActionResult {
        let Some(kind) = ActionKind::parse(&command.action) else {
            let error = ActionError::UnknownAction(command.action.clone());
            tracing::error!(
                event = PipelineEvent::ActionUnknown.as_str(),
                action = %command.action,
                session_id = %command.session_id,
                "action name not recognized"
            );
            return ActionResult::failed(
                command.action.clone(),
                format!("无法识别的操作类型: {}", command.action),
                &error,
            );
        };

        let validated = match validate(kind, &command.session_id, &command.fields) {
            Ok(validated) => validated,
            Err(error) => {
                tracing::info!(
                    event = PipelineEvent::ActionRejected.as_str(),
                    action = kind.as_str(),
                    error_kind = error.kind().as_str(),
                    field = error.field(),
                    "action rejected by validation"
                );
                let message = format!("参数校验失败: {error}");
                return ActionResult::failed(kind.as_str(), message, &ActionError::from(error));
            }
        };

        tracing::info!(
            event = PipelineEvent::ActionDispatched.as_str(),
            action = kind.as_str(),
            session_id = %command.session_id,
            "dispatching action"
        );
        match self.dispatch(&validated).await {
            Ok(result) => {
                tracing::info!(
                    event = PipelineEvent::ActionCompleted.as_str(),
                    action = kind.as_str(),
                    "action completed"
                );
                result
            }
            Err(error) => {
                tracing::warn!(
                    event = PipelineEvent::ActionUpstreamFailed.as_str(),
                    action = kind.as_str(),
                    error = %error,
                    "order service call failed"
                );
                let message = format!("{}失败，请稍后重试: {error}", operation_label(kind));
                ActionResult::failed(kind.as_str(), message, &ActionError::from(error))
            }
        }
    }

    async fn dispatch(&self, command: &ValidatedCommand) -> Result<ActionResult, BusinessApiError> {
        match command {
            ValidatedCommand::Query { order_number } => {
                let body = self.api.get_order_info(order_number).await?;
                Ok(ActionResult::succeeded(
                    ActionKind::Query,
                    format!("订单 {order_number} 查询成功"),
                    body,
                ))
            }
            ValidatedCommand::ModifyStatus(update) => {
                let body = self.api.update_order_info(update).await?;
                let target = update
                    .order_number
                    .as_deref()
                    .or(update.order_id.as_deref())
                    .unwrap_or_default();
                Ok(ActionResult::succeeded(
                    ActionKind::Modify,
                    format!(
                        "订单 {target} 运输状态已更新为「{}」",
                        update.transport_status_name
                    ),
                    json!({
                        "order_id": update.order_id,
                        "order_number": update.order_number,
                        "transport_status_name": update.transport_status_name,
                        "response": body,
                    }),
                ))
            }
            ValidatedCommand::ModifyNode(update) => {
                let body = self.api.update_track_info(update).await?;
                Ok(ActionResult::succeeded(
                    ActionKind::ModifyNode,
                    format!(
                        "订单 {} 的物流节点 {} 已更新",
                        update.order_id, update.tracking_id
                    ),
                    json!({
                        "order_id": update.order_id,
                        "tracking_id": update.tracking_id,
                        "updated": update,
                        "response": body,
                    }),
                ))
            }
            ValidatedCommand::Insert(insert) => {
                let body = self.api.insert_track_info(insert).await?;
                let node_id = node_id_from_response(&body);
                let message = match node_id {
                    Some(ref id) => format!("已为订单 {} 新增物流节点（节点ID: {id}）", insert.order_id),
                    None => format!("已为订单 {} 新增物流节点", insert.order_id),
                };
                Ok(ActionResult::succeeded(
                    ActionKind::Insert,
                    message,
                    json!({
                        "order_id": insert.order_id,
                        "node_id": node_id.map_or(Value::Null, Value::String),
                        "response": body,
                    }),
                ))
            }
        }
    }
}

fn operation_label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Query => "查询订单",
        ActionKind::Modify => "修改运输状态",
        ActionKind::ModifyNode => "修改物流节点",
        ActionKind::Insert => "新增物流节点",
    }
}
