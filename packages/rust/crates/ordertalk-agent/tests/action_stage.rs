#![allow(missing_docs)]

use std::sync::Arc;

use ordertalk_agent::test_support::{RecordedCall, RecordingLogisticsApi};
use ordertalk_agent::{
    ActionCommand, ActionFields, ActionKind, ActionStage, ErrorKind, TransportStatus,
};
use serde_json::json;

fn insert_fields() -> ActionFields {
    ActionFields {
        order_id: Some("1001".to_string()),
        status_description: Some("已到达北京转运中心".to_string()),
        node_location: Some("北京转运中心".to_string()),
        occurred_at_str: Some("2024-01-13".to_string()),
        ..ActionFields::default()
    }
}

#[tokio::test]
async fn insert_with_bad_date_makes_no_outbound_call() {
    let api = Arc::new(RecordingLogisticsApi::default());
    let stage = ActionStage::new(api.clone());
    let command = ActionCommand::new(
        ActionKind::Insert,
        "s1",
        ActionFields {
            occurred_at_str: Some("2024/01/13".to_string()),
            ..insert_fields()
        },
    );

    let result = stage.act(&command).await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::InvalidDateFormat));
    assert!(result.error.as_deref().unwrap_or_default().contains("date format"));
    assert!(result.is_validation_failure());
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn status_outside_enum_makes_no_outbound_call() {
    let api = Arc::new(RecordingLogisticsApi::default());
    let stage = ActionStage::new(api.clone());
    let command = ActionCommand::new(
        ActionKind::Modify,
        "s1",
        ActionFields {
            order_number: Some("order1234567890".to_string()),
            transport_status_name: Some("已签收".to_string()),
            ..ActionFields::default()
        },
    );

    let result = stage.act(&command).await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::InvalidEnumValue));
    assert_eq!(result.error_field.as_deref(), Some("transport_status_name"));
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn modify_status_echoes_session_for_audit() {
    let api = Arc::new(RecordingLogisticsApi::default());
    let stage = ActionStage::new(api.clone());
    let command = ActionCommand::new(
        ActionKind::Modify,
        "audit-session",
        ActionFields {
            order_number: Some("order1234567890".to_string()),
            transport_status_name: Some("已送达".to_string()),
            ..ActionFields::default()
        },
    );

    let result = stage.act(&command).await;
    assert!(result.success, "{result:?}");
    let calls = api.calls();
    let [RecordedCall::UpdateOrderInfo(update)] = calls.as_slice() else {
        panic!("expected one status update, got {calls:?}");
    };
    assert_eq!(update.session_id, "audit-session");
    assert_eq!(update.transport_status_name, TransportStatus::Delivered);
    assert!(result.message.contains("已送达"));
}

#[tokio::test]
async fn modify_node_sends_only_mentioned_fields() {
    let api = Arc::new(RecordingLogisticsApi::default());
    let stage = ActionStage::new(api.clone());
    let command = ActionCommand::new(
        ActionKind::ModifyNode,
        "s1",
        ActionFields {
            order_id: Some("1001".to_string()),
            tracking_id: Some("77".to_string()),
            node_location: Some("上海分拨中心".to_string()),
            vehicle_plate: Some("沪A12345".to_string()),
            ..ActionFields::default()
        },
    );

    let result = stage.act(&command).await;
    assert!(result.success);
    let calls = api.calls();
    let [RecordedCall::UpdateTrackInfo(update)] = calls.as_slice() else {
        panic!("expected one node update, got {calls:?}");
    };
    let payload = serde_json::to_value(update).expect("serialize payload");
    let mut keys: Vec<_> = payload
        .as_object()
        .expect("object payload")
        .keys()
        .cloned()
        .collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["id", "location", "orderId", "sessionId", "vehiclePlate"]
    );
}

#[tokio::test]
async fn insert_reports_upstream_node_id() {
    let api = Arc::new(
        RecordingLogisticsApi::default().respond(
            ActionKind::Insert,
            json!({"success": true, "data": {"nodeId": 9001}}),
        ),
    );
    let stage = ActionStage::new(api.clone());
    let command = ActionCommand::new(ActionKind::Insert, "s1", insert_fields());

    let result = stage.act(&command).await;
    assert!(result.success);
    assert_eq!(result.data["node_id"], json!("9001"));
    assert!(result.message.contains("9001"));
    assert_eq!(api.call_count(), 1);
}

#[tokio::test]
async fn insert_without_upstream_id_leaves_it_null() {
    let api = Arc::new(RecordingLogisticsApi::default());
    let stage = ActionStage::new(api);
    let result = stage
        .act(&ActionCommand::new(ActionKind::Insert, "s1", insert_fields()))
        .await;
    assert!(result.success);
    assert!(result.data["node_id"].is_null());
}

#[tokio::test]
async fn upstream_rejection_becomes_failed_result_with_retry_guidance() {
    let api = Arc::new(RecordingLogisticsApi::default().reject(ActionKind::Query, "订单不存在"));
    let stage = ActionStage::new(api.clone());
    let command = ActionCommand::new(
        ActionKind::Query,
        "s1",
        ActionFields {
            order_number: Some("order0000000000".to_string()),
            ..ActionFields::default()
        },
    );

    let result = stage.act(&command).await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::UpstreamApi));
    assert!(result.message.contains("稍后重试"));
    assert!(result.message.contains("订单不存在"));
    assert!(!result.is_validation_failure());
    assert_eq!(api.call_count(), 1);
}

#[tokio::test]
async fn unknown_action_is_reported_distinctly() {
    let api = Arc::new(RecordingLogisticsApi::default());
    let stage = ActionStage::new(api.clone());
    let command = ActionCommand {
        action: "delete".to_string(),
        session_id: "s1".to_string(),
        fields: ActionFields::default(),
    };

    let result = stage.act(&command).await;
    assert!(!result.success);
    assert_eq!(result.action, "delete");
    assert_eq!(result.error_kind, Some(ErrorKind::UnknownAction));
    assert!(!result.is_validation_failure());
    assert_eq!(api.call_count(), 0);
}
