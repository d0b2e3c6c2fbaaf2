use std::sync::Arc;

use super::{PerceptionStage, extract_order_number};
use crate::config::PerceptionMode;
use crate::contracts::{ContentItem, StageKind, UserInput};
use crate::test_support::ScriptedModel;

#[test]
fn extract_order_number_prefers_order_prefix() {
    assert_eq!(
        extract_order_number("查一下order1234567890，电话13800138000"),
        Some("order1234567890".to_string())
    );
    assert_eq!(
        extract_order_number("单号 ORD-2024-001 到哪了"),
        Some("ORD-2024-001".to_string())
    );
    assert_eq!(
        extract_order_number("运单 12345678901234"),
        Some("12345678901234".to_string())
    );
    assert_eq!(extract_order_number("改一下状态"), None);
}

#[tokio::test]
async fn image_only_mode_skips_model_for_text() {
    let model = Arc::new(ScriptedModel::default());
    let stage = PerceptionStage::new(model.clone(), PerceptionMode::ImageOnly);
    let result = stage.perceive(&UserInput::from_text("查一下 order1234567890")).await;
    assert!(result.is_empty());
    assert!(result.confidence.abs() < f64::EPSILON);
    assert_eq!(model.call_count(StageKind::Perception), 0);
}

#[tokio::test]
async fn model_failure_yields_empty_result() {
    let model = Arc::new(ScriptedModel::default().fail(StageKind::Perception, "upstream down"));
    let stage = PerceptionStage::new(model.clone(), PerceptionMode::Always);
    let input = UserInput::new(vec![ContentItem::ImageUrl {
        image_url: "https://example.com/waybill.png".to_string(),
    }]);
    let result = stage.perceive(&input).await;
    assert!(result.is_empty());
    assert_eq!(model.call_count(StageKind::Perception), 1);
}

#[tokio::test]
async fn missing_order_number_is_filled_from_text() {
    let model = Arc::new(
        ScriptedModel::default()
            .reply(StageKind::Perception, r#"{"order_number": null, "confidence": 0.4}"#),
    );
    let stage = PerceptionStage::new(model, PerceptionMode::Always);
    let result = stage.perceive(&UserInput::from_text("查一下 order1234567890")).await;
    assert_eq!(result.order_number.as_deref(), Some("order1234567890"));
    assert!((result.confidence - 0.4).abs() < f64::EPSILON);
}

#[tokio::test]
async fn phone_number_is_not_taken_as_order_number() {
    let model = Arc::new(ScriptedModel::default().reply(
        StageKind::Perception,
        r#"{"order_number": null, "phone": "138-1234-5678"}"#,
    ));
    let stage = PerceptionStage::new(model, PerceptionMode::Always);
    let result = stage
        .perceive(&UserInput::from_text("把状态改成已送达，电话13812345678"))
        .await;
    assert_eq!(result.phone.as_deref(), Some("138-1234-5678"));
    assert_eq!(result.order_number, None);
}

#[tokio::test]
async fn order_number_after_a_phone_number_is_still_found() {
    let model = Arc::new(ScriptedModel::default().reply(
        StageKind::Perception,
        r#"{"order_number": null, "phone": "13812345678"}"#,
    ));
    let stage = PerceptionStage::new(model, PerceptionMode::Always);
    let result = stage
        .perceive(&UserInput::from_text("电话13812345678 运单12345678901234"))
        .await;
    assert_eq!(result.order_number.as_deref(), Some("12345678901234"));
}

#[tokio::test]
async fn model_request_carries_image_parts() {
    let model = Arc::new(
        ScriptedModel::default().reply(StageKind::Perception, r#"{"confidence": 0.9}"#),
    );
    let stage = PerceptionStage::new(model.clone(), PerceptionMode::ImageOnly);
    let input = UserInput::new(vec![
        ContentItem::text("看看这张面单"),
        ContentItem::Image {
            image: "iVBORw0KGgo=".to_string(),
        },
    ]);
    let _ = stage.perceive(&input).await;
    let requests = model.requests(StageKind::Perception);
    assert_eq!(requests.len(), 1);
    assert!(requests[0].json_output);
    let body = serde_json::to_string(&requests[0].messages).expect("serialize messages");
    assert!(body.contains("data:image/png;base64,iVBORw0KGgo="));
}
