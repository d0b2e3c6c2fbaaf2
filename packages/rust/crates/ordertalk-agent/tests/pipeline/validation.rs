use super::{clarification_question, is_date_format, validate, violations};
use crate::contracts::{ActionFields, ActionKind, TransportStatus, ValidatedCommand};
use crate::error::{ErrorKind, ValidationError};

fn insert_fields() -> ActionFields {
    ActionFields {
        order_id: Some("1001".to_string()),
        status_description: Some("已到达转运中心".to_string()),
        node_location: Some("北京转运中心".to_string()),
        occurred_at_str: Some("2024-01-13".to_string()),
        ..ActionFields::default()
    }
}

#[test]
fn date_format_requires_ascii_digits() {
    assert!(is_date_format("2024-01-13"));
    assert!(!is_date_format("2024/01/13"));
    assert!(!is_date_format("2024-1-13"));
    assert!(!is_date_format("２０２４-01-13"));
    assert!(!is_date_format("2024-01-13 10:00"));
}

#[test]
fn query_requires_order_number() {
    let error = validate(ActionKind::Query, "s1", &ActionFields::default())
        .expect_err("query without order number must fail");
    assert_eq!(
        error,
        ValidationError::ParameterMissing {
            field: "order_number"
        }
    );
    assert_eq!(error.kind(), ErrorKind::ParameterMissing);
}

#[test]
fn modify_status_accepts_either_identifier() {
    let fields = ActionFields {
        order_id: Some("1001".to_string()),
        transport_status_name: Some(" 已送达 ".to_string()),
        ..ActionFields::default()
    };
    let command = validate(ActionKind::Modify, "s1", &fields).expect("valid status update");
    let ValidatedCommand::ModifyStatus(update) = command else {
        panic!("expected status update");
    };
    assert_eq!(update.order_id.as_deref(), Some("1001"));
    assert_eq!(update.order_number, None);
    assert_eq!(update.transport_status_name, TransportStatus::Delivered);
    assert_eq!(update.session_id, "s1");
}

#[test]
fn modify_status_rejects_label_outside_enum() {
    let fields = ActionFields {
        order_number: Some("order1234567890".to_string()),
        transport_status_name: Some("已签收".to_string()),
        ..ActionFields::default()
    };
    let error = validate(ActionKind::Modify, "s1", &fields).expect_err("invalid status");
    assert_eq!(error.kind(), ErrorKind::InvalidEnumValue);
    assert!(clarification_question(&error).contains("已签收"));
}

#[test]
fn modify_node_without_changes_is_rejected_before_location() {
    let fields = ActionFields {
        order_id: Some("1001".to_string()),
        tracking_id: Some("77".to_string()),
        ..ActionFields::default()
    };
    let error = validate(ActionKind::ModifyNode, "s1", &fields).expect_err("nothing to change");
    assert_eq!(error, ValidationError::NoMutableField);
    assert_eq!(error.field(), None);
}

#[test]
fn modify_node_keeps_absent_optionals_absent() {
    let fields = ActionFields {
        order_id: Some("1001".to_string()),
        tracking_id: Some("77".to_string()),
        node_location: Some("上海".to_string()),
        operator: Some("  ".to_string()),
        ..ActionFields::default()
    };
    let ValidatedCommand::ModifyNode(update) =
        validate(ActionKind::ModifyNode, "s1", &fields).expect("valid node update")
    else {
        panic!("expected node update");
    };
    assert_eq!(update.location, "上海");
    assert_eq!(update.operator, None);
    assert_eq!(update.status_description, None);
    assert_eq!(update.occurred_at_str, None);
}

#[test]
fn insert_rejects_bad_date() {
    let fields = ActionFields {
        occurred_at_str: Some("1月13日".to_string()),
        ..insert_fields()
    };
    let error = validate(ActionKind::Insert, "s1", &fields).expect_err("bad date");
    assert_eq!(error.kind(), ErrorKind::InvalidDateFormat);
    assert!(error.to_string().contains("date format"));
}

#[test]
fn insert_missing_location_names_the_field() {
    let fields = ActionFields {
        node_location: None,
        ..insert_fields()
    };
    let error = validate(ActionKind::Insert, "s1", &fields).expect_err("missing location");
    assert_eq!(error.field(), Some("node_location"));
}

#[test]
fn empty_session_id_is_rejected() {
    let error = validate(ActionKind::Insert, "  ", &insert_fields()).expect_err("no session");
    assert_eq!(error.field(), Some("session_id"));
}

#[test]
fn violations_lists_every_missing_insert_field() {
    let found = violations(ActionKind::Insert, &ActionFields::default());
    let fields: Vec<_> = found.iter().filter_map(ValidationError::field).collect();
    assert_eq!(
        fields,
        vec![
            "order_id",
            "status_description",
            "node_location",
            "occurred_at_str"
        ]
    );
}

#[test]
fn violations_is_empty_for_valid_insert() {
    assert!(violations(ActionKind::Insert, &insert_fields()).is_empty());
}

#[test]
fn violations_for_modify_status_without_anything() {
    let found = violations(ActionKind::Modify, &ActionFields::default());
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].field(), Some("order_number"));
    assert_eq!(found[1].field(), Some("transport_status_name"));
}
