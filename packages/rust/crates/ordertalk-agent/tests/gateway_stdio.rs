#![allow(missing_docs)]

use std::sync::Arc;

use anyhow::Result;
use ordertalk_agent::test_support::{RecordingLogisticsApi, ScriptedModel};
use ordertalk_agent::{Pipeline, PipelineConfig, SessionStore, StageKind, run_lines};

#[tokio::test]
async fn each_non_blank_line_is_one_turn() -> Result<()> {
    let model = ScriptedModel::default()
        .reply(StageKind::Reasoning, r#"{"intent": "unknown"}"#)
        .reply(
            StageKind::Reasoning,
            r#"{"intent": "clarify", "clarification_questions": ["请提供订单号"]}"#,
        )
        .reply(StageKind::Response, "您好，请问需要查询哪个订单？")
        .reply(StageKind::Response, "好的，请提供订单号。");
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Arc::new(model),
        Arc::new(RecordingLogisticsApi::default()),
        Arc::new(SessionStore::new()),
    );
    let input: &[u8] = "你好\n\n   \n我想查快递\n".as_bytes();
    let mut out = Vec::new();

    run_lines(&pipeline, "u1", "stdio-session", input, &mut out).await?;

    let printed = String::from_utf8(out)?;
    let lines: Vec<_> = printed.lines().collect();
    assert_eq!(
        lines,
        vec!["您好，请问需要查询哪个订单？", "好的，请提供订单号。"]
    );
    let history = pipeline.history("u1", "stdio-session").await?;
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].text(), "我想查快递");
    Ok(())
}

#[tokio::test]
async fn empty_input_runs_no_turns() -> Result<()> {
    let model = Arc::new(ScriptedModel::default());
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        model.clone(),
        Arc::new(RecordingLogisticsApi::default()),
        Arc::new(SessionStore::new()),
    );
    let mut out = Vec::new();

    run_lines(&pipeline, "u1", "s", &b""[..], &mut out).await?;

    assert!(out.is_empty());
    assert_eq!(model.call_count(StageKind::Reasoning), 0);
    Ok(())
}
