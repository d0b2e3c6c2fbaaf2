#![allow(missing_docs)]

use std::fs;

use anyhow::Result;
use ordertalk_agent::{
    DASHSCOPE_COMPATIBLE_URL, MAX_REASONING_HISTORY_TURNS, PerceptionMode, PipelineConfig,
    RuntimeSettings, load_runtime_settings_from_paths,
};
use tempfile::TempDir;

#[test]
fn user_settings_override_system_field_by_field() -> Result<()> {
    let tmp = TempDir::new()?;
    let system = tmp.path().join("system.yaml");
    let user = tmp.path().join("user.yaml");
    fs::write(
        &system,
        r"
llm:
  model: qwen-plus
  timeout_secs: 60
business_api:
  base_url: http://orders.internal:8080
  timeout_secs: 10
pipeline:
  perception_mode: always
  reasoning_history_turns: 3
gateway:
  bind: 0.0.0.0:8000
  turn_timeout_secs: 120
",
    )?;
    fs::write(
        &user,
        r"
llm:
  timeout_secs: 20
business_api:
  timeout_secs: 30
pipeline:
  perception_mode: image_only
gateway:
  max_concurrent_turns: 8
",
    )?;

    let settings = load_runtime_settings_from_paths(&system, &user);

    assert_eq!(settings.llm.model.as_deref(), Some("qwen-plus"));
    assert_eq!(settings.llm.timeout_secs, Some(20));
    assert_eq!(
        settings.business_api.base_url.as_deref(),
        Some("http://orders.internal:8080")
    );
    assert_eq!(settings.business_api.timeout_secs, Some(30));
    assert_eq!(settings.pipeline.perception_mode.as_deref(), Some("image_only"));
    assert_eq!(settings.pipeline.reasoning_history_turns, Some(3));
    assert_eq!(settings.gateway.bind.as_deref(), Some("0.0.0.0:8000"));
    assert_eq!(settings.gateway.turn_timeout_secs, Some(120));
    assert_eq!(settings.gateway.max_concurrent_turns, Some(8));
    Ok(())
}

#[test]
fn missing_or_malformed_files_fall_back_to_defaults() -> Result<()> {
    let tmp = TempDir::new()?;
    let broken = tmp.path().join("broken.yaml");
    fs::write(&broken, "pipeline: [not, a, mapping")?;

    let settings = load_runtime_settings_from_paths(&broken, &tmp.path().join("absent.yaml"));

    assert!(settings.llm.model.is_none());
    assert!(settings.pipeline.perception_mode.is_none());
    assert!(settings.gateway.bind.is_none());
    Ok(())
}

#[test]
fn pipeline_config_reads_settings() {
    let mut settings = RuntimeSettings::default();
    settings.business_api.timeout_secs = Some(7);
    settings.llm.timeout_secs = Some(45);
    settings.pipeline.perception_mode = Some("image-only".to_string());
    settings.pipeline.trace_max_chars = Some(500);

    let config = PipelineConfig::from_settings(&settings);

    assert_eq!(config.business_api_timeout_secs, 7);
    assert_eq!(config.llm_timeout_secs, 45);
    assert_eq!(config.perception_mode, PerceptionMode::ImageOnly);
    assert_eq!(config.trace_max_chars, 500);
}

#[test]
fn invalid_perception_mode_and_zero_values_use_defaults() {
    let mut settings = RuntimeSettings::default();
    settings.business_api.timeout_secs = Some(0);
    settings.llm.timeout_secs = Some(0);
    settings.pipeline.perception_mode = Some("sometimes".to_string());

    let config = PipelineConfig::from_settings(&settings);
    let defaults = PipelineConfig::default();

    assert_eq!(config.perception_mode, PerceptionMode::Always);
    assert_eq!(
        config.business_api_timeout_secs,
        defaults.business_api_timeout_secs
    );
    assert_eq!(config.llm_timeout_secs, defaults.llm_timeout_secs);
}

#[test]
fn history_window_is_clamped() {
    let mut config = PipelineConfig {
        reasoning_history_turns: 0,
        ..PipelineConfig::default()
    };
    assert_eq!(config.history_turns(), 1);
    config.reasoning_history_turns = 10;
    assert_eq!(config.history_turns(), MAX_REASONING_HISTORY_TURNS);
    config.reasoning_history_turns = 2;
    assert_eq!(config.history_turns(), 2);
}

#[test]
fn explicit_key_wins_and_local_endpoints_get_none() {
    let config = PipelineConfig {
        api_key: Some("sk-explicit".to_string()),
        ..PipelineConfig::default()
    };
    assert_eq!(config.resolve_api_key().as_deref(), Some("sk-explicit"));

    let local = PipelineConfig {
        inference_url: "http://127.0.0.1:11434/v1/chat/completions".to_string(),
        ..PipelineConfig::default()
    };
    assert_eq!(local.resolve_api_key(), None);
    assert_eq!(PipelineConfig::default().inference_url, DASHSCOPE_COMPATIBLE_URL);
}
