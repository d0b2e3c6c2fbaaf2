use std::sync::Arc;

use anyhow::{Context, Result};
use ordertalk_agent::{Pipeline, PipelineConfig, RuntimeSettings, SessionStore};

pub(crate) fn build_pipeline(runtime_settings: &RuntimeSettings) -> Result<Pipeline> {
    let config = PipelineConfig::from_settings(runtime_settings);
    let store = SessionStore::from_settings(&runtime_settings.session)
        .context("failed to build session store")?;
    tracing::info!(
        inference_url = %config.inference_url,
        model = %config.model,
        llm_timeout_secs = config.llm_timeout_secs,
        business_api = %config.business_api_base_url,
        perception_mode = config.perception_mode.as_str(),
        history_turns = config.history_turns(),
        session_backend = store.backend_name(),
        api_key_present = config.resolve_api_key().is_some(),
        "pipeline configured"
    );
    Pipeline::from_config(config, Arc::new(store))
}
