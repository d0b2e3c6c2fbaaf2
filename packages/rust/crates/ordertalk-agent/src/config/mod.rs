//! Config namespace: pipeline config and YAML runtime settings.

mod pipeline;
mod settings;

pub use pipeline::{
    DASHSCOPE_COMPATIBLE_URL, DEFAULT_BUSINESS_API_BASE_URL, DEFAULT_MODEL,
    MAX_REASONING_HISTORY_TURNS, PerceptionMode, PipelineConfig,
};
pub use settings::{
    BusinessApiSettings, GatewaySettings, LlmSettings, PipelineSettings, RuntimeSettings,
    SessionSettings, load_runtime_settings, load_runtime_settings_from_paths,
    runtime_settings_paths, set_config_home_override,
};
