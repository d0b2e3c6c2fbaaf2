//! Pipeline configuration: inference endpoint, model, business API, stage tuning.

use serde::{Deserialize, Serialize};

use super::settings::RuntimeSettings;

/// DashScope OpenAI-compatible chat completions endpoint.
pub const DASHSCOPE_COMPATIBLE_URL: &str =
    "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "qwen-plus";
pub const DEFAULT_BUSINESS_API_BASE_URL: &str = "http://127.0.0.1:8080";
/// Upper bound of the reasoning history window, in turns.
pub const MAX_REASONING_HISTORY_TURNS: usize = 3;

/// When the Perception stage calls the model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PerceptionMode {
    /// Every turn.
    #[default]
    Always,
    /// Only turns that carry an image; text-only turns get the empty result.
    ImageOnly,
}

impl PerceptionMode {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "always" => Some(Self::Always),
            "image_only" | "image-only" => Some(Self::ImageOnly),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::ImageOnly => "image_only",
        }
    }
}

/// Immutable configuration shared by every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub inference_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable consulted for the key when `api_key` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Per-request bound on every model call.
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    #[serde(default = "default_business_api_base_url")]
    pub business_api_base_url: String,
    #[serde(default = "default_business_api_timeout_secs")]
    pub business_api_timeout_secs: u64,
    #[serde(default)]
    pub perception_mode: PerceptionMode,
    /// Number of prior turns embedded in the reasoning prompt.
    #[serde(default = "default_reasoning_history_turns")]
    pub reasoning_history_turns: usize,
    /// Truncation limit of the execution trace persisted per turn.
    #[serde(default = "default_trace_max_chars")]
    pub trace_max_chars: usize,
}

fn default_business_api_base_url() -> String {
    DEFAULT_BUSINESS_API_BASE_URL.to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_business_api_timeout_secs() -> u64 {
    15
}

fn default_reasoning_history_turns() -> usize {
    MAX_REASONING_HISTORY_TURNS
}

fn default_trace_max_chars() -> usize {
    2_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inference_url: DASHSCOPE_COMPATIBLE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: None,
            llm_timeout_secs: default_llm_timeout_secs(),
            business_api_base_url: default_business_api_base_url(),
            business_api_timeout_secs: default_business_api_timeout_secs(),
            perception_mode: PerceptionMode::default(),
            reasoning_history_turns: default_reasoning_history_turns(),
            trace_max_chars: default_trace_max_chars(),
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PipelineConfig {
    /// Settings merged with environment overrides (`ORDERTALK_*`).
    #[must_use]
    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        let defaults = Self::default();
        let perception_mode = match settings.pipeline.perception_mode.as_deref() {
            None => defaults.perception_mode,
            Some(raw) => PerceptionMode::parse(raw).unwrap_or_else(|| {
                tracing::warn!(
                    value = %raw,
                    "invalid pipeline.perception_mode; using default"
                );
                defaults.perception_mode
            }),
        };
        Self {
            inference_url: env_non_empty("ORDERTALK_INFERENCE_URL")
                .or_else(|| non_empty(settings.llm.inference_url.as_ref()))
                .unwrap_or(defaults.inference_url),
            model: env_non_empty("ORDERTALK_MODEL")
                .or_else(|| non_empty(settings.llm.model.as_ref()))
                .unwrap_or(defaults.model),
            api_key: None,
            api_key_env: non_empty(settings.llm.api_key_env.as_ref()),
            llm_timeout_secs: settings
                .llm
                .timeout_secs
                .filter(|v| *v > 0)
                .unwrap_or(defaults.llm_timeout_secs),
            business_api_base_url: env_non_empty("ORDERTALK_API_BASE_URL")
                .or_else(|| non_empty(settings.business_api.base_url.as_ref()))
                .unwrap_or(defaults.business_api_base_url),
            business_api_timeout_secs: settings
                .business_api
                .timeout_secs
                .filter(|v| *v > 0)
                .unwrap_or(defaults.business_api_timeout_secs),
            perception_mode,
            reasoning_history_turns: settings
                .pipeline
                .reasoning_history_turns
                .unwrap_or(defaults.reasoning_history_turns),
            trace_max_chars: settings
                .pipeline
                .trace_max_chars
                .filter(|v| *v > 0)
                .unwrap_or(defaults.trace_max_chars),
        }
    }

    /// History window clamped to `1..=3` turns.
    #[must_use]
    pub fn history_turns(&self) -> usize {
        self.reasoning_history_turns
            .clamp(1, MAX_REASONING_HISTORY_TURNS)
    }

    /// Resolve API key: config value, configured env var, then DashScope/OpenAI env.
    /// Local endpoints (127.0.0.1 / localhost) get no key.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref k) = self.api_key {
            return Some(k.clone());
        }
        if self.inference_url.contains("127.0.0.1") || self.inference_url.contains("localhost") {
            return None;
        }
        if let Some(key) = self.api_key_env.as_deref().and_then(env_non_empty) {
            return Some(key);
        }
        if self.inference_url.contains("dashscope") {
            return env_non_empty("DASHSCOPE_API_KEY").or_else(|| env_non_empty("OPENAI_API_KEY"));
        }
        env_non_empty("OPENAI_API_KEY")
    }
}
