//! Example: one conversational turn against the configured model and order service.
//!
//! Inference: set DASHSCOPE_API_KEY (or ORDERTALK_INFERENCE_URL + OPENAI_API_KEY for
//! another OpenAI-compatible endpoint). Order service: ORDERTALK_API_BASE_URL.
//!
//! Run: `cargo run -p ordertalk-agent --example one_turn -- "查一下 order1234567890"`

use std::sync::Arc;

use ordertalk_agent::{ChatRequest, Pipeline, PipelineConfig, SessionStore, UserInput};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "查一下 order1234567890".to_string());

    let config = PipelineConfig::from_settings(&ordertalk_agent::load_runtime_settings());
    let pipeline = Pipeline::from_config(config, Arc::new(SessionStore::new()))?;
    let envelope = pipeline
        .handle(ChatRequest::new(
            "example-session",
            "default",
            UserInput::from_text(message),
        ))
        .await;
    println!("{}", envelope.message);
    println!("{}", serde_json::to_string_pretty(&envelope.data)?);
    Ok(())
}
