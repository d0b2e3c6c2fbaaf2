use ordertalk_agent::{RuntimeSettings, run_stdio};

use crate::pipeline_builder::build_pipeline;

pub(crate) async fn run_stdio_mode(
    user_id: String,
    session_id: String,
    runtime_settings: &RuntimeSettings,
) -> anyhow::Result<()> {
    let pipeline = build_pipeline(runtime_settings)?;
    run_stdio(pipeline, user_id, session_id).await
}
