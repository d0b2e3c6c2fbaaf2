use ordertalk_agent::{RuntimeSettings, run_http};

use crate::pipeline_builder::build_pipeline;

const DEFAULT_GATEWAY_BIND: &str = "0.0.0.0:8000";

pub(crate) async fn run_gateway_mode(
    bind_addr: Option<String>,
    turn_timeout: Option<u64>,
    max_concurrent: Option<usize>,
    runtime_settings: &RuntimeSettings,
) -> anyhow::Result<()> {
    let pipeline = build_pipeline(runtime_settings)?;
    let gateway = &runtime_settings.gateway;
    let bind_addr = bind_addr
        .or_else(|| gateway.bind.clone())
        .unwrap_or_else(|| DEFAULT_GATEWAY_BIND.to_string());
    let turn_timeout = turn_timeout.or(gateway.turn_timeout_secs);
    let max_concurrent = max_concurrent
        .or(gateway.max_concurrent_turns)
        .filter(|n| *n > 0);
    run_http(pipeline, &bind_addr, turn_timeout, max_concurrent).await
}
