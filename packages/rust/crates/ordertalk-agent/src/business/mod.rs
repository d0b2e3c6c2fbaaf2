//! External order/tracking service: the only side-effecting collaborator of the pipeline.

mod client;

use async_trait::async_trait;
use serde_json::Value;

use crate::contracts::{NodeInsert, NodeUpdate, StatusUpdate};
use crate::error::BusinessApiError;

pub use client::HttpLogisticsApi;

/// The four order-service operations. Inputs are validated commands only.
#[async_trait]
pub trait LogisticsApi: Send + Sync {
    /// Order snapshot for a business order number.
    async fn get_order_info(&self, order_number: &str) -> Result<Value, BusinessApiError>;

    async fn update_order_info(&self, update: &StatusUpdate) -> Result<Value, BusinessApiError>;

    async fn update_track_info(&self, update: &NodeUpdate) -> Result<Value, BusinessApiError>;

    /// Creates a tracking node; the response carries the node identifier.
    async fn insert_track_info(&self, insert: &NodeInsert) -> Result<Value, BusinessApiError>;
}

/// Node identifier assigned by the order service, if the response carries one.
///
/// Looks at `nodeId`, `node_id` and `id`, top-level first, then under `data`.
#[must_use]
pub fn node_id_from_response(body: &Value) -> Option<String> {
    fn scan(object: &Value) -> Option<String> {
        ["nodeId", "node_id", "id"]
            .iter()
            .find_map(|key| match object.get(key)? {
                Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
    }
    scan(body).or_else(|| body.get("data").and_then(scan))
}
