use std::time::Duration;

use async_trait::async_trait;
use reqwest::Response;
use serde::Serialize;
use serde_json::Value;

use crate::contracts::{NodeInsert, NodeUpdate, StatusUpdate};
use crate::error::BusinessApiError;

use super::LogisticsApi;

const GET_ORDER_INFO_PATH: &str = "/orderInfoService/getOrderInfo";
const UPDATE_ORDER_INFO_PATH: &str = "/orderInfoService/updateOrderInfo";
const UPDATE_TRACK_INFO_PATH: &str = "/orderInfoService/updateLogisticsTrackInfo";
const INSERT_TRACK_INFO_PATH: &str = "/orderInfoService/insertLogisticsTrackInfo";

/// JSON-over-HTTP client of the order service. One attempt per call.
pub struct HttpLogisticsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLogisticsApi {
    /// # Errors
    /// Fails when the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BusinessApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, payload: &T) -> Result<Value, BusinessApiError> {
        let response = self.client.post(self.url(path)).json(payload).send().await?;
        read_json(response).await
    }
}

async fn read_json(response: Response) -> Result<Value, BusinessApiError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(BusinessApiError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    let body: Value = serde_json::from_str(&text)
        .map_err(|error| BusinessApiError::Decode(format!("{error}; body: {text}")))?;
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .or_else(|| body.get("msg"))
            .and_then(Value::as_str)
            .unwrap_or("request rejected")
            .to_string();
        return Err(BusinessApiError::Rejected(message));
    }
    Ok(body)
}

#[async_trait]
impl LogisticsApi for HttpLogisticsApi {
    async fn get_order_info(&self, order_number: &str) -> Result<Value, BusinessApiError> {
        let response = self
            .client
            .get(self.url(GET_ORDER_INFO_PATH))
            .query(&[("orderNo", order_number)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_order_info(&self, update: &StatusUpdate) -> Result<Value, BusinessApiError> {
        self.post(UPDATE_ORDER_INFO_PATH, update).await
    }

    async fn update_track_info(&self, update: &NodeUpdate) -> Result<Value, BusinessApiError> {
        self.post(UPDATE_TRACK_INFO_PATH, update).await
    }

    async fn insert_track_info(&self, insert: &NodeInsert) -> Result<Value, BusinessApiError> {
        self.post(INSERT_TRACK_INFO_PATH, insert).await
    }
}
