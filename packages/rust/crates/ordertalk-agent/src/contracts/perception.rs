use serde::{Deserialize, Serialize};

use super::lenient;

/// Entities extracted from one request's raw input.
///
/// Every field tolerates `null`; a failed or skipped extraction is the
/// all-empty value with `confidence == 0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerceptionResult {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub company: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_description: Option<String>,
    #[serde(default, deserialize_with = "lenient::confidence")]
    pub confidence: f64,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_status: Option<String>,
}

impl PerceptionResult {
    /// Zero-confidence result used when extraction is skipped or fails.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order_number.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.company.is_none()
            && self.image_description.is_none()
            && self.current_status.is_none()
    }
}
