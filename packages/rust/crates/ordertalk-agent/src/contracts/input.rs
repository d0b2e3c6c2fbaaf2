//! Inbound multimodal user input.

use serde::{Deserialize, Serialize};

/// Placeholder used wherever an inline base64 image is rendered as text.
pub const INLINE_IMAGE_PLACEHOLDER: &str = "[图片: base64编码]";

/// One item of the inbound request, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    ImageUrl { image_url: String },
    /// Base64 payload, with or without a `data:` URL prefix.
    Image { image: String },
}

impl ContentItem {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self, Self::ImageUrl { .. } | Self::Image { .. })
    }

    fn render_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::ImageUrl { image_url } => format!("[图片: {image_url}]"),
            Self::Image { .. } => INLINE_IMAGE_PLACEHOLDER.to_string(),
        }
    }
}

/// Multimodal content part in OpenAI-compatible chat format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelContentPart {
    Text { text: String },
    ImageUrl { image_url: ModelImageUrl },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelImageUrl {
    pub url: String,
}

/// Ordered list of content items from one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserInput {
    pub items: Vec<ContentItem>,
}

impl UserInput {
    #[must_use]
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![ContentItem::text(text)])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|item| match item {
            ContentItem::Text { text } => text.trim().is_empty(),
            ContentItem::ImageUrl { image_url } => image_url.trim().is_empty(),
            ContentItem::Image { image } => image.trim().is_empty(),
        })
    }

    #[must_use]
    pub fn has_image(&self) -> bool {
        self.items.iter().any(ContentItem::is_image)
    }

    /// Text rendering with image placeholders, joined by single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(ContentItem::render_text)
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Content parts for a vision-capable chat model.
    #[must_use]
    pub fn to_model_parts(&self) -> Vec<ModelContentPart> {
        self.items
            .iter()
            .map(|item| match item {
                ContentItem::Text { text } => ModelContentPart::Text { text: text.clone() },
                ContentItem::ImageUrl { image_url } => ModelContentPart::ImageUrl {
                    image_url: ModelImageUrl {
                        url: image_url.clone(),
                    },
                },
                ContentItem::Image { image } => ModelContentPart::ImageUrl {
                    image_url: ModelImageUrl {
                        url: inline_image_data_url(image),
                    },
                },
            })
            .collect()
    }

    /// Copy safe to persist: inline base64 payloads become a text placeholder.
    #[must_use]
    pub fn without_inline_images(&self) -> Vec<ContentItem> {
        self.items
            .iter()
            .map(|item| match item {
                ContentItem::Image { .. } => ContentItem::text(INLINE_IMAGE_PLACEHOLDER),
                other => other.clone(),
            })
            .collect()
    }
}

fn inline_image_data_url(payload: &str) -> String {
    let payload = payload.trim();
    if payload.starts_with("data:") {
        return payload.to_string();
    }
    let mime = if payload.starts_with("iVBOR") {
        "image/png"
    } else if payload.starts_with("R0lGOD") {
        "image/gif"
    } else if payload.starts_with("UklGR") {
        "image/webp"
    } else {
        "image/jpeg"
    };
    format!("data:{mime};base64,{payload}")
}
