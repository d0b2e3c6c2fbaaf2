//! Persisted session messages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contracts::{ContentItem, DEFAULT_USER_ID, UserInput};

/// Identity of one conversation: `(user_id, session_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    /// Blank `user_id` falls back to `default`.
    #[must_use]
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let user_id = if user_id.trim().is_empty() {
            DEFAULT_USER_ID.to_string()
        } else {
            user_id.trim().to_string()
        };
        Self {
            user_id,
            session_id: session_id.into().trim().to_string(),
        }
    }

    /// Backend key, `<len(user_id)>:<user_id>:<session_id>`.
    ///
    /// The length prefix keeps the key injective when either part contains `:`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.user_id.len(),
            self.user_id,
            self.session_id
        )
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.session_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    /// Internal pipeline trace, e.g. the execution result of a turn.
    Stage,
}

impl MessageRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Stage => "stage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentItem>),
}

/// One immutable entry of a session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// User message; inline base64 images are replaced by a placeholder.
    #[must_use]
    pub fn user(input: &UserInput) -> Self {
        Self {
            role: MessageRole::User,
            name: None,
            content: MessageContent::Blocks(input.without_inline_images()),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            name: None,
            content: MessageContent::Text(text.into()),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn stage(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Stage,
            name: Some(name.into()),
            content: MessageContent::Text(text.into()),
            timestamp: Utc::now(),
        }
    }

    /// Plain-text rendering used in prompts.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(items) => UserInput::new(items.clone()).text(),
        }
    }
}
