//! Notification message payload.
//!
//! Matches the messaging transport's `sendMessage` body. Entity offsets
//! and lengths are measured in UTF-16 code units, which is how the
//! transport indexes message text. They are never byte or scalar counts.

use serde::{Deserialize, Serialize};

/// Entity type for an inline link over a text span.
pub const ENTITY_TEXT_LINK: &str = "text_link";

/// Entity type for a collapsible quoted block.
pub const ENTITY_EXPANDABLE_BLOCKQUOTE: &str = "expandable_blockquote";

/// A positional markup instruction applied over the message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    /// Entity kind
    #[serde(rename = "type")]
    pub kind: String,

    /// Start offset in UTF-16 code units
    pub offset: usize,

    /// Span length in UTF-16 code units
    pub length: usize,

    /// Target URL, for link entities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl MessageEntity {
    /// A link entity spanning `length` UTF-16 units at `offset`.
    pub fn text_link(offset: usize, length: usize, url: impl Into<String>) -> Self {
        Self {
            kind: ENTITY_TEXT_LINK.to_string(),
            offset,
            length,
            url: Some(url.into()),
        }
    }

    /// A collapsible block entity spanning `length` UTF-16 units at `offset`.
    pub fn expandable_blockquote(offset: usize, length: usize) -> Self {
        Self {
            kind: ENTITY_EXPANDABLE_BLOCKQUOTE.to_string(),
            offset,
            length,
            url: None,
        }
    }
}

/// A complete message ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessagePayload {
    /// Chat target (channel handle or numeric id)
    pub chat_id: String,

    /// Plain-text message body
    pub text: String,

    /// Positional annotations over `text`
    pub entities: Vec<MessageEntity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_entity_serializes_url() {
        let entity = MessageEntity::text_link(3, 7, "https://example.org");
        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains(r#""type":"text_link""#));
        assert!(json.contains(r#""url":"https://example.org""#));
    }

    #[test]
    fn blockquote_entity_omits_url() {
        let entity = MessageEntity::expandable_blockquote(10, 20);
        let json = serde_json::to_string(&entity).unwrap();
        assert!(!json.contains("url"));
    }
}
