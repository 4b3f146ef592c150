//! Support chat messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Message identity
///
/// Server ids are assigned once the backend stores the message. A local id
/// is generated for the optimistic entry and retired on confirmation.
/// On the wire a server id is a number and a local id a UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Server(u64),
    Local(Uuid),
}

impl MessageId {
    /// Fresh temporary id for an optimistic message
    pub fn new_local() -> Self {
        MessageId::Local(Uuid::new_v4())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, MessageId::Local(_))
    }

    pub fn server_id(&self) -> Option<u64> {
        match self {
            MessageId::Server(id) => Some(*id),
            MessageId::Local(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Server(id) => write!(f, "{}", id),
            MessageId::Local(id) => write!(f, "local-{}", id),
        }
    }
}

/// Client-side delivery state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Optimistic, not yet acknowledged
    Sending,
    /// Server-acknowledged (all server-origin messages)
    #[default]
    Sent,
    /// Send failed
    Error,
}

/// File attached to a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Support conversation message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupportMessage {
    pub id: MessageId,
    /// Conversation / ticket
    #[serde(default, alias = "conversation")]
    pub ticket: Option<u64>,
    #[serde(default)]
    pub sender: Option<u64>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default, alias = "is_staff")]
    pub from_staff: bool,
    /// Text, or the caption when an attachment is present
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: DeliveryStatus,
}

impl SupportMessage {
    /// Optimistic text message
    pub fn local_text(content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::new_local(),
            ticket: None,
            sender: None,
            sender_name: None,
            from_staff: false,
            content: content.into(),
            attachment: None,
            created_at: now,
            status: DeliveryStatus::Sending,
        }
    }

    /// Optimistic attachment message. The url is the local file path until
    /// the server answers with the stored one.
    pub fn local_attachment(
        local_path: impl Into<String>,
        caption: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let url = local_path.into();
        let name = std::path::Path::new(&url)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Self {
            attachment: Some(Attachment {
                url,
                name,
                content_type: None,
                size: None,
            }),
            ..Self::local_text(caption, now)
        }
    }

    pub fn is_attachment(&self) -> bool {
        self.attachment.is_some()
    }
}

/// Send message payload (text only; attachments go multipart)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}
