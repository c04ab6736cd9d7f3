use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when a stored or submitted enum value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a wire enum stored as its SCREAMING_SNAKE_CASE name, both in
/// SQLite and in JSON.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum!(
    /// Channel a conversation arrived through.
    ChannelType, "channel type" {
        Chat => "CHAT",
        Email => "EMAIL",
    }
);

wire_enum!(
    /// Conversation status. Any value may follow any other; only `Closed`
    /// has a side effect (stamping `closed_at`).
    ConversationStatus, "conversation status" {
        Open => "OPEN",
        InProgress => "IN_PROGRESS",
        Closed => "CLOSED",
        Archived => "ARCHIVED",
    }
);

wire_enum!(
    Priority, "priority" {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Urgent => "URGENT",
    }
);

wire_enum!(
    MessageType, "message type" {
        Text => "TEXT",
        File => "FILE",
        Image => "IMAGE",
        Audio => "AUDIO",
        Video => "VIDEO",
    }
);

wire_enum!(
    /// Who authored a message.
    SenderRole, "sender role" {
        User => "USER",
        Agent => "AGENT",
        Ai => "AI",
        System => "SYSTEM",
    }
);

wire_enum!(
    KnowledgeType, "knowledge type" {
        Faq => "FAQ",
        Document => "DOCUMENT",
        Text => "TEXT",
        Url => "URL",
    }
);

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Default for MessageType {
    fn default() -> Self {
        Self::Text
    }
}

impl SenderRole {
    /// Status a conversation takes after a message from this sender lands.
    pub fn resulting_status(&self) -> ConversationStatus {
        match self {
            Self::User => ConversationStatus::Open,
            _ => ConversationStatus::InProgress,
        }
    }
}

/// A tenant ("client") owning conversations and knowledge items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub domain: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Minimal user projection handed to authenticated handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    #[serde(rename = "clientId")]
    pub tenant_id: String,
    #[serde(rename = "type")]
    pub channel: ChannelType,
    pub status: ConversationStatus,
    pub subject: Option<String>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// A conversation row as shown in listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub last_message: Option<Message>,
    pub message_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub sender: SenderRole,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    #[serde(rename = "isFromAI")]
    pub is_from_ai: bool,
    pub attachments: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Input for appending a message to a conversation.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub content: String,
    pub kind: MessageType,
    pub sender: SenderRole,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub is_from_ai: bool,
    pub attachments: Option<serde_json::Value>,
}

impl NewMessage {
    pub fn text(sender: SenderRole, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageType::Text,
            sender,
            sender_name: None,
            sender_email: None,
            is_from_ai: sender == SenderRole::Ai,
            attachments: None,
        }
    }

    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    pub fn with_sender_email(mut self, email: Option<String>) -> Self {
        self.sender_email = email;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeItem {
    pub id: Uuid,
    #[serde(rename = "clientId")]
    pub tenant_id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: KnowledgeType,
    pub source: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a knowledge item. Empty strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<KnowledgeType>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

/// One page of results plus the numbers a client needs to page further.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStats {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub closed: u64,
    pub today_count: u64,
}
