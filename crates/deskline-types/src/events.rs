use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum GatewayEvent {
    /// A message landed in a conversation
    NewMessage {
        conversation_id: Uuid,
        message: Message,
    },

    /// Acknowledgement delivered only to the connection that sent a chat message
    MessageSent {
        success: bool,
        conversation_id: Uuid,
        message: Message,
    },

    /// Someone started or stopped typing in a conversation
    UserTyping {
        user_id: Option<Uuid>,
        conversation_id: Uuid,
        is_typing: bool,
    },

    /// The assistant replied in a conversation
    AiResponse {
        conversation_id: Uuid,
        message: Message,
    },

    /// Conversation metadata changed (status, assignment, ...)
    ConversationUpdated {
        conversation_id: Uuid,
        update: serde_json::Value,
    },

    /// A command from this connection failed
    Error { message: String },
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum GatewayCommand {
    /// Post a message; without a conversation id a new chat conversation is opened
    ChatMessage {
        conversation_id: Option<Uuid>,
        message: String,
        sender_name: Option<String>,
        sender_email: Option<String>,
    },

    JoinConversation { conversation_id: Uuid },

    LeaveConversation { conversation_id: Uuid },

    TypingStart { conversation_id: Uuid },

    TypingStop { conversation_id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_snake_case_tags_and_camel_case_fields() {
        let raw = r#"{"type":"chat_message","data":{"message":"Oi","senderName":"Ana"}}"#;
        let cmd: GatewayCommand = serde_json::from_str(raw).unwrap();
        assert_eq!(
            cmd,
            GatewayCommand::ChatMessage {
                conversation_id: None,
                message: "Oi".into(),
                sender_name: Some("Ana".into()),
                sender_email: None,
            }
        );

        let id = Uuid::new_v4();
        let raw = format!(r#"{{"type":"typing_stop","data":{{"conversationId":"{id}"}}}}"#);
        let cmd: GatewayCommand = serde_json::from_str(&raw).unwrap();
        assert_eq!(cmd, GatewayCommand::TypingStop { conversation_id: id });
    }

    #[test]
    fn typing_event_serializes_for_clients() {
        let id = Uuid::new_v4();
        let event = GatewayEvent::UserTyping {
            user_id: None,
            conversation_id: id,
            is_typing: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "user_typing");
        assert_eq!(json["data"]["conversationId"], id.to_string());
        assert_eq!(json["data"]["isTyping"], true);
        assert!(json["data"]["userId"].is_null());
    }
}
