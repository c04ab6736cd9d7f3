use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use deskline_ai::Assistant;
use deskline_ai::assistant::AI_SENDER_NAME;
use deskline_db::Database;
use deskline_types::events::{GatewayCommand, GatewayEvent};
use deskline_types::models::{ChannelType, Conversation, Message, NewMessage, SenderRole};

use crate::dispatcher::{ConnId, Dispatcher, Room, SessionInfo};
use crate::error::GatewayError;

/// Subject of conversations opened from the chat widget.
pub const WIDGET_SUBJECT: &str = "Chat via Widget";

/// Sender name used when the widget does not supply one.
pub const DEFAULT_VISITOR_NAME: &str = "Visitante";

/// Conversation memory handed to the assistant on auto-reply.
const AUTO_REPLY_HISTORY: u32 = 10;

/// Command handling and outbound delivery on top of the dispatcher.
#[derive(Clone)]
pub struct Gateway {
    dispatcher: Dispatcher,
    db: Arc<Database>,
    assistant: Option<Arc<Assistant>>,
    auto_reply: bool,
}

impl Gateway {
    pub fn new(dispatcher: Dispatcher, db: Arc<Database>) -> Self {
        Self {
            dispatcher,
            db,
            assistant: None,
            auto_reply: false,
        }
    }

    /// Attach the assistant. With `auto_reply` every widget message gets an
    /// AI answer (or the fallback apology) in the background.
    pub fn with_assistant(mut self, assistant: Arc<Assistant>, auto_reply: bool) -> Self {
        self.assistant = Some(assistant);
        self.auto_reply = auto_reply;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one inbound command. Failures are reported to the sender only.
    pub async fn handle_command(&self, conn_id: ConnId, cmd: GatewayCommand) {
        let Some(session) = self.dispatcher.session(conn_id).await else {
            warn!("Command from unknown connection {}", conn_id);
            return;
        };

        match cmd {
            GatewayCommand::ChatMessage {
                conversation_id,
                message,
                sender_name,
                sender_email,
            } => {
                let result = self
                    .handle_chat_message(
                        conn_id,
                        &session,
                        conversation_id,
                        message,
                        sender_name,
                        sender_email,
                    )
                    .await;

                if let Err(e) = result {
                    error!("Error handling chat message: {}", e);
                    self.dispatcher
                        .send_to(
                            conn_id,
                            GatewayEvent::Error {
                                message: "Failed to send message".into(),
                            },
                        )
                        .await;
                }
            }

            GatewayCommand::JoinConversation { conversation_id } => {
                self.dispatcher
                    .join_conversation(conn_id, conversation_id)
                    .await;
            }

            GatewayCommand::LeaveConversation { conversation_id } => {
                self.dispatcher
                    .leave_conversation(conn_id, conversation_id)
                    .await;
            }

            GatewayCommand::TypingStart { conversation_id } => {
                self.relay_typing(conn_id, &session, conversation_id, true)
                    .await;
            }

            GatewayCommand::TypingStop { conversation_id } => {
                self.relay_typing(conn_id, &session, conversation_id, false)
                    .await;
            }
        }
    }

    async fn handle_chat_message(
        &self,
        conn_id: ConnId,
        session: &SessionInfo,
        conversation_id: Option<Uuid>,
        content: String,
        sender_name: Option<String>,
        sender_email: Option<String>,
    ) -> Result<(), GatewayError> {
        let tenant_id = session.tenant_id.clone();
        let new_message = NewMessage::text(SenderRole::User, content.clone())
            .with_sender_name(
                sender_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_VISITOR_NAME.to_string()),
            )
            .with_sender_email(sender_email);

        let (conversation, message) = deskline_db::blocking(&self.db, move |db| {
            let conversation = match conversation_id {
                Some(id) => db.get_conversation(id, Some(&tenant_id))?,
                None => db.create_conversation(&tenant_id, ChannelType::Chat, Some(WIDGET_SUBJECT))?,
            };
            let message = db.append_message(conversation.id, &new_message)?;
            Ok((conversation, message))
        })
        .await?;

        let event = GatewayEvent::NewMessage {
            conversation_id: conversation.id,
            message: message.clone(),
        };
        self.dispatcher
            .broadcast(&Room::Conversation(conversation.id), &event, None)
            .await;
        self.dispatcher
            .broadcast(&Room::Tenant(session.tenant_id.clone()), &event, None)
            .await;

        let answered = message.id;
        self.dispatcher
            .send_to(
                conn_id,
                GatewayEvent::MessageSent {
                    success: true,
                    conversation_id: conversation.id,
                    message,
                },
            )
            .await;

        if self.auto_reply {
            self.spawn_auto_reply(conversation, answered, content);
        }
        Ok(())
    }

    async fn relay_typing(
        &self,
        conn_id: ConnId,
        session: &SessionInfo,
        conversation_id: Uuid,
        is_typing: bool,
    ) {
        let event = GatewayEvent::UserTyping {
            user_id: session.user_id,
            conversation_id,
            is_typing,
        };
        self.dispatcher
            .broadcast(&Room::Conversation(conversation_id), &event, Some(conn_id))
            .await;
    }

    fn spawn_auto_reply(&self, conversation: Conversation, answered: Uuid, content: String) {
        let Some(assistant) = self.assistant.clone() else {
            return;
        };
        let gateway = self.clone();

        tokio::spawn(async move {
            let history = gateway.history_before(conversation.id, answered).await;
            let reply = assistant
                .generate_response(&content, &conversation.tenant_id, &history)
                .await
                .into_inner();

            if let Err(e) = gateway.send_ai_response(conversation.id, reply.message).await {
                error!("Failed to send AI response: {}", e);
            }
        });
    }

    /// Up to `AUTO_REPLY_HISTORY` messages stored before `answered`.
    async fn history_before(&self, conversation_id: Uuid, answered: Uuid) -> Vec<String> {
        deskline_db::blocking(&self.db, move |db| {
            db.recent_message_contents(conversation_id, Some(answered), AUTO_REPLY_HISTORY)
        })
        .await
        .unwrap_or_else(|e| {
            warn!("Could not load history for {}: {}", conversation_id, e);
            Vec::new()
        })
    }

    /// Append an operator (or any non-widget) message and broadcast
    /// `new_message` to the conversation room.
    pub async fn send_operator_message(
        &self,
        conversation_id: Uuid,
        message: NewMessage,
    ) -> Result<Message, GatewayError> {
        let message = deskline_db::blocking(&self.db, move |db| {
            db.append_message(conversation_id, &message)
        })
        .await?;

        self.dispatcher
            .broadcast(
                &Room::Conversation(conversation_id),
                &GatewayEvent::NewMessage {
                    conversation_id,
                    message: message.clone(),
                },
                None,
            )
            .await;
        Ok(message)
    }

    /// Append an assistant message and broadcast `ai_response` to the
    /// conversation room.
    pub async fn send_ai_response(
        &self,
        conversation_id: Uuid,
        content: String,
    ) -> Result<Message, GatewayError> {
        let new_message = NewMessage::text(SenderRole::Ai, content).with_sender_name(AI_SENDER_NAME);
        let message = deskline_db::blocking(&self.db, move |db| {
            db.append_message(conversation_id, &new_message)
        })
        .await?;

        info!("AI response sent to conversation {}", conversation_id);
        self.dispatcher
            .broadcast(
                &Room::Conversation(conversation_id),
                &GatewayEvent::AiResponse {
                    conversation_id,
                    message: message.clone(),
                },
                None,
            )
            .await;
        Ok(message)
    }

    /// Tell the conversation room about a status change. Storage is not touched.
    pub async fn notify_status_change(&self, conversation: &Conversation) {
        let update = serde_json::json!({
            "status": conversation.status,
            "updatedAt": conversation.updated_at,
            "closedAt": conversation.closed_at,
        });
        self.dispatcher
            .broadcast(
                &Room::Conversation(conversation.id),
                &GatewayEvent::ConversationUpdated {
                    conversation_id: conversation.id,
                    update,
                },
                None,
            )
            .await;
    }
}
