use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

use deskline_types::events::GatewayEvent;

pub type ConnId = Uuid;

/// A broadcast group. Every connection is implicitly in its tenant's room;
/// conversation rooms are joined and left on request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    Tenant(String),
    Conversation(Uuid),
}

/// Read-only view of a connection's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub tenant_id: String,
    pub user_id: Option<Uuid>,
}

struct Session {
    tenant_id: String,
    user_id: Option<Uuid>,
    conversations: HashSet<Uuid>,
    tx: mpsc::UnboundedSender<GatewayEvent>,
}

impl Session {
    fn is_in(&self, room: &Room) -> bool {
        match room {
            Room::Tenant(id) => self.tenant_id == *id,
            Room::Conversation(id) => self.conversations.contains(id),
        }
    }
}

/// Registry of live connections keyed by connection id.
#[derive(Clone, Default)]
pub struct Dispatcher {
    sessions: Arc<RwLock<HashMap<ConnId, Session>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns its id and the receiver that feeds its socket.
    pub async fn connect(
        &self,
        tenant_id: String,
        user_id: Option<Uuid>,
    ) -> (ConnId, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        info!("Connection {} joined tenant room {}", conn_id, tenant_id);
        self.sessions.write().await.insert(
            conn_id,
            Session {
                tenant_id,
                user_id,
                conversations: HashSet::new(),
                tx,
            },
        );
        (conn_id, rx)
    }

    /// Drop a connection and all of its room memberships.
    pub async fn disconnect(&self, conn_id: ConnId) {
        if self.sessions.write().await.remove(&conn_id).is_some() {
            info!("Connection {} left the gateway", conn_id);
        }
    }

    pub async fn session(&self, conn_id: ConnId) -> Option<SessionInfo> {
        self.sessions
            .read()
            .await
            .get(&conn_id)
            .map(|s| SessionInfo {
                tenant_id: s.tenant_id.clone(),
                user_id: s.user_id,
            })
    }

    /// Returns false if the connection is unknown.
    pub async fn join_conversation(&self, conn_id: ConnId, conversation_id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&conn_id) else {
            return false;
        };
        session.conversations.insert(conversation_id);
        info!("Connection {} joined conversation: {}", conn_id, conversation_id);
        true
    }

    /// Returns false if the connection is unknown.
    pub async fn leave_conversation(&self, conn_id: ConnId, conversation_id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&conn_id) else {
            return false;
        };
        session.conversations.remove(&conversation_id);
        info!("Connection {} left conversation: {}", conn_id, conversation_id);
        true
    }

    /// Deliver an event to one connection.
    pub async fn send_to(&self, conn_id: ConnId, event: GatewayEvent) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(&conn_id) {
            Some(session) => session.tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Deliver an event to every member of `room` except `except`.
    /// Returns the number of connections reached.
    pub async fn broadcast(
        &self,
        room: &Room,
        event: &GatewayEvent,
        except: Option<ConnId>,
    ) -> usize {
        let sessions = self.sessions.read().await;
        let mut delivered = 0;
        for (conn_id, session) in sessions.iter() {
            if Some(*conn_id) == except || !session.is_in(room) {
                continue;
            }
            if session.tx.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        debug!("Broadcast to {:?} reached {} connections", room, delivered);
        delivered
    }

    pub async fn connection_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_event(text: &str) -> GatewayEvent {
        GatewayEvent::Error {
            message: text.into(),
        }
    }

    #[tokio::test]
    async fn tenant_rooms_are_isolated() {
        let dispatcher = Dispatcher::new();
        let (_, mut acme) = dispatcher.connect("acme".into(), None).await;
        let (_, mut globex) = dispatcher.connect("globex".into(), None).await;

        let reached = dispatcher
            .broadcast(&Room::Tenant("acme".into()), &error_event("hi"), None)
            .await;

        assert_eq!(reached, 1);
        assert_eq!(acme.try_recv().unwrap(), error_event("hi"));
        assert!(globex.try_recv().is_err());
    }

    #[tokio::test]
    async fn conversation_rooms_follow_join_and_leave() {
        let dispatcher = Dispatcher::new();
        let conversation = Uuid::new_v4();
        let (a, mut rx_a) = dispatcher.connect("acme".into(), None).await;
        let (b, mut rx_b) = dispatcher.connect("acme".into(), None).await;

        assert!(dispatcher.join_conversation(a, conversation).await);
        assert!(dispatcher.join_conversation(b, conversation).await);

        let room = Room::Conversation(conversation);
        assert_eq!(dispatcher.broadcast(&room, &error_event("1"), None).await, 2);

        dispatcher.leave_conversation(b, conversation).await;
        assert_eq!(dispatcher.broadcast(&room, &error_event("2"), None).await, 1);

        assert_eq!(rx_a.try_recv().unwrap(), error_event("1"));
        assert_eq!(rx_a.try_recv().unwrap(), error_event("2"));
        assert_eq!(rx_b.try_recv().unwrap(), error_event("1"));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_can_skip_the_sender() {
        let dispatcher = Dispatcher::new();
        let conversation = Uuid::new_v4();
        let (a, mut rx_a) = dispatcher.connect("acme".into(), None).await;
        let (b, mut rx_b) = dispatcher.connect("acme".into(), None).await;
        dispatcher.join_conversation(a, conversation).await;
        dispatcher.join_conversation(b, conversation).await;

        dispatcher
            .broadcast(&Room::Conversation(conversation), &error_event("x"), Some(a))
            .await;

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn disconnect_forgets_the_session() {
        let dispatcher = Dispatcher::new();
        let user = Uuid::new_v4();
        let (conn, _rx) = dispatcher.connect("acme".into(), Some(user)).await;

        assert_eq!(
            dispatcher.session(conn).await,
            Some(SessionInfo {
                tenant_id: "acme".into(),
                user_id: Some(user),
            })
        );

        dispatcher.disconnect(conn).await;
        assert_eq!(dispatcher.session(conn).await, None);
        assert_eq!(dispatcher.connection_count().await, 0);
        assert!(!dispatcher.join_conversation(conn, Uuid::new_v4()).await);
        assert!(!dispatcher.send_to(conn, error_event("gone")).await);
    }
}
