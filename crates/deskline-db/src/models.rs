//! Row types and column decoding.
//!
//! `UserRow` carries the password hash and never leaves the server; callers
//! get a `UserProfile` from it. Other tables decode straight into `deskline-types` models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use deskline_types::models::{Conversation, KnowledgeItem, Message, Tenant, UserProfile};

pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRow")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl UserRow {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Fixed-width UTC timestamp, so text order matches time order.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn now() -> String {
    timestamp(Utc::now())
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn parsed_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

pub(crate) fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn optional_timestamp_at(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => timestamp_at(row, idx).map(Some),
        None => Ok(None),
    }
}

pub(crate) const USER_COLUMNS: &str = "id, email, password, name, is_active, created_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: parsed_at(row, 0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        name: row.get(3)?,
        is_active: row.get(4)?,
        created_at: timestamp_at(row, 5)?,
    })
}

pub(crate) const TENANT_COLUMNS: &str = "id, name, domain, user_id, created_at";

pub(crate) fn tenant_from_row(row: &Row<'_>) -> rusqlite::Result<Tenant> {
    Ok(Tenant {
        id: row.get(0)?,
        name: row.get(1)?,
        domain: row.get(2)?,
        user_id: parsed_at(row, 3)?,
        created_at: timestamp_at(row, 4)?,
    })
}

pub(crate) const CONVERSATION_COLUMNS: &str =
    "c.id, c.client_id, c.type, c.status, c.subject, c.priority, c.created_at, c.updated_at, c.closed_at";

pub(crate) fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: parsed_at(row, 0)?,
        tenant_id: row.get(1)?,
        channel: parsed_at(row, 2)?,
        status: parsed_at(row, 3)?,
        subject: row.get(4)?,
        priority: parsed_at(row, 5)?,
        created_at: timestamp_at(row, 6)?,
        updated_at: timestamp_at(row, 7)?,
        closed_at: optional_timestamp_at(row, 8)?,
    })
}

pub(crate) const MESSAGE_COLUMNS: &str = "m.id, m.conversation_id, m.content, m.type, m.sender, m.sender_name, m.sender_email, m.is_from_ai, m.attachments, m.created_at";

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let attachments = match row.get::<_, Option<String>>(8)? {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| conversion_error(8, e))?),
        None => None,
    };

    Ok(Message {
        id: parsed_at(row, 0)?,
        conversation_id: parsed_at(row, 1)?,
        content: row.get(2)?,
        kind: parsed_at(row, 3)?,
        sender: parsed_at(row, 4)?,
        sender_name: row.get(5)?,
        sender_email: row.get(6)?,
        is_from_ai: row.get(7)?,
        attachments,
        created_at: timestamp_at(row, 9)?,
    })
}

pub(crate) const KNOWLEDGE_COLUMNS: &str =
    "id, client_id, title, content, type, source, is_active, created_at, updated_at";

pub(crate) fn knowledge_from_row(row: &Row<'_>) -> rusqlite::Result<KnowledgeItem> {
    Ok(KnowledgeItem {
        id: parsed_at(row, 0)?,
        tenant_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        kind: parsed_at(row, 4)?,
        source: row.get(5)?,
        is_active: row.get(6)?,
        created_at: timestamp_at(row, 7)?,
        updated_at: timestamp_at(row, 8)?,
    })
}
