//! Conversation Store: conversations, their messages and per-tenant stats.
//!
//! Status is a free-form enum. Appending a message sets it to `OPEN` for
//! customer messages and `IN_PROGRESS` for everyone else; `update_status`
//! overwrites it unconditionally and stamps `closed_at` on `CLOSED`.

use std::collections::HashMap;

use chrono::{Local, Utc};
use rusqlite::{OptionalExtension, params, params_from_iter};
use tracing::info;
use uuid::Uuid;

use deskline_types::models::{
    ChannelType, Conversation, ConversationStats, ConversationStatus, ConversationSummary, Message,
    NewMessage, Page, Pagination, Priority,
};

use crate::models::{
    CONVERSATION_COLUMNS, MESSAGE_COLUMNS, conversation_from_row, message_from_row, now, timestamp,
};
use crate::{Database, Result, StoreError};

/// Tenant filter plus optional case-insensitive search over the subject or
/// any message body. `?1` is the tenant id, `?2` the search text or NULL.
const LIST_FILTER: &str = "c.client_id = ?1
    AND (?2 IS NULL
         OR instr(lower(coalesce(c.subject, '')), lower(?2)) > 0
         OR EXISTS (SELECT 1 FROM messages ms
                    WHERE ms.conversation_id = c.id
                      AND instr(lower(ms.content), lower(?2)) > 0))";

/// Offset for a 1-based page. Page 0 is read as page 1.
fn offset(page: u32, limit: u32) -> i64 {
    i64::from(page.max(1) - 1) * i64::from(limit)
}

impl Database {
    pub fn create_conversation(
        &self,
        tenant_id: &str,
        channel: ChannelType,
        subject: Option<&str>,
    ) -> Result<Conversation> {
        let id = Uuid::new_v4();
        let created = now();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (id, client_id, type, status, subject, priority, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    id.to_string(),
                    tenant_id,
                    channel.as_str(),
                    ConversationStatus::Open.as_str(),
                    subject,
                    Priority::default().as_str(),
                    created,
                ],
            )?;
            Ok(())
        })?;

        info!("Conversation created: {} (client {})", id, tenant_id);
        self.get_conversation(id, None)
    }

    /// Page through a tenant's conversations, most recently updated first.
    /// Each row carries its latest message and its message count.
    pub fn list_conversations(
        &self,
        tenant_id: &str,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> Result<Page<ConversationSummary>> {
        let limit = limit.max(1);
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let (rows, total) = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CONVERSATION_COLUMNS},
                        (SELECT COUNT(*) FROM messages mc WHERE mc.conversation_id = c.id)
                 FROM conversations c
                 WHERE {LIST_FILTER}
                 ORDER BY c.updated_at DESC, c.rowid DESC
                 LIMIT ?3 OFFSET ?4"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![tenant_id, search, i64::from(limit), offset(page, limit)],
                    |row| Ok((conversation_from_row(row)?, row.get::<_, i64>(9)?)),
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM conversations c WHERE {LIST_FILTER}"),
                params![tenant_id, search],
                |row| row.get(0),
            )?;

            Ok((rows, total))
        })?;

        let ids: Vec<String> = rows.iter().map(|(c, _)| c.id.to_string()).collect();
        let mut latest = self.latest_messages(&ids)?;

        let items = rows
            .into_iter()
            .map(|(conversation, count)| ConversationSummary {
                last_message: latest.remove(&conversation.id),
                message_count: count as u64,
                conversation,
            })
            .collect();

        Ok(Page {
            items,
            pagination: Pagination::new(page.max(1), limit, total as u64),
        })
    }

    /// Batch-fetch the newest message of each conversation.
    fn latest_messages(&self, conversation_ids: &[String]) -> Result<HashMap<Uuid, Message>> {
        if conversation_ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=conversation_ids.len())
                .map(|i| format!("?{}", i))
                .collect();
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM messages m
                 WHERE m.conversation_id IN ({})
                   AND m.rowid = (SELECT m2.rowid FROM messages m2
                                  WHERE m2.conversation_id = m.conversation_id
                                  ORDER BY m2.created_at DESC, m2.rowid DESC
                                  LIMIT 1)",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let messages = stmt
                .query_map(params_from_iter(conversation_ids.iter()), message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(messages
                .into_iter()
                .map(|m| (m.conversation_id, m))
                .collect())
        })
    }

    /// Look a conversation up by id. Without `tenant_id` the lookup is not
    /// tenant-scoped and any tenant's conversation may be returned.
    pub fn get_conversation(&self, id: Uuid, tenant_id: Option<&str>) -> Result<Conversation> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations c
                 WHERE c.id = ?1 AND (?2 IS NULL OR c.client_id = ?2)"
            );
            conn.query_row(&sql, params![id.to_string(), tenant_id], conversation_from_row)
                .optional()?
                .ok_or(StoreError::NotFound("conversation"))
        })
    }

    /// Insert a message and move the conversation to the status implied by
    /// the sender, refreshing `updated_at`.
    pub fn append_message(&self, conversation_id: Uuid, msg: &NewMessage) -> Result<Message> {
        let id = Uuid::new_v4();
        let attachments = msg
            .attachments
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(anyhow::Error::from)?;

        let message = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists = tx
                .query_row(
                    "SELECT 1 FROM conversations WHERE id = ?1",
                    [conversation_id.to_string()],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !exists {
                return Err(StoreError::NotFound("conversation"));
            }

            let created = now();
            tx.execute(
                "INSERT INTO messages (id, conversation_id, content, type, sender, sender_name, sender_email, is_from_ai, attachments, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id.to_string(),
                    conversation_id.to_string(),
                    msg.content,
                    msg.kind.as_str(),
                    msg.sender.as_str(),
                    msg.sender_name,
                    msg.sender_email,
                    msg.is_from_ai,
                    attachments,
                    created,
                ],
            )?;

            tx.execute(
                "UPDATE conversations SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![
                    msg.sender.resulting_status().as_str(),
                    created,
                    conversation_id.to_string(),
                ],
            )?;

            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = ?1");
            let message = tx.query_row(&sql, [id.to_string()], message_from_row)?;

            tx.commit()?;
            Ok(message)
        })?;

        info!("Message sent in conversation: {}", conversation_id);
        Ok(message)
    }

    /// Messages of a conversation in chronological order.
    pub fn list_messages(
        &self,
        conversation_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<Page<Message>> {
        let limit = limit.max(1);

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE m.conversation_id = ?1
                 ORDER BY m.created_at ASC, m.rowid ASC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(
                    params![conversation_id.to_string(), i64::from(limit), offset(page, limit)],
                    message_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                [conversation_id.to_string()],
                |row| row.get(0),
            )?;

            Ok(Page {
                items,
                pagination: Pagination::new(page.max(1), limit, total as u64),
            })
        })
    }

    /// Contents of the last `n` messages, oldest first. With `before`, only
    /// messages stored ahead of that message count, so the answered message
    /// and anything appended after it are left out.
    pub fn recent_message_contents(
        &self,
        conversation_id: Uuid,
        before: Option<Uuid>,
        n: u32,
    ) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT content FROM messages
                 WHERE conversation_id = ?1
                   AND (?2 IS NULL OR rowid < (SELECT rowid FROM messages WHERE id = ?2))
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?3",
            )?;
            let mut contents = stmt
                .query_map(
                    params![
                        conversation_id.to_string(),
                        before.map(|id| id.to_string()),
                        i64::from(n)
                    ],
                    |row| row.get::<_, String>(0),
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            contents.reverse();
            Ok(contents)
        })
    }

    pub fn update_status(
        &self,
        id: Uuid,
        status: ConversationStatus,
        tenant_id: Option<&str>,
    ) -> Result<Conversation> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE conversations
                 SET status = ?1,
                     updated_at = ?2,
                     closed_at = CASE WHEN ?1 = 'CLOSED' THEN ?2 ELSE closed_at END
                 WHERE id = ?3 AND (?4 IS NULL OR client_id = ?4)",
                params![status.as_str(), now(), id.to_string(), tenant_id],
            )?)
        })?;

        if changed == 0 {
            return Err(StoreError::NotFound("conversation"));
        }

        info!("Conversation {} status updated to {}", id, status);
        self.get_conversation(id, tenant_id)
    }

    /// Hard delete; messages go with it. Returns whether a row was removed.
    pub fn delete_conversation(&self, id: Uuid, tenant_id: Option<&str>) -> Result<bool> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM conversations WHERE id = ?1 AND (?2 IS NULL OR client_id = ?2)",
                params![id.to_string(), tenant_id],
            )?)
        })?;

        if changed > 0 {
            info!("Conversation deleted: {}", id);
        }
        Ok(changed > 0)
    }

    pub fn conversation_stats(&self, tenant_id: &str) -> Result<ConversationStats> {
        // Conversations opened since local midnight count as "today".
        let midnight = Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| naive.and_local_timezone(Local).earliest())
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(status = 'OPEN'), 0),
                        COALESCE(SUM(status = 'IN_PROGRESS'), 0),
                        COALESCE(SUM(status = 'CLOSED'), 0),
                        COALESCE(SUM(created_at >= ?2), 0)
                 FROM conversations
                 WHERE client_id = ?1",
                params![tenant_id, timestamp(midnight)],
                |row| {
                    Ok(ConversationStats {
                        total: row.get::<_, i64>(0)? as u64,
                        open: row.get::<_, i64>(1)? as u64,
                        in_progress: row.get::<_, i64>(2)? as u64,
                        closed: row.get::<_, i64>(3)? as u64,
                        today_count: row.get::<_, i64>(4)? as u64,
                    })
                },
            )?)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use deskline_types::models::{MessageType, SenderRole};

    use super::*;

    fn fixture() -> (Database, String, String) {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("owner@example.com", "hash", "Owner").unwrap();
        let a = db.create_tenant("Acme", None, owner.id).unwrap();
        let b = db.create_tenant("Globex", None, owner.id).unwrap();
        (db, a.id, b.id)
    }

    fn tick() {
        std::thread::sleep(Duration::from_millis(2));
    }

    #[test]
    fn new_conversations_start_open() {
        let (db, tenant, _) = fixture();
        let conv = db
            .create_conversation(&tenant, ChannelType::Email, Some("Refund"))
            .unwrap();

        assert_eq!(conv.status, ConversationStatus::Open);
        assert_eq!(conv.channel, ChannelType::Email);
        assert_eq!(conv.priority, Priority::Medium);
        assert!(conv.closed_at.is_none());
    }

    #[test]
    fn conversation_requires_existing_tenant() {
        let (db, _, _) = fixture();
        assert!(db.create_conversation("missing", ChannelType::Chat, None).is_err());
    }

    #[test]
    fn user_message_opens_and_agent_message_progresses() {
        let (db, tenant, _) = fixture();
        let conv = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();

        db.append_message(conv.id, &NewMessage::text(SenderRole::Agent, "Olá"))
            .unwrap();
        let after_agent = db.get_conversation(conv.id, None).unwrap();
        assert_eq!(after_agent.status, ConversationStatus::InProgress);
        assert!(after_agent.updated_at >= conv.updated_at);

        db.append_message(conv.id, &NewMessage::text(SenderRole::User, "Oi"))
            .unwrap();
        assert_eq!(
            db.get_conversation(conv.id, None).unwrap().status,
            ConversationStatus::Open
        );

        db.append_message(conv.id, &NewMessage::text(SenderRole::Ai, "Posso ajudar?"))
            .unwrap();
        assert_eq!(
            db.get_conversation(conv.id, None).unwrap().status,
            ConversationStatus::InProgress
        );
    }

    #[test]
    fn append_to_missing_conversation_is_not_found() {
        let (db, _, _) = fixture();
        let err = db
            .append_message(Uuid::new_v4(), &NewMessage::text(SenderRole::User, "?"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn first_message_scenario() {
        let (db, tenant, _) = fixture();
        let conv = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();

        let sent = db
            .append_message(
                conv.id,
                &NewMessage::text(SenderRole::User, "Preciso de ajuda")
                    .with_sender_name("Visitante"),
            )
            .unwrap();

        let page = db.list_messages(conv.id, 1, 50).unwrap();
        assert_eq!(page.items, vec![sent.clone()]);
        assert_eq!(page.pagination.total, 1);
        assert_eq!(sent.kind, MessageType::Text);
        assert!(!sent.is_from_ai);

        assert!(db.conversation_stats(&tenant).unwrap().today_count >= 1);
    }

    #[test]
    fn messages_are_chronological_and_paginated() {
        let (db, tenant, _) = fixture();
        let conv = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
        for i in 0..5 {
            db.append_message(conv.id, &NewMessage::text(SenderRole::User, format!("m{i}")))
                .unwrap();
        }

        let first = db.list_messages(conv.id, 1, 2).unwrap();
        let contents: Vec<_> = first.items.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m0", "m1"]);
        assert_eq!(first.pagination.pages, 3);

        let last = db.list_messages(conv.id, 3, 2).unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].content, "m4");

        assert_eq!(
            db.recent_message_contents(conv.id, None, 2).unwrap(),
            vec!["m3".to_string(), "m4".to_string()]
        );
    }

    #[test]
    fn history_before_a_message_skips_it_and_later_ones() {
        let (db, tenant, _) = fixture();
        let conv = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
        db.append_message(conv.id, &NewMessage::text(SenderRole::User, "a"))
            .unwrap();
        db.append_message(conv.id, &NewMessage::text(SenderRole::Agent, "b"))
            .unwrap();
        let answered = db
            .append_message(conv.id, &NewMessage::text(SenderRole::User, "c"))
            .unwrap();
        db.append_message(conv.id, &NewMessage::text(SenderRole::User, "d"))
            .unwrap();

        assert_eq!(
            db.recent_message_contents(conv.id, Some(answered.id), 10).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(
            db.recent_message_contents(conv.id, Some(answered.id), 1).unwrap(),
            vec!["b".to_string()]
        );
    }

    #[test]
    fn attachments_survive_storage() {
        let (db, tenant, _) = fixture();
        let conv = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();

        let mut msg = NewMessage::text(SenderRole::User, "see file");
        msg.kind = MessageType::File;
        msg.attachments = Some(serde_json::json!([{ "name": "invoice.pdf", "size": 1024 }]));
        let saved = db.append_message(conv.id, &msg).unwrap();

        assert_eq!(saved.kind, MessageType::File);
        assert_eq!(saved.attachments.unwrap()[0]["name"], "invoice.pdf");
    }

    #[test]
    fn listing_is_tenant_scoped_and_ordered_by_activity() {
        let (db, tenant, other) = fixture();
        let older = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
        tick();
        let newer = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
        db.create_conversation(&other, ChannelType::Chat, None).unwrap();
        tick();

        db.append_message(older.id, &NewMessage::text(SenderRole::User, "bump"))
            .unwrap();

        let page = db.list_conversations(&tenant, 1, 10, None).unwrap();
        let ids: Vec<_> = page.items.iter().map(|s| s.conversation.id).collect();
        assert_eq!(ids, [older.id, newer.id]);
        assert!(page.items.iter().all(|s| s.conversation.tenant_id == tenant));
        assert_eq!(page.pagination.total, 2);

        let bumped = &page.items[0];
        assert_eq!(bumped.message_count, 1);
        assert_eq!(bumped.last_message.as_ref().unwrap().content, "bump");
        assert!(page.items[1].last_message.is_none());
    }

    #[test]
    fn last_message_is_the_newest_one() {
        let (db, tenant, _) = fixture();
        let conv = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
        db.append_message(conv.id, &NewMessage::text(SenderRole::User, "first"))
            .unwrap();
        db.append_message(conv.id, &NewMessage::text(SenderRole::Agent, "second"))
            .unwrap();

        let page = db.list_conversations(&tenant, 1, 10, None).unwrap();
        assert_eq!(page.items[0].message_count, 2);
        assert_eq!(page.items[0].last_message.as_ref().unwrap().content, "second");
    }

    #[test]
    fn search_matches_subject_or_message_case_insensitively() {
        let (db, tenant, other) = fixture();
        let by_subject = db
            .create_conversation(&tenant, ChannelType::Email, Some("Boleto atrasado"))
            .unwrap();
        let by_message = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
        db.append_message(by_message.id, &NewMessage::text(SenderRole::User, "Meu BOLETO sumiu"))
            .unwrap();
        db.create_conversation(&tenant, ChannelType::Chat, Some("Senha"))
            .unwrap();
        db.create_conversation(&other, ChannelType::Chat, Some("boleto"))
            .unwrap();

        let page = db.list_conversations(&tenant, 1, 10, Some("boleto")).unwrap();
        let mut ids: Vec<_> = page.items.iter().map(|s| s.conversation.id).collect();
        ids.sort();
        let mut expected = vec![by_subject.id, by_message.id];
        expected.sort();
        assert_eq!(ids, expected);
        assert_eq!(page.pagination.total, 2);

        let blank = db.list_conversations(&tenant, 1, 10, Some("  ")).unwrap();
        assert_eq!(blank.pagination.total, 3);
    }

    #[test]
    fn conversation_pages_skip_earlier_rows() {
        let (db, tenant, _) = fixture();
        for _ in 0..3 {
            db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
            tick();
        }

        let second = db.list_conversations(&tenant, 2, 2, None).unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.pagination.pages, 2);
        assert_eq!(second.pagination.page, 2);
    }

    #[test]
    fn lookup_without_tenant_crosses_tenants() {
        let (db, tenant, other) = fixture();
        let conv = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();

        // Unscoped lookups return any tenant's conversation.
        assert_eq!(db.get_conversation(conv.id, None).unwrap().id, conv.id);
        assert_eq!(db.get_conversation(conv.id, Some(&tenant)).unwrap().id, conv.id);
        assert!(db.get_conversation(conv.id, Some(&other)).unwrap_err().is_not_found());
    }

    #[test]
    fn closing_stamps_closed_at_and_reopening_is_allowed() {
        let (db, tenant, _) = fixture();
        let conv = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();

        let archived = db
            .update_status(conv.id, ConversationStatus::Archived, None)
            .unwrap();
        assert!(archived.closed_at.is_none());

        let closed = db
            .update_status(conv.id, ConversationStatus::Closed, Some(&tenant))
            .unwrap();
        let closed_at = closed.closed_at.expect("closed_at set");

        let reopened = db
            .update_status(conv.id, ConversationStatus::Open, None)
            .unwrap();
        assert_eq!(reopened.status, ConversationStatus::Open);
        assert_eq!(reopened.closed_at, Some(closed_at));
    }

    #[test]
    fn status_update_respects_tenant_filter() {
        let (db, tenant, other) = fixture();
        let conv = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();

        let err = db
            .update_status(conv.id, ConversationStatus::Closed, Some(&other))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            db.get_conversation(conv.id, None).unwrap().status,
            ConversationStatus::Open
        );
    }

    #[test]
    fn delete_cascades_and_is_idempotent() {
        let (db, tenant, other) = fixture();
        let conv = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
        db.append_message(conv.id, &NewMessage::text(SenderRole::User, "bye"))
            .unwrap();

        assert!(!db.delete_conversation(conv.id, Some(&other)).unwrap());
        assert!(db.delete_conversation(conv.id, Some(&tenant)).unwrap());
        assert!(!db.delete_conversation(conv.id, None).unwrap());

        assert_eq!(db.list_messages(conv.id, 1, 50).unwrap().pagination.total, 0);
        assert!(db.get_conversation(conv.id, None).unwrap_err().is_not_found());
    }

    #[test]
    fn stats_count_each_status() {
        let (db, tenant, other) = fixture();
        let a = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
        let b = db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
        db.create_conversation(&tenant, ChannelType::Chat, None).unwrap();
        db.create_conversation(&other, ChannelType::Chat, None).unwrap();

        db.append_message(a.id, &NewMessage::text(SenderRole::Agent, "on it"))
            .unwrap();
        db.update_status(b.id, ConversationStatus::Closed, None).unwrap();

        let stats = db.conversation_stats(&tenant).unwrap();
        assert_eq!(
            stats,
            ConversationStats {
                total: 3,
                open: 1,
                in_progress: 1,
                closed: 1,
                today_count: 3,
            }
        );
        assert_eq!(db.conversation_stats("nobody").unwrap(), ConversationStats::default());
    }
}
