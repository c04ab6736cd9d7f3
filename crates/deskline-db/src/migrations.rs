use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            name        TEXT NOT NULL,
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS clients (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            domain      TEXT,
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS conversations (
            id          TEXT PRIMARY KEY,
            client_id   TEXT NOT NULL REFERENCES clients(id),
            type        TEXT NOT NULL,
            status      TEXT NOT NULL,
            subject     TEXT,
            priority    TEXT NOT NULL DEFAULT 'MEDIUM',
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL,
            closed_at   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_client
            ON conversations(client_id, updated_at);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
            content         TEXT NOT NULL,
            type            TEXT NOT NULL,
            sender          TEXT NOT NULL,
            sender_name     TEXT,
            sender_email    TEXT,
            is_from_ai      INTEGER NOT NULL DEFAULT 0,
            attachments     TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages(conversation_id, created_at);

        CREATE TABLE IF NOT EXISTS knowledge_base (
            id          TEXT PRIMARY KEY,
            client_id   TEXT NOT NULL REFERENCES clients(id),
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            type        TEXT NOT NULL,
            source      TEXT,
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_knowledge_client
            ON knowledge_base(client_id, is_active);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
