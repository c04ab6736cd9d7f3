//! Per-tenant knowledge base. Deletion is soft: the row stays and only the
//! active flag is cleared, which hides it from every listing.

use rusqlite::{OptionalExtension, params};
use tracing::info;
use uuid::Uuid;

use deskline_types::models::{KnowledgeItem, KnowledgePatch, KnowledgeType, Page, Pagination};

use crate::models::{KNOWLEDGE_COLUMNS, knowledge_from_row, now};
use crate::{Database, Result, StoreError};

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Database {
    pub fn add_knowledge(
        &self,
        tenant_id: &str,
        title: &str,
        content: &str,
        kind: KnowledgeType,
        source: Option<&str>,
    ) -> Result<KnowledgeItem> {
        let id = Uuid::new_v4();
        let created = now();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO knowledge_base (id, client_id, title, content, type, source, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
                params![id.to_string(), tenant_id, title, content, kind.as_str(), source, created],
            )?;
            Ok(())
        })?;

        info!("Knowledge added for client {}: {}", tenant_id, title);
        self.get_knowledge_row(id)?
            .ok_or(StoreError::NotFound("knowledge item"))
    }

    /// Every active item of a tenant, newest first.
    pub fn active_knowledge(&self, tenant_id: &str) -> Result<Vec<KnowledgeItem>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {KNOWLEDGE_COLUMNS} FROM knowledge_base
                 WHERE client_id = ?1 AND is_active = 1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map([tenant_id], knowledge_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(items)
        })
    }

    pub fn list_knowledge(
        &self,
        tenant_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<KnowledgeItem>> {
        let limit = limit.max(1);
        let offset = i64::from(page.max(1) - 1) * i64::from(limit);

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {KNOWLEDGE_COLUMNS} FROM knowledge_base
                 WHERE client_id = ?1 AND is_active = 1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(params![tenant_id, i64::from(limit), offset], knowledge_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM knowledge_base WHERE client_id = ?1 AND is_active = 1",
                [tenant_id],
                |row| row.get(0),
            )?;

            Ok(Page {
                items,
                pagination: Pagination::new(page.max(1), limit, total as u64),
            })
        })
    }

    /// Apply the non-empty fields of `patch` to an active item.
    pub fn update_knowledge(
        &self,
        id: Uuid,
        tenant_id: &str,
        patch: &KnowledgePatch,
    ) -> Result<KnowledgeItem> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE knowledge_base
                 SET title = COALESCE(?1, title),
                     content = COALESCE(?2, content),
                     type = COALESCE(?3, type),
                     source = COALESCE(?4, source),
                     updated_at = ?5
                 WHERE id = ?6 AND client_id = ?7 AND is_active = 1",
                params![
                    non_empty(&patch.title),
                    non_empty(&patch.content),
                    patch.kind.map(|k| k.as_str()),
                    non_empty(&patch.source),
                    now(),
                    id.to_string(),
                    tenant_id,
                ],
            )?)
        })?;

        if changed == 0 {
            return Err(StoreError::NotFound("knowledge item"));
        }

        info!("Knowledge updated: {}", id);
        self.get_knowledge_row(id)?
            .ok_or(StoreError::NotFound("knowledge item"))
    }

    /// Soft delete: the row is kept with its active flag cleared.
    pub fn delete_knowledge(&self, id: Uuid, tenant_id: &str) -> Result<()> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE knowledge_base SET is_active = 0, updated_at = ?1
                 WHERE id = ?2 AND client_id = ?3",
                params![now(), id.to_string(), tenant_id],
            )?)
        })?;

        if changed == 0 {
            return Err(StoreError::NotFound("knowledge item"));
        }

        info!("Knowledge deactivated: {}", id);
        Ok(())
    }

    /// Fetch a row regardless of its active flag.
    pub fn get_knowledge_row(&self, id: Uuid) -> Result<Option<KnowledgeItem>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {KNOWLEDGE_COLUMNS} FROM knowledge_base WHERE id = ?1");
            Ok(conn
                .query_row(&sql, [id.to_string()], knowledge_from_row)
                .optional()?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("kb@example.com", "hash", "KB").unwrap();
        let tenant = db.create_tenant("Acme", None, owner.id).unwrap();
        (db, tenant.id)
    }

    #[test]
    fn soft_delete_hides_item_but_keeps_row() {
        let (db, tenant) = fixture();
        let keep = db
            .add_knowledge(&tenant, "Horário", "Seg a sex, 9h-18h", KnowledgeType::Faq, None)
            .unwrap();
        let gone = db
            .add_knowledge(&tenant, "Frete", "Grátis acima de R$100", KnowledgeType::Text, Some("site"))
            .unwrap();

        db.delete_knowledge(gone.id, &tenant).unwrap();

        let listed = db.list_knowledge(&tenant, 1, 20).unwrap();
        assert_eq!(listed.items, vec![keep.clone()]);
        assert_eq!(listed.pagination.total, 1);
        assert_eq!(db.active_knowledge(&tenant).unwrap(), vec![keep]);

        let row = db.get_knowledge_row(gone.id).unwrap().expect("row kept");
        assert!(!row.is_active);
    }

    #[test]
    fn delete_from_another_tenant_is_not_found() {
        let (db, tenant) = fixture();
        let item = db
            .add_knowledge(&tenant, "A", "B", KnowledgeType::Faq, None)
            .unwrap();
        assert!(db.delete_knowledge(item.id, "other").unwrap_err().is_not_found());
    }

    #[test]
    fn update_ignores_empty_fields() {
        let (db, tenant) = fixture();
        let item = db
            .add_knowledge(&tenant, "Trocas", "Em até 7 dias", KnowledgeType::Faq, Some("manual"))
            .unwrap();

        let patch = KnowledgePatch {
            title: Some(String::new()),
            content: Some("Em até 30 dias".into()),
            kind: Some(KnowledgeType::Document),
            source: None,
        };
        let updated = db.update_knowledge(item.id, &tenant, &patch).unwrap();

        assert_eq!(updated.title, "Trocas");
        assert_eq!(updated.content, "Em até 30 dias");
        assert_eq!(updated.kind, KnowledgeType::Document);
        assert_eq!(updated.source.as_deref(), Some("manual"));
        assert!(updated.updated_at >= item.updated_at);
    }

    #[test]
    fn deleted_items_cannot_be_updated() {
        let (db, tenant) = fixture();
        let item = db
            .add_knowledge(&tenant, "A", "B", KnowledgeType::Url, None)
            .unwrap();
        db.delete_knowledge(item.id, &tenant).unwrap();

        let err = db
            .update_knowledge(item.id, &tenant, &KnowledgePatch::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn listing_pages_newest_first() {
        let (db, tenant) = fixture();
        for i in 0..3 {
            db.add_knowledge(&tenant, &format!("k{i}"), "c", KnowledgeType::Text, None)
                .unwrap();
        }

        let page = db.list_knowledge(&tenant, 1, 2).unwrap();
        let titles: Vec<_> = page.items.iter().map(|k| k.title.as_str()).collect();
        assert_eq!(titles, ["k2", "k1"]);
        assert_eq!(page.pagination.pages, 2);
    }
}
