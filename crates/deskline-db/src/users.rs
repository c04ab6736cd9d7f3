use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use deskline_types::models::Tenant;

use crate::models::{
    TENANT_COLUMNS, USER_COLUMNS, UserRow, now, tenant_from_row, user_from_row,
};
use crate::{Database, Result, StoreError};

impl Database {
    // -- Users --

    pub fn create_user(&self, email: &str, password_hash: &str, name: &str) -> Result<UserRow> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, name, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5)",
                params![id.to_string(), email, password_hash, name, now()],
            )?;
            Ok(())
        })?;

        self.get_user_by_id(id)?
            .ok_or(StoreError::NotFound("user"))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
            Ok(conn.query_row(&sql, [email], user_from_row).optional()?)
        })
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            Ok(conn
                .query_row(&sql, [id.to_string()], user_from_row)
                .optional()?)
        })
    }

    pub fn update_user_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                params![password_hash, id.to_string()],
            )?)
        })?;

        if changed == 0 {
            return Err(StoreError::NotFound("user"));
        }
        Ok(())
    }

    pub fn set_user_active(&self, id: Uuid, active: bool) -> Result<()> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE users SET is_active = ?1 WHERE id = ?2",
                params![active, id.to_string()],
            )?)
        })?;

        if changed == 0 {
            return Err(StoreError::NotFound("user"));
        }
        Ok(())
    }

    // -- Tenants --

    pub fn create_tenant(&self, name: &str, domain: Option<&str>, owner: Uuid) -> Result<Tenant> {
        let id = Uuid::new_v4().to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO clients (id, name, domain, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, name, domain, owner.to_string(), now()],
            )?;
            Ok(())
        })?;

        self.get_tenant(&id)?.ok_or(StoreError::NotFound("tenant"))
    }

    pub fn get_tenant(&self, id: &str) -> Result<Option<Tenant>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {TENANT_COLUMNS} FROM clients WHERE id = ?1");
            Ok(conn.query_row(&sql, [id], tenant_from_row).optional()?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_is_a_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("ana@example.com", "hash", "Ana").unwrap();

        let err = db
            .create_user("ana@example.com", "other", "Ana Two")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
    }

    #[test]
    fn users_round_trip_through_lookup() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("bia@example.com", "hash", "Bia").unwrap();
        assert!(user.is_active);

        let by_email = db.get_user_by_email("bia@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        db.set_user_active(user.id, false).unwrap();
        db.update_user_password(user.id, "new-hash").unwrap();
        let reloaded = db.get_user_by_id(user.id).unwrap().unwrap();
        assert!(!reloaded.is_active);
        assert_eq!(reloaded.password, "new-hash");

        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn debug_output_hides_the_password_hash() {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .create_user("caio@example.com", "$argon2id$secret-hash", "Caio")
            .unwrap();

        let printed = format!("{user:?}");
        assert!(printed.contains("caio@example.com"));
        assert!(!printed.contains("secret-hash"));
    }

    #[test]
    fn tenants_need_an_existing_owner() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("owner@example.com", "hash", "Owner").unwrap();

        let tenant = db
            .create_tenant("Acme", Some("acme.test"), owner.id)
            .unwrap();
        assert_eq!(db.get_tenant(&tenant.id).unwrap().unwrap().name, "Acme");

        assert!(db.create_tenant("Ghost", None, Uuid::new_v4()).is_err());
    }
}
