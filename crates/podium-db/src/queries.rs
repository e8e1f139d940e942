use rusqlite::Connection;

use crate::Database;
use crate::error::StoreError;
use crate::models::{ContactRow, RegistrationRow, SessionRow, UserRow};

type Result<T> = std::result::Result<T, StoreError>;

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<UserRow> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            )
            .map_err(StoreError::from_write)?;

            query_user_by_id(conn, conn.last_insert_rowid())?.ok_or(StoreError::NotFound)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, created_at FROM users WHERE username = ?1",
            )?;
            stmt.query_row([username], user_from_row).optional()
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.read(|conn| query_user_by_id(conn, id))
    }

    // -- Registrations --

    pub fn create_registration(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        phone: &str,
        occupation: Option<&str>,
        topics: &str,
    ) -> Result<RegistrationRow> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO registrations (first_name, last_name, email, phone, occupation, topics)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (first_name, last_name, email, phone, occupation, topics),
            )
            .map_err(StoreError::from_write)?;

            let id = conn.last_insert_rowid();
            let mut stmt = conn.prepare(
                "SELECT id, first_name, last_name, email, phone, occupation, topics, created_at
                 FROM registrations WHERE id = ?1",
            )?;
            stmt.query_row([id], registration_from_row)
                .optional()?
                .ok_or(StoreError::NotFound)
        })
    }

    pub fn list_registrations(&self) -> Result<Vec<RegistrationRow>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, first_name, last_name, email, phone, occupation, topics, created_at
                 FROM registrations ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], registration_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_registration(&self, id: i64) -> Result<()> {
        self.write(|conn| {
            let changed = conn.execute("DELETE FROM registrations WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    // -- Contacts --

    pub fn create_contact(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> Result<ContactRow> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO contacts (name, email, subject, message) VALUES (?1, ?2, ?3, ?4)",
                (name, email, subject, message),
            )
            .map_err(StoreError::from_write)?;

            query_contact_by_id(conn, conn.last_insert_rowid())?.ok_or(StoreError::NotFound)
        })
    }

    pub fn list_contacts(&self) -> Result<Vec<ContactRow>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, subject, message, is_read, created_at
                 FROM contacts ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], contact_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_contact(&self, id: i64) -> Result<Option<ContactRow>> {
        self.read(|conn| query_contact_by_id(conn, id))
    }

    /// One-way Unread -> Read transition. Re-marking an already-read contact
    /// still matches the row, so the call stays idempotent.
    pub fn mark_contact_read(&self, id: i64) -> Result<ContactRow> {
        self.write(|conn| {
            let changed = conn.execute("UPDATE contacts SET is_read = 1 WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            query_contact_by_id(conn, id)?.ok_or(StoreError::NotFound)
        })
    }

    pub fn delete_contact(&self, id: i64) -> Result<()> {
        self.write(|conn| {
            let changed = conn.execute("DELETE FROM contacts WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    // -- Sessions --

    pub fn create_session(&self, id: &str, user_id: i64, ttl_days: u32) -> Result<()> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, user_id, expires_at)
                 VALUES (?1, ?2, datetime('now', '+' || ?3 || ' days'))",
                rusqlite::params![id, user_id, ttl_days],
            )
            .map_err(StoreError::from_write)?;
            Ok(())
        })
    }

    /// Returns the session only while it is still live; expired rows are
    /// treated as absent and swept by [`Database::purge_expired_sessions`].
    pub fn get_session(&self, id: &str) -> Result<Option<SessionRow>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, expires_at, created_at FROM sessions
                 WHERE id = ?1 AND expires_at > datetime('now')",
            )?;
            stmt.query_row([id], |row| {
                Ok(SessionRow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    expires_at: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })
            .optional()
        })
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        self.write(|conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn purge_expired_sessions(&self) -> Result<usize> {
        self.write(|conn| {
            let purged =
                conn.execute("DELETE FROM sessions WHERE expires_at <= datetime('now')", [])?;
            Ok(purged)
        })
    }
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;
    stmt.query_row([id], user_from_row).optional()
}

fn query_contact_by_id(conn: &Connection, id: i64) -> Result<Option<ContactRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, subject, message, is_read, created_at
         FROM contacts WHERE id = ?1",
    )?;
    stmt.query_row([id], contact_from_row).optional()
}

fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn registration_from_row(
    row: &rusqlite::Row<'_>,
) -> std::result::Result<RegistrationRow, rusqlite::Error> {
    Ok(RegistrationRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        occupation: row.get(5)?,
        topics: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn contact_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<ContactRow, rusqlite::Error> {
    Ok(ContactRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        subject: row.get(3)?,
        message: row.get(4)?,
        is_read: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db(name: &str) -> Database {
        let path = std::env::temp_dir().join(format!(
            "podium_db_test_{}_{}.sqlite",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(path.with_extension("sqlite-shm"));
        Database::open(&path).unwrap()
    }

    #[test]
    fn duplicate_registration_email_is_conflict() {
        let db = test_db("dup_email");

        db.create_registration("Aysel", "Quliyeva", "aysel@example.com", "0501234567", None, "")
            .unwrap();
        let err = db
            .create_registration("Rauf", "Aliyev", "aysel@example.com", "0557654321", None, "")
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(db.list_registrations().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let db = test_db("dup_user");

        db.create_user("admin", "deadbeef.cafe").unwrap();
        let err = db.create_user("admin", "other.hash").unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[test]
    fn delete_missing_registration_is_not_found() {
        let db = test_db("del_missing");

        db.create_registration("Leyla", "Hasanova", "leyla@example.com", "0509876543", None, "")
            .unwrap();
        let err = db.delete_registration(999_999).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert_eq!(db.list_registrations().unwrap().len(), 1);
    }

    #[test]
    fn registrations_listed_newest_first() {
        let db = test_db("reg_order");

        let first = db
            .create_registration("A", "One", "one@example.com", "1", None, "ai,design")
            .unwrap();
        let second = db
            .create_registration("B", "Two", "two@example.com", "2", Some("student"), "")
            .unwrap();

        let rows = db.list_registrations().unwrap();
        assert_eq!(rows[0].id, second.id);
        assert_eq!(rows[1].id, first.id);
        assert_eq!(rows[1].topics, "ai,design");
    }

    #[test]
    fn contact_starts_unread_and_mark_read_is_idempotent() {
        let db = test_db("contact_read");

        let contact = db
            .create_contact("Nigar", "nigar@example.com", "Tickets", "Any left?")
            .unwrap();
        assert!(!contact.is_read);

        let updated = db.mark_contact_read(contact.id).unwrap();
        assert!(updated.is_read);

        // Second call still succeeds and the state does not change.
        let again = db.mark_contact_read(contact.id).unwrap();
        assert!(again.is_read);
    }

    #[test]
    fn mark_read_on_missing_contact_is_not_found() {
        let db = test_db("read_missing");
        let err = db.mark_contact_read(42).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn delete_contact_removes_row() {
        let db = test_db("del_contact");

        let contact = db
            .create_contact("Tural", "tural@example.com", "Press", "Accreditation")
            .unwrap();
        db.delete_contact(contact.id).unwrap();

        assert!(db.get_contact(contact.id).unwrap().is_none());
        assert!(matches!(
            db.delete_contact(contact.id).unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[test]
    fn session_roundtrip_and_expiry() {
        let db = test_db("sessions");

        let user = db.create_user("admin", "hash.salt").unwrap();
        db.create_session("abc123", user.id, 7).unwrap();

        let session = db.get_session("abc123").unwrap().unwrap();
        assert_eq!(session.user_id, user.id);

        // Zero-day TTL expires immediately.
        db.create_session("expired", user.id, 0).unwrap();
        assert!(db.get_session("expired").unwrap().is_none());
        assert_eq!(db.purge_expired_sessions().unwrap(), 1);

        db.delete_session("abc123").unwrap();
        assert!(db.get_session("abc123").unwrap().is_none());
    }
}
