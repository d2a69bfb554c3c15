//! Key-value entry queries.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension};

use crate::error::{DatabaseResultExt, Result};

const SELECT_VALUE_SQL: &str = "SELECT value FROM kv WHERE key = ?1";
const UPSERT_VALUE_SQL: &str = "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";
const DELETE_VALUE_SQL: &str = "DELETE FROM kv WHERE key = ?1";

impl super::Database {
    /// Reads the value stored under `key`.
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.connection
            .query_row(SELECT_VALUE_SQL, params![key], |row| row.get(0))
            .optional()
            .db_context("Failed to read value")
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.connection
            .execute(
                UPSERT_VALUE_SQL,
                params![key, value, Timestamp::now().to_string()],
            )
            .db_context("Failed to write value")?;
        Ok(())
    }

    /// Removes `key`. Removing a missing key is not an error.
    pub fn remove_value(&self, key: &str) -> Result<()> {
        self.connection
            .execute(DELETE_VALUE_SQL, params![key])
            .db_context("Failed to remove value")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::db::Database;

    #[test]
    fn test_value_lifecycle() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::new(temp_dir.path().join("kv.db")).expect("Failed to open database");

        assert_eq!(db.get_value("k").unwrap(), None);
        db.set_value("k", "one").unwrap();
        db.set_value("k", "two").unwrap();
        assert_eq!(db.get_value("k").unwrap().as_deref(), Some("two"));

        db.remove_value("k").unwrap();
        db.remove_value("k").unwrap();
        assert_eq!(db.get_value("k").unwrap(), None);
    }
}
