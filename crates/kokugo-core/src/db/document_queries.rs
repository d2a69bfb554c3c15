//! JSON document queries.
//!
//! Bodies are stored as serialized JSON objects. A merge overwrites the
//! top-level fields it names and keeps every other field of the stored body.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension};
use serde_json::{Map, Value};

use crate::{
    error::{DatabaseResultExt, Result},
    store::{Document, Fields},
};

const SELECT_DOCUMENT_SQL: &str = "SELECT body FROM documents WHERE collection = ?1 AND id = ?2";
const UPSERT_DOCUMENT_SQL: &str =
    "INSERT INTO documents (collection, id, body, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)
     ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at";
const LIST_DOCUMENTS_SQL: &str =
    "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY updated_at DESC, id DESC";
const DELETE_DOCUMENT_SQL: &str = "DELETE FROM documents WHERE collection = ?1 AND id = ?2";

fn parse_body(body: &str) -> Result<Fields> {
    Ok(match serde_json::from_str::<Value>(body)? {
        Value::Object(fields) => fields,
        _ => Map::new(),
    })
}

impl super::Database {
    /// Reads one document.
    pub fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        let body: Option<String> = self
            .connection
            .query_row(SELECT_DOCUMENT_SQL, params![collection, id], |row| row.get(0))
            .optional()
            .db_context("Failed to read document")?;

        body.as_deref().map(parse_body).transpose()
    }

    /// Creates the document or overwrites the given top-level fields.
    pub fn merge_document(&mut self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let existing: Option<String> = tx
            .query_row(SELECT_DOCUMENT_SQL, params![collection, id], |row| row.get(0))
            .optional()
            .db_context("Failed to read document")?;

        let mut merged = existing.as_deref().map(parse_body).transpose()?.unwrap_or_default();
        merged.extend(fields);
        let body = serde_json::to_string(&merged)?;

        tx.execute(
            UPSERT_DOCUMENT_SQL,
            params![collection, id, body, Timestamp::now().to_string()],
        )
        .db_context("Failed to write document")?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Lists a collection, most recently written first.
    pub fn list_documents(&self, collection: &str) -> Result<Vec<Document>> {
        let mut stmt = self
            .connection
            .prepare(LIST_DOCUMENTS_SQL)
            .db_context("Failed to prepare query")?;

        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .db_context("Failed to list documents")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to read document row")?;

        rows.into_iter()
            .map(|(id, body)| {
                Ok(Document {
                    id,
                    fields: parse_body(&body)?,
                })
            })
            .collect()
    }

    /// Deletes one document, returning whether it existed.
    pub fn delete_document(&self, collection: &str, id: &str) -> Result<bool> {
        let deleted = self
            .connection
            .execute(DELETE_DOCUMENT_SQL, params![collection, id])
            .db_context("Failed to delete document")?;
        Ok(deleted > 0)
    }
}
