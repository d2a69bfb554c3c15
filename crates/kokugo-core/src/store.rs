//! Storage collaborators: a local key-value store, a remote document store
//! and a file store.
//!
//! The traits are synchronous; async callers run them through
//! [`blocking`], which moves the call onto tokio's blocking pool the same
//! way every database call in this crate is made. Each trait ships with a
//! SQLite- or filesystem-backed implementation, and the key-value and
//! document stores also have in-memory versions for tests and embedding.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use log::{debug, warn};
use serde_json::{Map, Value};
use tokio::task;

use crate::{
    db::Database,
    error::{IoResultExt, PlannerError, Result},
    models::Draft,
};

/// Local key holding the auto-saved draft.
pub const LOCAL_DRAFT_KEY: &str = "edit_lesson_plan";
/// Local key holding the JSON array of saved plans.
pub const SAVED_PLANS_KEY: &str = "lesson_plans";
/// Remote collection of per-user drafts, keyed by user id.
pub const DRAFT_COLLECTION: &str = "lesson_plan_drafts";
/// Remote collection of education models.
pub const EDUCATION_MODEL_COLLECTION: &str = "educationModels";
/// Local key of the education-model history, newest first.
pub const MODEL_HISTORY_KEY: &str = "educationModelsHistory";
/// Storage folder for exported plans.
pub const EXPORT_FOLDER: &str = "lessons";

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

/// A document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// String key-value storage scoped to one device.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Collection/document storage shared across devices.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>>;

    /// Creates the document or overwrites only the given top-level fields.
    fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Deletes a document, returning whether it existed.
    fn delete(&self, collection: &str, id: &str) -> Result<bool>;
}

/// Binary file upload returning a retrievable URL.
pub trait FileStorage: Send + Sync {
    fn upload(&self, bytes: &[u8], filename: &str, folder: &str) -> Result<String>;
}

/// Runs a synchronous store call on the blocking pool.
pub async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f).await.map_err(PlannerError::join)?
}

/// Key-value store persisted in a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    db_path: PathBuf,
}

impl SqliteKeyValueStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Database::new(&self.db_path)?.get_value(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Database::new(&self.db_path)?.set_value(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        Database::new(&self.db_path)?.remove_value(key)
    }
}

/// Document store persisted in a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    db_path: PathBuf,
}

impl SqliteDocumentStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        Database::new(&self.db_path)?.get_document(collection, id)
    }

    fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        Database::new(&self.db_path)?.merge_document(collection, id, fields)
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>> {
        Database::new(&self.db_path)?.list_documents(collection)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        Database::new(&self.db_path)?.delete_document(collection, id)
    }
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<(String, String), Fields>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        let documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        documents
            .entry((collection.to_string(), id.to_string()))
            .or_default()
            .extend(fields);
        Ok(())
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(documents
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|((_, id), fields)| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(documents
            .remove(&(collection.to_string(), id.to_string()))
            .is_some())
    }
}

/// File storage writing below a root directory and returning `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Keeps a user-supplied name inside its folder.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "untitled".to_string(),
        _ => cleaned,
    }
}

impl FileStorage for LocalFileStorage {
    fn upload(&self, bytes: &[u8], filename: &str, folder: &str) -> Result<String> {
        let dir = self.root.join(sanitize_file_name(folder));
        std::fs::create_dir_all(&dir).fs_context(&dir)?;

        let path = dir.join(sanitize_file_name(filename));
        std::fs::write(&path, bytes).fs_context(&path)?;

        let path = path.canonicalize().fs_context(&path)?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(format!("file://{}", path.display()))
    }
}

/// The two copies of the current user's draft.
///
/// The local copy is the serialized draft under [`LOCAL_DRAFT_KEY`]; the
/// remote copy is the `payload` field of the user's document in
/// [`DRAFT_COLLECTION`], which holds `null` after a clear.
#[derive(Clone)]
pub struct DraftStores {
    local: Arc<dyn KeyValueStore>,
    remote: Arc<dyn DocumentStore>,
    user_id: String,
}

impl DraftStores {
    pub fn new(
        local: Arc<dyn KeyValueStore>,
        remote: Arc<dyn DocumentStore>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            local,
            remote,
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn local(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.local)
    }

    pub fn remote(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.remote)
    }

    /// Raw body of the local draft.
    pub async fn read_local(&self) -> Result<Option<String>> {
        let local = self.local();
        blocking(move || local.get(LOCAL_DRAFT_KEY)).await
    }

    pub async fn write_local(&self, draft: &Draft) -> Result<()> {
        let body = draft.to_json()?;
        let local = self.local();
        blocking(move || local.set(LOCAL_DRAFT_KEY, &body)).await
    }

    pub async fn remove_local(&self) -> Result<()> {
        let local = self.local();
        blocking(move || local.remove(LOCAL_DRAFT_KEY)).await
    }

    /// The remote draft, or `None` when absent or cleared.
    pub async fn read_remote(&self) -> Result<Option<Draft>> {
        let remote = self.remote();
        let user_id = self.user_id.clone();
        let document = blocking(move || remote.get(DRAFT_COLLECTION, &user_id)).await?;

        match document.and_then(|mut fields| fields.remove("payload")) {
            Some(payload @ Value::Object(_)) => Ok(Some(serde_json::from_value(payload)?)),
            Some(Value::Null) | None => Ok(None),
            Some(other) => {
                warn!("Ignoring remote draft payload of unexpected shape: {other}");
                Ok(None)
            }
        }
    }

    pub async fn write_remote(&self, draft: &Draft) -> Result<()> {
        let payload = serde_json::to_value(draft)?;
        self.merge_remote(payload).await
    }

    /// Marks the remote draft as cleared.
    pub async fn clear_remote(&self) -> Result<()> {
        self.merge_remote(Value::Null).await
    }

    async fn merge_remote(&self, payload: Value) -> Result<()> {
        let mut fields = Fields::new();
        fields.insert("ownerUid".into(), Value::String(self.user_id.clone()));
        fields.insert("payload".into(), payload);
        fields.insert(
            "updatedAt".into(),
            Value::String(jiff::Timestamp::now().to_string()),
        );

        let remote = self.remote();
        let user_id = self.user_id.clone();
        blocking(move || remote.merge(DRAFT_COLLECTION, &user_id, fields)).await
    }
}
