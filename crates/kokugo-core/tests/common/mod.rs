use std::{
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use kokugo_core::{
    completion::CompletionClient,
    store::{
        Document, DocumentStore, DraftStores, Fields, KeyValueStore, MemoryDocumentStore,
        MemoryKeyValueStore,
    },
    PlannerError, Result, Session, SessionBuilder,
};
use serde_json::Value;
use tempfile::TempDir;

/// Debounce used by tests that wait on real time.
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(20);

/// Completion client that fails every request, for tests that must not
/// reach the network.
pub struct OfflineClient;

#[async_trait]
impl CompletionClient for OfflineClient {
    async fn complete(&self, _prompt: &str) -> Result<Value> {
        Err(PlannerError::generation("offline"))
    }
}

/// Builds a session on SQLite stores inside `dir`.
pub async fn session_in(dir: &Path, user: &str) -> Session {
    SessionBuilder::new()
        .with_data_dir(Some(dir))
        .with_user_id(user)
        .with_debounce(TEST_DEBOUNCE)
        .with_completion_client(Arc::new(OfflineClient))
        .build()
        .await
        .expect("Failed to create session")
}

/// Helper function to create a test session in a fresh directory
pub async fn create_test_session() -> (TempDir, Session) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let session = session_in(temp_dir.path(), "teacher-1").await;
    (temp_dir, session)
}

/// Direct access to the draft stores of a session's data directory.
pub async fn stores_in(dir: &Path, user: &str) -> DraftStores {
    session_in(dir, user).await.stores().clone()
}

/// Builds a session over the given stores, keeping files in `dir`.
pub async fn session_with_stores(
    dir: &Path,
    local: Arc<dyn KeyValueStore>,
    remote: Arc<dyn DocumentStore>,
    debounce: Duration,
) -> Session {
    SessionBuilder::new()
        .with_data_dir(Some(dir))
        .with_user_id("teacher-1")
        .with_debounce(debounce)
        .with_local_store(local)
        .with_remote_store(remote)
        .with_completion_client(Arc::new(OfflineClient))
        .build()
        .await
        .expect("Failed to create session")
}

/// Key-value store whose writes take `delay` to land.
pub struct SlowKeyValueStore {
    inner: MemoryKeyValueStore,
    delay: Duration,
}

impl SlowKeyValueStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryKeyValueStore::new(),
            delay,
        }
    }
}

impl KeyValueStore for SlowKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::thread::sleep(self.delay);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

/// Key-value store counting its writes.
#[derive(Default)]
pub struct CountingKeyValueStore {
    inner: MemoryKeyValueStore,
    sets: AtomicUsize,
}

impl CountingKeyValueStore {
    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for CountingKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

/// Document store counting its merges.
#[derive(Default)]
pub struct CountingDocumentStore {
    inner: MemoryDocumentStore,
    merges: AtomicUsize,
}

impl CountingDocumentStore {
    pub fn merges(&self) -> usize {
        self.merges.load(Ordering::SeqCst)
    }
}

impl DocumentStore for CountingDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        self.inner.get(collection, id)
    }

    fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        self.merges.fetch_add(1, Ordering::SeqCst);
        self.inner.merge(collection, id, fields)
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>> {
        self.inner.list(collection)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        self.inner.delete(collection, id)
    }
}
