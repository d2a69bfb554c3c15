//! Builder for creating and configuring Session instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use log::debug;

use super::Session;
use crate::{
    completion::{CompletionClient, HttpCompletionClient, DEFAULT_ENDPOINT},
    db::Database,
    error::{IoResultExt, PlannerError, Result},
    mirror::DEFAULT_DEBOUNCE,
    store::{
        blocking, DocumentStore, DraftStores, FileStorage, KeyValueStore, LocalFileStorage,
        SqliteDocumentStore, SqliteKeyValueStore,
    },
};

/// File name of the device-local key-value database.
pub const LOCAL_DB_FILE: &str = "local.db";
/// File name of the document database standing in for the shared store.
pub const REMOTE_DB_FILE: &str = "remote.db";
/// User id used when none is configured.
pub const DEFAULT_USER_ID: &str = "local";

/// Builder for creating and configuring Session instances.
///
/// Stores and clients that are not injected are created under the data
/// directory: `local.db`, `remote.db` and an export folder for files.
pub struct SessionBuilder {
    data_dir: Option<PathBuf>,
    user_id: String,
    endpoint: Option<String>,
    debounce: Duration,
    local: Option<Arc<dyn KeyValueStore>>,
    remote: Option<Arc<dyn DocumentStore>>,
    files: Option<Arc<dyn FileStorage>>,
    client: Option<Arc<dyn CompletionClient>>,
}

impl SessionBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            data_dir: None,
            user_id: DEFAULT_USER_ID.to_string(),
            endpoint: None,
            debounce: DEFAULT_DEBOUNCE,
            local: None,
            remote: None,
            files: None,
            client: None,
        }
    }

    /// Sets a custom data directory.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/kokugo/` or `~/.local/share/kokugo/`
    pub fn with_data_dir<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.data_dir = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Sets the id the remote draft is stored under.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Sets the completion endpoint used by the default HTTP client.
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        if endpoint.is_some() {
            self.endpoint = endpoint;
        }
        self
    }

    /// Sets the quiescence delay before edits are mirrored.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    pub fn with_local_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.local = Some(store);
        self
    }

    pub fn with_remote_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.remote = Some(store);
        self
    }

    pub fn with_file_storage(mut self, files: Arc<dyn FileStorage>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_completion_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the configured session.
    ///
    /// The session starts with an empty draft and no mirroring; call
    /// [`Session::restore`] to load the stored draft.
    ///
    /// # Errors
    ///
    /// Returns `PlannerError::XdgDirectory` if no data directory can be found
    /// Returns `PlannerError::FileSystem` if the data directory cannot be created
    /// Returns `PlannerError::Database` if database initialization fails
    pub async fn build(self) -> Result<Session> {
        let needs_data_dir = self.local.is_none() || self.remote.is_none() || self.files.is_none();
        let data_dir = match (self.data_dir, needs_data_dir) {
            (Some(dir), _) => Some(dir),
            (None, true) => Some(Self::default_data_dir()?),
            (None, false) => None,
        };

        if let Some(dir) = &data_dir {
            std::fs::create_dir_all(dir).fs_context(dir)?;
            debug!("Using data directory {}", dir.display());
        }

        let local: Arc<dyn KeyValueStore> = match self.local {
            Some(store) => store,
            None => {
                let path = Self::initialized_db(data_dir.as_deref(), LOCAL_DB_FILE).await?;
                Arc::new(SqliteKeyValueStore::new(path))
            }
        };
        let remote: Arc<dyn DocumentStore> = match self.remote {
            Some(store) => store,
            None => {
                let path = Self::initialized_db(data_dir.as_deref(), REMOTE_DB_FILE).await?;
                Arc::new(SqliteDocumentStore::new(path))
            }
        };
        let files: Arc<dyn FileStorage> = match (self.files, &data_dir) {
            (Some(files), _) => files,
            (None, Some(dir)) => Arc::new(LocalFileStorage::new(dir.clone())),
            (None, None) => {
                return Err(PlannerError::Configuration {
                    message: "no file storage configured".to_string(),
                })
            }
        };
        let client: Arc<dyn CompletionClient> = match self.client {
            Some(client) => client,
            None => {
                let endpoint = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
                Arc::new(HttpCompletionClient::new(endpoint))
            }
        };

        let stores = DraftStores::new(local, remote, self.user_id);
        Ok(Session::new(stores, files, client, self.debounce))
    }

    /// Opens the database once so schema errors surface at build time.
    async fn initialized_db(data_dir: Option<&Path>, file: &str) -> Result<PathBuf> {
        let dir = data_dir.ok_or_else(|| PlannerError::Configuration {
            message: format!("no data directory for {file}"),
        })?;
        let path = dir.join(file);
        let db_path = path.clone();
        blocking(move || Database::new(&db_path).map(drop)).await?;
        Ok(path)
    }

    /// Returns the default data directory following XDG Base Directory
    /// specification.
    fn default_data_dir() -> Result<PathBuf> {
        let marker = xdg::BaseDirectories::with_prefix("kokugo")
            .place_data_file(LOCAL_DB_FILE)
            .map_err(|e| PlannerError::XdgDirectory(e.to_string()))?;
        marker
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| PlannerError::XdgDirectory("data directory has no parent".to_string()))
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
