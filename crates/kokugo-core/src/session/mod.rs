//! The editing session: one teacher's draft, its stores and its collaborators.
//!
//! A [`Session`] owns the current [`Draft`] and every collaborator it talks
//! to: the local key-value store, the remote document store, file storage for
//! exports and the completion client. All of them are injected through
//! [`SessionBuilder`]; nothing is global.
//!
//! ```text
//! restore() ──▶ choose_draft(local, remote) ──▶ write back ──▶ start mirroring
//!                                                                 │
//! edit / set_* / generate ──▶ mutate draft ──▶ notify ───────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: configuration and store wiring
//! - `generate`: prompt building and structured-result generation
//! - `plans`: saving, listing, opening, deleting and exporting plans
//! - `education`: authoring education models and their history
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use kokugo_core::{
//!     models::{Category, DraftField},
//!     store::{MemoryDocumentStore, MemoryKeyValueStore},
//!     GenerateOutcome, SessionBuilder,
//! };
//!
//! # async fn example() -> kokugo_core::Result<()> {
//! let mut session = SessionBuilder::new()
//!     .with_local_store(Arc::new(MemoryKeyValueStore::new()))
//!     .with_remote_store(Arc::new(MemoryDocumentStore::new()))
//!     .build()
//!     .await?;
//! session.restore().await;
//!
//! session.set_field(DraftField::Unit, "スイミー");
//! session.set_hours("2");
//! session.set_category(Some(Category::Reading));
//! if let GenerateOutcome::Applied(result) = session.generate().await? {
//!     assert_eq!(result.hours, 2);
//! }
//! let plan = session.save(None).await?;
//! assert_eq!(plan.form.unit, "スイミー");
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Duration};

use log::{debug, info, warn};

use crate::{
    completion::CompletionClient,
    error::Result,
    mirror::MirrorScheduler,
    models::{Category, CompositionMode, Draft, DraftField, LessonForm, Viewpoint},
    reconcile::choose_draft,
    store::{DraftStores, FileStorage},
};

pub mod builder;
mod education;
mod generate;
mod plans;

pub use builder::SessionBuilder;
pub use generate::{GenerateOutcome, PendingGeneration};

/// Which copy a restore loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Neither copy had a valid timestamp; the session starts empty
    Empty,
    Local,
    Remote,
}

/// An editing session for one user.
pub struct Session {
    stores: DraftStores,
    files: Arc<dyn FileStorage>,
    client: Arc<dyn CompletionClient>,
    debounce: Duration,
    draft: Draft,
    /// Bumped whenever the draft is replaced wholesale
    epoch: u64,
    mirror: Option<MirrorScheduler>,
}

impl Session {
    fn new(
        stores: DraftStores,
        files: Arc<dyn FileStorage>,
        client: Arc<dyn CompletionClient>,
        debounce: Duration,
    ) -> Self {
        Self {
            stores,
            files,
            client,
            debounce,
            draft: Draft::default(),
            epoch: 0,
            mirror: None,
        }
    }

    /// The current editing state.
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn user_id(&self) -> &str {
        self.stores.user_id()
    }

    pub fn stores(&self) -> &DraftStores {
        &self.stores
    }

    /// Loads the newer of the local and remote drafts and starts mirroring.
    ///
    /// A local draft that does not parse is discarded and its key removed. A
    /// failed remote read counts as no remote draft. The chosen snapshot is
    /// written back to both stores unchanged so they agree again. None of
    /// these problems fail the restore; they are logged instead.
    pub async fn restore(&mut self) -> RestoreOutcome {
        let local = self.read_local_draft().await;
        let remote = match self.stores.read_remote().await {
            Ok(remote) => remote,
            Err(e) => {
                warn!("Failed to read remote draft, continuing without it: {e}");
                None
            }
        };

        let remote_copy = remote.clone();
        let outcome = match choose_draft(local, remote) {
            None => RestoreOutcome::Empty,
            Some(chosen) => {
                let outcome = if remote_copy.as_ref() == Some(&chosen) {
                    RestoreOutcome::Remote
                } else {
                    RestoreOutcome::Local
                };
                self.write_back(&chosen).await;
                self.replace_draft(chosen);
                outcome
            }
        };
        info!("Restored draft: {outcome:?}");

        self.mirror = Some(MirrorScheduler::spawn(self.stores.clone(), self.debounce));
        outcome
    }

    async fn read_local_draft(&self) -> Option<Draft> {
        let body = match self.stores.read_local().await {
            Ok(body) => body?,
            Err(e) => {
                warn!("Failed to read local draft: {e}");
                return None;
            }
        };
        match Draft::from_json(&body) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!("Discarding unreadable local draft: {e}");
                if let Err(e) = self.stores.remove_local().await {
                    warn!("Failed to remove unreadable local draft: {e}");
                }
                None
            }
        }
    }

    async fn write_back(&self, draft: &Draft) {
        let (local, remote) = tokio::join!(
            self.stores.write_local(draft),
            self.stores.write_remote(draft)
        );
        if let Err(e) = local {
            warn!("Failed to write restored draft to local store: {e}");
        }
        if let Err(e) = remote {
            warn!("Failed to write restored draft to remote store: {e}");
        }
    }

    /// Swaps in a new draft; results still in flight for the old one are
    /// dropped when they arrive.
    fn replace_draft(&mut self, draft: Draft) {
        self.draft = draft;
        self.epoch += 1;
    }

    fn notify(&self) {
        if let Some(mirror) = &self.mirror {
            mirror.notify(&self.draft);
        }
    }

    /// Applies an arbitrary change to the form.
    pub fn edit<F>(&mut self, change: F)
    where
        F: FnOnce(&mut LessonForm),
    {
        change(&mut self.draft.form);
        self.notify();
    }

    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        debug!("Setting draft field {field}");
        self.edit(|form| form.set_text(field, value));
    }

    /// Sets the lesson-count text; the per-lesson list follows it.
    pub fn set_hours(&mut self, text: impl Into<String>) {
        self.edit(|form| form.set_hours(text));
    }

    /// Writes the text of one lesson (0-based).
    pub fn set_lesson(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        self.draft.form.set_lesson(index, text)?;
        self.notify();
        Ok(())
    }

    pub fn add_evaluation_point(&mut self, viewpoint: Viewpoint) {
        self.edit(|form| form.evaluation_points.add_point(viewpoint));
    }

    /// Removes a criterion (0-based) and returns its text.
    pub fn remove_evaluation_point(&mut self, viewpoint: Viewpoint, index: usize) -> Result<String> {
        let removed = self
            .draft
            .form
            .evaluation_points
            .remove_point(viewpoint, index)?;
        self.notify();
        Ok(removed)
    }

    /// Replaces a criterion (0-based).
    pub fn set_evaluation_point(
        &mut self,
        viewpoint: Viewpoint,
        index: usize,
        text: impl Into<String>,
    ) -> Result<()> {
        self.draft
            .form
            .evaluation_points
            .set_point(viewpoint, index, text)?;
        self.notify();
        Ok(())
    }

    pub fn set_mode(&mut self, mode: CompositionMode) {
        self.draft.mode = mode;
        self.notify();
    }

    pub fn set_category(&mut self, category: Option<Category>) {
        self.draft.category = category;
        self.notify();
    }

    /// Records consent to use the plan as training data.
    pub fn set_allow_train(&mut self, allow: bool) {
        self.draft.allow_train = allow;
        self.notify();
    }

    /// Deletes both draft copies and resets the form.
    ///
    /// The pending mirror write is cancelled, a write already under way
    /// finishes before anything is deleted, and the change caused by the
    /// reset is not mirrored, so the cleared stores stay cleared. The
    /// composition mode survives the reset. Both deletions are attempted;
    /// the first failure is returned.
    pub async fn clear(&mut self) -> Result<()> {
        if let Some(mirror) = &self.mirror {
            mirror.clear().await;
        }
        let mode = self.draft.mode;
        self.replace_draft(Draft {
            mode,
            ..Draft::default()
        });
        self.notify();

        let (local, remote) = tokio::join!(self.stores.remove_local(), self.stores.clear_remote());
        local?;
        remote?;
        info!("Cleared draft for {}", self.user_id());
        Ok(())
    }

    /// Waits for a pending mirror write, if any.
    pub async fn settle(&self) {
        if let Some(mirror) = &self.mirror {
            mirror.settle().await;
        }
    }
}
