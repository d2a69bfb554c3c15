//! Turning the form into a structured lesson plan.
//!
//! Generation is split in three so the network call does not need the
//! session: [`Session::begin_generation`] validates and snapshots the form,
//! [`PendingGeneration::run`] produces the result, and
//! [`Session::apply_generation`] applies it unless the draft was cleared or
//! replaced in the meantime. [`Session::generate`] chains the three.

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;

use super::Session;
use crate::{
    completion::CompletionClient,
    error::{PlannerError, Result},
    models::{CompositionMode, EducationModel, LessonForm, LessonResult},
    prompt::build_prompt,
    store::{blocking, EDUCATION_MODEL_COLLECTION},
};

/// What became of a generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// The result was applied to the draft
    Applied(LessonResult),
    /// The draft was cleared or replaced while the result was produced
    Discarded,
}

/// A snapshot of the form ready to be turned into a result.
pub struct PendingGeneration {
    epoch: u64,
    mode: CompositionMode,
    form: LessonForm,
    prompt: String,
    client: Arc<dyn CompletionClient>,
}

impl PendingGeneration {
    /// The prompt built for the snapshot, sent only in AI mode.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn mode(&self) -> CompositionMode {
        self.mode
    }

    /// Produces the result without touching the session.
    pub async fn run(&self) -> Result<LessonResult> {
        match self.mode {
            CompositionMode::Manual => Ok(LessonResult::from_form(&self.form)),
            CompositionMode::Ai => {
                let body = self.client.complete(&self.prompt).await?;
                if !body.is_object() {
                    return Err(PlannerError::generation(format!(
                        "expected a JSON object, got: {body}"
                    )));
                }
                LessonResult::from_value(body)
            }
        }
    }
}

impl Session {
    /// The prompt for the current form.
    ///
    /// Fails with `MissingCategory` when no category is selected, since the
    /// category's requirements are part of the prompt.
    pub async fn prompt(&self) -> Result<String> {
        let category = self.draft.category.ok_or(PlannerError::MissingCategory)?;
        let model = self.education_model().await;
        let mut form = self.draft.form.clone();
        form.sync_lesson_list();
        Ok(build_prompt(&form, category, model.as_ref()))
    }

    /// Validates the draft and snapshots it for generation.
    ///
    /// A missing category is rejected before anything else happens. The
    /// per-lesson list is sized to the lesson count first, and that change
    /// is mirrored like any edit.
    pub async fn begin_generation(&mut self) -> Result<PendingGeneration> {
        let category = self.draft.category.ok_or(PlannerError::MissingCategory)?;

        self.edit(LessonForm::sync_lesson_list);
        let model = self.education_model().await;
        let prompt = build_prompt(&self.draft.form, category, model.as_ref());
        debug!(
            "Starting {} generation for {} lessons",
            self.draft.mode,
            self.draft.form.lesson_count()
        );

        Ok(PendingGeneration {
            epoch: self.epoch,
            mode: self.draft.mode,
            form: self.draft.form.clone(),
            prompt,
            client: Arc::clone(&self.client),
        })
    }

    /// Applies a finished result unless the draft changed identity since
    /// [`begin_generation`](Self::begin_generation).
    pub fn apply_generation(
        &mut self,
        pending: &PendingGeneration,
        result: LessonResult,
    ) -> GenerateOutcome {
        if pending.epoch != self.epoch {
            info!("Discarding generated plan: the draft was cleared or replaced");
            return GenerateOutcome::Discarded;
        }
        self.draft.form.apply_result(&result);
        self.draft.result = Some(result.clone());
        self.notify();
        GenerateOutcome::Applied(result)
    }

    /// Generates the structured plan for the current draft and applies it.
    pub async fn generate(&mut self) -> Result<GenerateOutcome> {
        let pending = self.begin_generation().await?;
        let result = pending.run().await?;
        Ok(self.apply_generation(&pending, result))
    }

    /// The education model selected on the form, if it can be read.
    pub(super) async fn education_model(&self) -> Option<EducationModel> {
        let id = self.draft.form.education_model_id.clone()?;
        let remote = self.stores.remote();
        let lookup_id = id.clone();
        match blocking(move || remote.get(EDUCATION_MODEL_COLLECTION, &lookup_id)).await {
            Ok(Some(fields)) => Some(EducationModel::from_document(id, &Value::Object(fields))),
            Ok(None) => {
                warn!("Education model {id} not found; generating without it");
                None
            }
            Err(e) => {
                warn!("Failed to read education model {id}: {e}");
                None
            }
        }
    }
}
