//! Education-model authoring for the Session.

use jiff::Timestamp;
use log::{info, warn};
use serde_json::Value;

use super::Session;
use crate::{
    error::{PlannerError, Result},
    models::{tidy_model_text, EducationModel, ModelRevision},
    params::SaveEducationModel,
    store::{blocking, Fields, EDUCATION_MODEL_COLLECTION, MODEL_HISTORY_KEY},
};

impl Session {
    /// Education models available for generation, sorted by name.
    pub async fn list_education_models(&self) -> Result<Vec<EducationModel>> {
        let remote = self.stores.remote();
        let documents = blocking(move || remote.list(EDUCATION_MODEL_COLLECTION)).await?;
        let mut models: Vec<EducationModel> = documents
            .into_iter()
            .map(|doc| EducationModel::from_document(doc.id, &Value::Object(doc.fields)))
            .collect();
        models.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(models)
    }

    pub async fn get_education_model(&self, id: &str) -> Result<EducationModel> {
        let remote = self.stores.remote();
        let model_id = id.to_string();
        let fields = blocking(move || remote.get(EDUCATION_MODEL_COLLECTION, &model_id)).await?;
        fields
            .map(|fields| EducationModel::from_document(id, &Value::Object(fields)))
            .ok_or_else(|| PlannerError::ModelNotFound { id: id.to_string() })
    }

    /// Creates a model, or updates the one `params.id` names, and records
    /// the saved state at the head of the model history.
    ///
    /// New models get the current time in milliseconds as their id, moved
    /// forward past any id already taken. Text fields are trimmed and a
    /// comma directly after a full stop is dropped.
    ///
    /// # Errors
    ///
    /// Returns `PlannerError::InvalidInput` for a blank field and
    /// `PlannerError::ModelNotFound` when updating a model that does not
    /// exist; nothing is written in either case.
    pub async fn save_education_model(
        &self,
        params: &SaveEducationModel,
    ) -> Result<EducationModel> {
        params.validate()?;
        let id = match params.id.as_deref() {
            Some(id) => self.get_education_model(id).await?.id,
            None => self.unused_model_id().await?,
        };

        let mut fields = Fields::new();
        fields.insert("name".into(), Value::String(params.name.trim().to_string()));
        for (key, text) in [
            ("philosophy", &params.philosophy),
            ("evaluationFocus", &params.evaluation_focus),
            ("languageFocus", &params.language_focus),
            ("childFocus", &params.child_focus),
        ] {
            fields.insert(key.into(), Value::String(tidy_model_text(text)));
        }
        fields.insert(
            "updatedAt".into(),
            Value::String(Timestamp::now().to_string()),
        );
        if params.id.is_none() {
            fields.insert("ownerUid".into(), Value::String(self.user_id().to_string()));
        }

        let remote = self.stores.remote();
        let model_id = id.clone();
        blocking(move || remote.merge(EDUCATION_MODEL_COLLECTION, &model_id, fields)).await?;
        let model = self.get_education_model(&id).await?;
        info!("Saved education model {id}");

        let revision = ModelRevision::new(&model, params.note.as_deref());
        if let Err(e) = self.record_model_revision(revision).await {
            warn!("Failed to record history of education model {id}: {e}");
        }
        Ok(model)
    }

    /// Permanently deletes a model. Its history is kept.
    pub async fn delete_education_model(&self, id: &str) -> Result<EducationModel> {
        let model = self.get_education_model(id).await?;
        let remote = self.stores.remote();
        let model_id = id.to_string();
        blocking(move || remote.delete(EDUCATION_MODEL_COLLECTION, &model_id)).await?;

        if self.draft.form.education_model_id.as_deref() == Some(id) {
            warn!("The draft still selects deleted education model {id}");
        }
        info!("Deleted education model {id}");
        Ok(model)
    }

    /// Recorded revisions, newest first, optionally of one model only.
    pub async fn education_model_history(&self, id: Option<&str>) -> Result<Vec<ModelRevision>> {
        let local = self.stores.local();
        let body = blocking(move || local.get(MODEL_HISTORY_KEY)).await?;
        let mut revisions = parse_history(body.as_deref());
        if let Some(id) = id {
            revisions.retain(|revision| revision.id == id);
        }
        Ok(revisions)
    }

    async fn unused_model_id(&self) -> Result<String> {
        let remote = self.stores.remote();
        let start = Timestamp::now().as_millisecond();
        blocking(move || {
            let mut candidate = start;
            while remote
                .get(EDUCATION_MODEL_COLLECTION, &candidate.to_string())?
                .is_some()
            {
                candidate += 1;
            }
            Ok(candidate.to_string())
        })
        .await
    }

    async fn record_model_revision(&self, revision: ModelRevision) -> Result<()> {
        let local = self.stores.local();
        blocking(move || {
            let mut revisions = parse_history(local.get(MODEL_HISTORY_KEY)?.as_deref());
            revisions.insert(0, revision);
            local.set(MODEL_HISTORY_KEY, &serde_json::to_string(&revisions)?)
        })
        .await
    }
}

/// The stored history; anything but a list of revisions reads as empty.
fn parse_history(body: Option<&str>) -> Vec<ModelRevision> {
    match body.map(serde_json::from_str::<Vec<ModelRevision>>) {
        Some(Ok(revisions)) => revisions,
        Some(Err(e)) => {
            warn!("Ignoring unreadable education model history: {e}");
            Vec::new()
        }
        None => Vec::new(),
    }
}
