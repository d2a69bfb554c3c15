//! Saved-plan operations for the Session.

use jiff::Timestamp;
use log::{debug, info, warn};
use serde_json::Value;

use super::Session;
use crate::{
    display::{ExportResult, PlanSummaries},
    error::{PlannerError, Result},
    models::{Category, PlanSummary, SavedPlan},
    prompt::build_prompt,
    store::{blocking, Document, Fields, EXPORT_FOLDER, SAVED_PLANS_KEY},
};

impl Session {
    /// Commits the draft as a saved plan.
    ///
    /// The plan keeps the id of the plan being edited, or gets the current
    /// time in milliseconds. It is upserted into the device's saved list
    /// and merged into its category's collection; then both draft copies
    /// are cleared and the id stays on the draft, so further edits update
    /// the same plan.
    ///
    /// # Errors
    ///
    /// Returns `PlannerError::MissingResult` or `PlannerError::MissingCategory`
    /// before any store is touched.
    pub async fn save(&mut self, category: Option<Category>) -> Result<SavedPlan> {
        let id = self
            .draft
            .id
            .clone()
            .unwrap_or_else(|| Timestamp::now().as_millisecond().to_string());
        let mut plan = SavedPlan::from_draft(&self.draft, id, self.user_id(), category)?;

        let model = self.education_model().await;
        plan.education_model_name = model.as_ref().map(|m| m.name.clone());
        plan.user_prompt_text = build_prompt(&plan.form, plan.category, model.as_ref());

        self.upsert_local_plan(&plan).await?;
        let fields = plan_fields(&plan)?;
        let remote = self.stores.remote();
        let (collection, plan_id) = (plan.category.collection(), plan.id.clone());
        blocking(move || remote.merge(collection, &plan_id, fields)).await?;
        info!("Saved plan {} to {}", plan.id, collection);

        if let Some(mirror) = &self.mirror {
            mirror.clear().await;
        }
        self.draft.id = Some(plan.id.clone());
        self.draft.category = Some(plan.category);
        // Consumes the suppression so the next edit mirrors normally.
        self.notify();

        let (local, remote) = tokio::join!(self.stores.remove_local(), self.stores.clear_remote());
        if let Err(e) = local {
            warn!("Failed to clear local draft after saving: {e}");
        }
        if let Err(e) = remote {
            warn!("Failed to clear remote draft after saving: {e}");
        }
        Ok(plan)
    }

    async fn upsert_local_plan(&self, plan: &SavedPlan) -> Result<()> {
        let value = serde_json::to_value(plan)?;
        let plan_id = plan.id.clone();
        let local = self.stores.local();
        blocking(move || {
            let mut plans = parse_local_plans(local.get(SAVED_PLANS_KEY)?.as_deref());
            match plans.iter_mut().find(|p| value_id(p) == Some(plan_id.as_str())) {
                Some(slot) => *slot = value,
                None => plans.push(value),
            }
            local.set(SAVED_PLANS_KEY, &serde_json::to_string(&plans)?)
        })
        .await
    }

    /// Saved plans, newest first.
    ///
    /// Plans come from the category collections; plans only present in the
    /// device's saved list are included as well.
    pub async fn list_plans(&self, category: Option<Category>) -> Result<PlanSummaries> {
        let mut plans = self.all_plans(category).await?;
        plans.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(PlanSummaries(plans.iter().map(PlanSummary::from).collect()))
    }

    async fn all_plans(&self, category: Option<Category>) -> Result<Vec<SavedPlan>> {
        let categories: Vec<Category> = match category {
            Some(category) => vec![category],
            None => Category::ALL.to_vec(),
        };

        let remote = self.stores.remote();
        let wanted = categories.clone();
        let documents = blocking(move || {
            let mut documents = Vec::new();
            for category in wanted {
                documents.extend(remote.list(category.collection())?);
            }
            Ok(documents)
        })
        .await?;

        let mut plans: Vec<SavedPlan> = documents.into_iter().filter_map(plan_from_document).collect();
        for plan in self.local_plans().await? {
            if categories.contains(&plan.category) && !plans.iter().any(|p| p.id == plan.id) {
                plans.push(plan);
            }
        }
        Ok(plans)
    }

    async fn local_plans(&self) -> Result<Vec<SavedPlan>> {
        let local = self.stores.local();
        let body = blocking(move || local.get(SAVED_PLANS_KEY)).await?;
        Ok(parse_local_plans(body.as_deref())
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(plan) => Some(plan),
                Err(e) => {
                    warn!("Skipping unreadable saved plan: {e}");
                    None
                }
            })
            .collect())
    }

    /// Looks a plan up in the category collections, then in the saved list.
    pub async fn get_plan(&self, id: &str) -> Result<SavedPlan> {
        let remote = self.stores.remote();
        let plan_id = id.to_string();
        let found = blocking(move || {
            for category in Category::ALL {
                if let Some(fields) = remote.get(category.collection(), &plan_id)? {
                    return Ok(Some(Document {
                        id: plan_id,
                        fields,
                    }));
                }
            }
            Ok(None)
        })
        .await?;

        if let Some(plan) = found.and_then(plan_from_document) {
            return Ok(plan);
        }
        self.local_plans()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PlannerError::PlanNotFound { id: id.to_string() })
    }

    /// Permanently deletes a plan from every collection and the saved list.
    pub async fn delete_plan(&self, id: &str) -> Result<SavedPlan> {
        let plan = self.get_plan(id).await?;

        let remote = self.stores.remote();
        let plan_id = id.to_string();
        blocking(move || {
            for category in Category::ALL {
                remote.delete(category.collection(), &plan_id)?;
            }
            Ok(())
        })
        .await?;

        let local = self.stores.local();
        let plan_id = id.to_string();
        blocking(move || {
            let Some(body) = local.get(SAVED_PLANS_KEY)? else {
                return Ok(());
            };
            let mut plans = parse_local_plans(Some(&body));
            plans.retain(|p| value_id(p) != Some(plan_id.as_str()));
            local.set(SAVED_PLANS_KEY, &serde_json::to_string(&plans)?)
        })
        .await?;

        info!("Deleted plan {id}");
        Ok(plan)
    }

    /// Opens a saved plan for editing, replacing the current draft.
    pub async fn load_plan(&mut self, id: &str) -> Result<SavedPlan> {
        let plan = self.get_plan(id).await?;
        self.replace_draft(plan.to_draft());
        self.notify();
        debug!("Opened plan {id} for editing");
        Ok(plan)
    }

    /// Renders the plan as Markdown and uploads it to the export folder.
    pub async fn export_plan(&self, id: &str) -> Result<ExportResult> {
        let plan = self.get_plan(id).await?;
        let bytes = plan.to_string().into_bytes();
        let filename = match plan.form.unit.trim() {
            "" => format!("lesson_plan_{}.md", plan.id),
            unit => format!("{unit}_{}.md", plan.id),
        };

        let files = std::sync::Arc::clone(&self.files);
        let url = blocking(move || files.upload(&bytes, &filename, EXPORT_FOLDER)).await?;
        info!("Exported plan {id} to {url}");
        Ok(ExportResult {
            plan_id: plan.id,
            url,
        })
    }
}

fn plan_fields(plan: &SavedPlan) -> Result<Fields> {
    match serde_json::to_value(plan)? {
        Value::Object(fields) => Ok(fields),
        other => Err(PlannerError::Configuration {
            message: format!("saved plan serialized to a non-object: {other}"),
        }),
    }
}

fn plan_from_document(document: Document) -> Option<SavedPlan> {
    let mut fields = document.fields;
    fields
        .entry("id")
        .or_insert_with(|| Value::String(document.id.clone()));
    match serde_json::from_value(Value::Object(fields)) {
        Ok(plan) => Some(plan),
        Err(e) => {
            warn!("Skipping unreadable plan document {}: {e}", document.id);
            None
        }
    }
}

/// The saved list as raw values; anything but a JSON array reads as empty.
fn parse_local_plans(body: Option<&str>) -> Vec<Value> {
    match body.map(serde_json::from_str::<Value>) {
        Some(Ok(Value::Array(plans))) => plans,
        Some(Ok(_)) | Some(Err(_)) => {
            warn!("Ignoring unreadable saved plan list");
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn value_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}
