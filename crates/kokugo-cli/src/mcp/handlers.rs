//! MCP tool handlers implementation

use std::sync::Arc;

use kokugo_core::{
    display::{AssistantPlan, OperationStatus},
    models::{Category, CompositionMode},
    params as core, GenerateOutcome, Session,
};
use log::debug;
use rmcp::{
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    ErrorData,
};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::to_mcp_error;

/// Generic MCP wrapper for core parameter types with serde integration
///
/// Deserialization and the JSON schema pass straight through to the wrapped
/// core type, which stays free of MCP concerns.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct McpParams<T>(T)
where
    T: JsonSchema;

impl<T> JsonSchema for McpParams<T>
where
    T: JsonSchema,
{
    fn schema_name() -> std::borrow::Cow<'static, str> {
        T::schema_name()
    }

    fn json_schema(g: &mut schemars::SchemaGenerator) -> schemars::Schema {
        T::json_schema(g)
    }
}

impl<T> AsRef<T> for McpParams<T>
where
    T: JsonSchema,
{
    fn as_ref(&self) -> &T {
        &self.0
    }
}

pub type PlanId = McpParams<core::PlanId>;
pub type UpdateDraft = McpParams<core::UpdateDraft>;
pub type SetLessonCount = McpParams<core::SetLessonCount>;
pub type SetLesson = McpParams<core::SetLesson>;
pub type SavePlan = McpParams<core::SavePlan>;
pub type ListPlans = McpParams<core::ListPlans>;

pub type McpResult = Result<CallToolResult, ErrorData>;

/// Handler implementations for the MCP server
pub struct McpHandlers {
    session: Arc<Mutex<Session>>,
}

impl McpHandlers {
    pub fn new(session: Arc<Mutex<Session>>) -> Self {
        Self { session }
    }

    pub async fn show_draft(&self) -> McpResult {
        let session = self.session.lock().await;
        Ok(text(session.draft().to_string()))
    }

    /// Sets a form field; `category` and `mode` are accepted as well.
    pub async fn update_draft(&self, Parameters(params): Parameters<UpdateDraft>) -> McpResult {
        debug!("update_draft: {:?}", params);
        let params = params.as_ref();
        let mut session = self.session.lock().await;

        let message = match params.field.as_str() {
            "category" => {
                let category = match params.value.trim() {
                    "" | "none" => None,
                    value => Some(value.parse::<Category>().map_err(|reason| {
                        ErrorData::invalid_params(format!("Invalid category: {reason}"), None)
                    })?),
                };
                session.set_category(category);
                match category {
                    Some(category) => format!("Category set to {category}"),
                    None => "Category unset".to_string(),
                }
            }
            "mode" => {
                let mode = params.value.parse::<CompositionMode>().map_err(|reason| {
                    ErrorData::invalid_params(format!("Invalid mode: {reason}"), None)
                })?;
                session.set_mode(mode);
                format!("Composition mode set to {mode}")
            }
            _ => {
                let field = params
                    .field()
                    .map_err(|e| to_mcp_error("Failed to update draft", &e))?;
                session.set_field(field, params.value.clone());
                format!("Set {field}")
            }
        };
        Ok(text(OperationStatus::success(message).to_string()))
    }

    pub async fn set_lesson_count(
        &self,
        Parameters(params): Parameters<SetLessonCount>,
    ) -> McpResult {
        debug!("set_lesson_count: {:?}", params);
        let mut session = self.session.lock().await;
        session.set_hours(params.as_ref().hours.clone());
        let count = session.draft().form.lesson_count();
        Ok(text(
            OperationStatus::success(format!("Lesson count set to {count}")).to_string(),
        ))
    }

    /// Writes the text of one lesson of the flow.
    pub async fn set_lesson(&self, Parameters(params): Parameters<SetLesson>) -> McpResult {
        debug!("set_lesson: {:?}", params);
        let params = params.as_ref();
        let index = params
            .index()
            .map_err(|e| to_mcp_error("Failed to set lesson", &e))?;
        self.session
            .lock()
            .await
            .set_lesson(index, params.text.clone())
            .map_err(|e| to_mcp_error("Failed to set lesson", &e))?;
        Ok(text(
            OperationStatus::success(format!("Updated lesson {}", params.lesson)).to_string(),
        ))
    }

    pub async fn clear_draft(&self) -> McpResult {
        self.session
            .lock()
            .await
            .clear()
            .await
            .map_err(|e| to_mcp_error("Failed to clear draft", &e))?;
        Ok(text(
            OperationStatus::success("Draft cleared".to_string()).to_string(),
        ))
    }

    /// Generates without holding the session lock during the completion
    /// call, so a concurrent clear discards the result.
    pub async fn generate_plan(&self) -> McpResult {
        let pending = self
            .session
            .lock()
            .await
            .begin_generation()
            .await
            .map_err(|e| to_mcp_error("Failed to generate plan", &e))?;

        let result = pending
            .run()
            .await
            .map_err(|e| to_mcp_error("Failed to generate plan", &e))?;

        match self.session.lock().await.apply_generation(&pending, result) {
            GenerateOutcome::Applied(result) => Ok(text(AssistantPlan(&result).to_string())),
            GenerateOutcome::Discarded => Ok(text(
                OperationStatus::failure(
                    "The draft was cleared or replaced during generation; the result was discarded"
                        .to_string(),
                )
                .to_string(),
            )),
        }
    }

    pub async fn save_plan(&self, Parameters(params): Parameters<SavePlan>) -> McpResult {
        debug!("save_plan: {:?}", params);
        let category = params
            .as_ref()
            .category()
            .map_err(|e| to_mcp_error("Failed to save plan", &e))?;
        let plan = self
            .session
            .lock()
            .await
            .save(category)
            .await
            .map_err(|e| to_mcp_error("Failed to save plan", &e))?;
        Ok(text(
            OperationStatus::success(format!(
                "Saved plan '{}' (ID: {}) under {}",
                plan.form.unit, plan.id, plan.category
            ))
            .to_string(),
        ))
    }

    pub async fn list_plans(&self, Parameters(params): Parameters<ListPlans>) -> McpResult {
        debug!("list_plans: {:?}", params);
        let category = params
            .as_ref()
            .category()
            .map_err(|e| to_mcp_error("Failed to list plans", &e))?;
        let plans = self
            .session
            .lock()
            .await
            .list_plans(category)
            .await
            .map_err(|e| to_mcp_error("Failed to list plans", &e))?;

        let title = match category {
            Some(category) => format!("Saved Plans ({category})"),
            None => "Saved Plans".to_string(),
        };
        Ok(text(format!("# {title}\n\n{plans}")))
    }

    pub async fn show_plan(&self, Parameters(params): Parameters<PlanId>) -> McpResult {
        debug!("show_plan: {:?}", params);
        let plan = self
            .session
            .lock()
            .await
            .get_plan(&params.as_ref().id)
            .await
            .map_err(|e| to_mcp_error("Failed to get plan", &e))?;
        Ok(text(plan.to_string()))
    }
}

fn text(body: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(body)])
}
