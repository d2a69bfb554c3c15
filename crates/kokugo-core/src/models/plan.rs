//! Committed lesson plans.

use serde::{Deserialize, Serialize};

use super::{Category, CompositionMode, Draft, LessonForm, LessonResult};
use crate::error::{PlannerError, Result};

/// Version tag stored next to the training-data consent flag.
pub const ALLOW_TRAIN_VERSION: &str = "v1";

/// A plan the teacher committed to one of the four category collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlan {
    pub id: String,

    #[serde(default)]
    pub owner_uid: String,

    #[serde(default)]
    pub mode: CompositionMode,

    #[serde(flatten)]
    pub form: LessonForm,

    #[serde(alias = "authorId")]
    pub category: Category,

    #[serde(alias = "authorLabel", default)]
    pub category_label: String,

    #[serde(default)]
    pub education_model_name: Option<String>,

    pub result: LessonResult,

    /// The plan in the 授業案 Markdown layout used for training exports
    #[serde(default)]
    pub assistant_plan_markdown: String,

    /// Prompt text built for the draft at generation time
    #[serde(default)]
    pub user_prompt_text: String,

    pub timestamp: String,

    #[serde(default)]
    pub allow_train: bool,

    #[serde(default)]
    pub allow_train_version: String,
}

impl SavedPlan {
    /// Promotes a draft to a saved plan under the given id.
    ///
    /// The category falls back to the draft's own selection. Fails before
    /// touching anything when the draft has no result or no category.
    pub fn from_draft(
        draft: &Draft,
        id: impl Into<String>,
        owner_uid: impl Into<String>,
        category: Option<Category>,
    ) -> Result<Self> {
        let result = draft.result.clone().ok_or(PlannerError::MissingResult)?;
        let category = category
            .or(draft.category)
            .ok_or(PlannerError::MissingCategory)?;

        Ok(Self {
            id: id.into(),
            owner_uid: owner_uid.into(),
            mode: draft.mode,
            form: draft.form.clone(),
            category,
            category_label: category.label().to_string(),
            education_model_name: None,
            assistant_plan_markdown: crate::display::AssistantPlan(&result).to_string(),
            result,
            user_prompt_text: String::new(),
            timestamp: jiff::Timestamp::now().to_string(),
            allow_train: draft.allow_train,
            allow_train_version: ALLOW_TRAIN_VERSION.to_string(),
        })
    }

    /// Reopens the plan as an editable draft that remembers its id.
    pub fn to_draft(&self) -> Draft {
        Draft {
            id: Some(self.id.clone()),
            mode: self.mode,
            form: self.form.clone(),
            category: Some(self.category),
            result: Some(self.result.clone()),
            timestamp: None,
            allow_train: self.allow_train,
        }
    }
}

/// Lightweight listing entry for a saved plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub id: String,
    pub category: Category,
    pub grade: String,
    pub genre: String,
    pub unit: String,
    pub lesson_count: usize,
    pub timestamp: String,
}

impl From<&SavedPlan> for PlanSummary {
    fn from(plan: &SavedPlan) -> Self {
        Self {
            id: plan.id.clone(),
            category: plan.category,
            grade: plan.form.grade.clone(),
            genre: plan.form.genre.clone(),
            unit: plan.form.unit.clone(),
            lesson_count: plan.form.lesson_count(),
            timestamp: plan.timestamp.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn draft_with_result() -> Draft {
        let mut draft = Draft::default();
        draft.form.unit = "スイミー".to_string();
        draft.form.set_hours("2");
        draft.result = Some(LessonResult::from_form(&draft.form));
        draft
    }

    #[test]
    fn test_from_draft_requires_result() {
        let draft = Draft {
            category: Some(Category::Reading),
            ..Default::default()
        };
        let err = SavedPlan::from_draft(&draft, "1", "u", None).unwrap_err();
        assert!(matches!(err, PlannerError::MissingResult));
    }

    #[test]
    fn test_from_draft_requires_category() {
        let err = SavedPlan::from_draft(&draft_with_result(), "1", "u", None).unwrap_err();
        assert!(matches!(err, PlannerError::MissingCategory));
    }

    #[test]
    fn test_from_draft_fills_metadata() {
        let plan =
            SavedPlan::from_draft(&draft_with_result(), "42", "teacher", Some(Category::Writing))
                .unwrap();
        assert_eq!(plan.category_label, "作文");
        assert_eq!(plan.allow_train_version, "v1");
        assert!(plan.assistant_plan_markdown.starts_with("## 授業案"));

        let summary = PlanSummary::from(&plan);
        assert_eq!(summary.unit, "スイミー");
        assert_eq!(summary.lesson_count, 2);

        let reopened = plan.to_draft();
        assert_eq!(reopened.id.as_deref(), Some("42"));
        assert_eq!(reopened.category, Some(Category::Writing));
    }

    #[test]
    fn test_saved_plan_reads_legacy_author_keys() {
        let plan: SavedPlan = serde_json::from_value(json!({
            "id": "1700000000000",
            "authorId": "discussion-model-id",
            "authorLabel": "話し合い",
            "unit": "話し合おう",
            "result": { "授業時間数": 1, "授業の流れ": { "1時間目": "話す" } },
            "timestamp": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(plan.category, Category::Discussion);
        assert_eq!(plan.category_label, "話し合い");
        assert_eq!(plan.result.flow, vec!["話す"]);
    }
}
