//! Parameter structures shared by the CLI and the MCP server.
//!
//! The structs carry raw, interface-level values (strings and 1-based
//! positions) and convert them to domain types in one place, so both
//! frontends report the same validation errors. Interface layers wrap them
//! with their own derives: clap `Args` in the CLI, and the optional
//! `schema` feature adds `schemars::JsonSchema` for MCP tool schemas.
//!
//! ```rust
//! use kokugo_core::{models::DraftField, params::UpdateDraft};
//!
//! let params = UpdateDraft {
//!     field: "unit_goal".to_string(),
//!     value: "登場人物の気持ちを想像する".to_string(),
//! };
//! assert_eq!(params.field().unwrap(), DraftField::UnitGoal);
//! ```

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{PlannerError, Result},
    models::{Category, DraftField, Viewpoint},
};

/// Parameters for operations addressing a saved plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct PlanId {
    /// The ID of the saved plan
    pub id: String,
}

/// Parameters for setting one free-text field of the draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct UpdateDraft {
    /// Field name, e.g. 'unit', 'unit-goal', 'child-vision', 'story-main'
    pub field: String,
    /// New value of the field
    pub value: String,
}

impl UpdateDraft {
    pub fn field(&self) -> Result<DraftField> {
        self.field.parse().map_err(|reason: String| {
            PlannerError::invalid_input("field").with_reason(format!(
                "{reason}. Expected one of: {}",
                DraftField::ALL.map(|f| f.as_str()).join(", ")
            ))
        })
    }
}

/// Parameters for changing the lesson count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SetLessonCount {
    /// Number of lessons; non-numeric text counts as 0
    pub hours: String,
}

/// Parameters for writing the text of one lesson.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SetLesson {
    /// Lesson number, starting at 1
    pub lesson: usize,
    /// What happens in that lesson
    pub text: String,
}

impl SetLesson {
    /// The 0-based list index.
    pub fn index(&self) -> Result<usize> {
        one_based("lesson", self.lesson)
    }
}

/// Parameters addressing an evaluation criterion.
///
/// `index` is 1-based and ignored when adding; `text` is only used when
/// changing a criterion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct EvaluationPoint {
    /// 'knowledge', 'thinking' or 'attitude'
    pub viewpoint: String,
    /// Criterion number, starting at 1
    #[serde(default)]
    pub index: Option<usize>,
    /// New criterion text
    #[serde(default)]
    pub text: Option<String>,
}

impl EvaluationPoint {
    pub fn viewpoint(&self) -> Result<Viewpoint> {
        self.viewpoint
            .parse()
            .map_err(|reason: String| PlannerError::invalid_input("viewpoint").with_reason(reason))
    }

    /// The 0-based criterion index; required for remove and set.
    pub fn index(&self) -> Result<usize> {
        let index = self
            .index
            .ok_or_else(|| PlannerError::invalid_input("index").with_reason("index is required"))?;
        one_based("index", index)
    }
}

/// Parameters for saving the draft as a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SavePlan {
    /// Category to save under; defaults to the draft's selected category
    #[serde(default)]
    pub category: Option<String>,
}

impl SavePlan {
    pub fn category(&self) -> Result<Option<Category>> {
        parse_category(self.category.as_deref())
    }
}

/// Parameters for listing saved plans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ListPlans {
    /// Only list plans of this category ('reading', 'discussion', 'writing',
    /// 'language-activity')
    #[serde(default)]
    pub category: Option<String>,
}

impl ListPlans {
    pub fn category(&self) -> Result<Option<Category>> {
        parse_category(self.category.as_deref())
    }
}

/// Parameters for creating or updating an education model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SaveEducationModel {
    /// ID of the model to update; a new model is created when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Display name of the model
    pub name: String,
    /// Teaching philosophy (教育観)
    pub philosophy: String,
    /// What the model emphasises when evaluating
    pub evaluation_focus: String,
    /// Language-activity emphasis
    pub language_focus: String,
    /// The children the model aims to raise
    pub child_focus: String,
    /// Note recorded with this revision in the model history
    #[serde(default)]
    pub note: Option<String>,
}

impl SaveEducationModel {
    /// Fails on the first blank model field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("name", &self.name),
            ("philosophy", &self.philosophy),
            ("evaluation-focus", &self.evaluation_focus),
            ("language-focus", &self.language_focus),
            ("child-focus", &self.child_focus),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => {
                Err(PlannerError::invalid_input(*field).with_reason("must not be empty"))
            }
            None => Ok(()),
        }
    }
}

fn parse_category(value: Option<&str>) -> Result<Option<Category>> {
    value
        .map(|s| {
            s.parse()
                .map_err(|reason: String| PlannerError::invalid_input("category").with_reason(reason))
        })
        .transpose()
}

fn one_based(field: &str, position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| PlannerError::invalid_input(field).with_reason("numbering starts at 1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_draft_rejects_unknown_field() {
        let params = UpdateDraft {
            field: "title".to_string(),
            value: String::new(),
        };
        match params.field().unwrap_err() {
            PlannerError::InvalidInput { field, reason } => {
                assert_eq!(field, "field");
                assert!(reason.contains("unit-goal"));
            }
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn test_lesson_numbering_starts_at_one() {
        let params = SetLesson {
            lesson: 3,
            text: "発表する".to_string(),
        };
        assert_eq!(params.index().unwrap(), 2);

        let params = SetLesson {
            lesson: 0,
            ..Default::default()
        };
        assert!(params.index().is_err());
    }

    #[test]
    fn test_evaluation_point_requires_index() {
        let params = EvaluationPoint {
            viewpoint: "thinking".to_string(),
            ..Default::default()
        };
        assert_eq!(params.viewpoint().unwrap(), Viewpoint::Thinking);
        assert!(params.index().is_err());

        let params = EvaluationPoint {
            viewpoint: "feelings".to_string(),
            index: Some(1),
            text: None,
        };
        assert!(params.viewpoint().is_err());
        assert_eq!(params.index().unwrap(), 0);
    }

    #[test]
    fn test_education_model_requires_every_field() {
        let mut params = SaveEducationModel {
            id: None,
            name: "対話型".to_string(),
            philosophy: "対話を通して考えを深める".to_string(),
            evaluation_focus: "話し合いの過程".to_string(),
            language_focus: "話す・聞く".to_string(),
            child_focus: " ".to_string(),
            note: None,
        };
        match params.validate().unwrap_err() {
            PlannerError::InvalidInput { field, .. } => assert_eq!(field, "child-focus"),
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }

        params.child_focus = "自分の考えをもつ子".to_string();
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_category_parsing() {
        let save = SavePlan {
            category: Some("writing".to_string()),
        };
        assert_eq!(save.category().unwrap(), Some(Category::Writing));
        assert_eq!(ListPlans::default().category().unwrap(), None);

        let list = ListPlans {
            category: Some("poetry".to_string()),
        };
        assert!(list.category().is_err());
    }
}
