//! Data models for lesson-plan drafts and saved plans.
//!
//! This module contains the domain models of the drafting tool. Each model
//! serializes to the JSON shape shared by the local and remote stores, and
//! the richer markdown presentation lives in [`crate::display`].
//!
//! # Model Overview
//!
//! - [`LessonForm`]: the editable form (textbook, grade, genre, unit,
//!   lesson count, goals, evaluation viewpoints, per-lesson flow, genre
//!   materials)
//! - [`Draft`]: an auto-saved snapshot of the form plus composition mode,
//!   selected category, generated result and timestamp
//! - [`SavedPlan`]: the committed counterpart of a draft, stored in the
//!   collection of its [`Category`]
//! - [`LessonResult`]: the normalized structured lesson plan, whatever shape
//!   the completion endpoint returned
//! - [`EducationModel`]: an optional teaching-philosophy profile that steers
//!   generation
//!
//! # Examples
//!
//! ```rust
//! use kokugo_core::models::{Category, Draft};
//!
//! let mut draft = Draft::default();
//! draft.category = Some(Category::Reading);
//! draft.form.set_hours("3");
//! assert_eq!(draft.form.lesson_plan_list, vec!["", "", ""]);
//! assert_eq!(Category::Reading.collection(), "lesson_plans_reading");
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

mod draft;
mod education;
mod form;
mod plan;
mod result;

pub use draft::Draft;
pub use education::{tidy_model_text, EducationModel, ModelRevision, NO_REVISION_NOTE};
pub use form::{
    parse_lesson_count, resize_list, DraftField, EvaluationPoints, GenreMaterials, LessonForm,
    Viewpoint, MAX_LESSON_COUNT,
};
pub use plan::{PlanSummary, SavedPlan};
pub use result::{to_array, LessonResult};

/// Whether the plan body is written by the teacher or completed by the AI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    /// Lesson flow is generated by the completion endpoint
    Ai,

    /// Lesson flow is typed in by hand
    #[default]
    Manual,
}

impl FromStr for CompositionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ai" => Ok(CompositionMode::Ai),
            "manual" => Ok(CompositionMode::Manual),
            _ => Err(format!("Invalid composition mode: {s}")),
        }
    }
}

impl fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl CompositionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionMode::Ai => "ai",
            CompositionMode::Manual => "manual",
        }
    }
}

/// The four fixed authoring categories.
///
/// A category decides both the minimum requirements injected into the
/// generation prompt and the collection a saved plan is stored in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// 読解: reading comprehension
    #[serde(alias = "reading-model-id")]
    Reading,

    /// 話し合い: discussion
    #[serde(alias = "discussion-model-id")]
    Discussion,

    /// 作文: writing
    #[serde(alias = "writing-model-id")]
    Writing,

    /// 言語活動: language activities
    #[serde(alias = "language-activity-model-id")]
    LanguageActivity,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 4] = [
        Category::Reading,
        Category::Discussion,
        Category::Writing,
        Category::LanguageActivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Reading => "reading",
            Category::Discussion => "discussion",
            Category::Writing => "writing",
            Category::LanguageActivity => "language-activity",
        }
    }

    /// Japanese label shown to teachers.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Reading => "読解",
            Category::Discussion => "話し合い",
            Category::Writing => "作文",
            Category::LanguageActivity => "言語活動",
        }
    }

    /// Document-store collection holding saved plans of this category.
    pub fn collection(&self) -> &'static str {
        match self {
            Category::Reading => "lesson_plans_reading",
            Category::Discussion => "lesson_plans_discussion",
            Category::Writing => "lesson_plans_writing",
            Category::LanguageActivity => "lesson_plans_language_activity",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        let normalized = normalized
            .strip_suffix("-model-id")
            .unwrap_or(&normalized)
            .to_string();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized || c.label() == s.trim())
            .ok_or_else(|| format!("Invalid category: {s}"))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str_accepts_all_spellings() {
        assert_eq!("reading".parse::<Category>(), Ok(Category::Reading));
        assert_eq!("話し合い".parse::<Category>(), Ok(Category::Discussion));
        assert_eq!(
            "language_activity".parse::<Category>(),
            Ok(Category::LanguageActivity)
        );
        assert_eq!(
            "writing-model-id".parse::<Category>(),
            Ok(Category::Writing)
        );
        assert!("poetry".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_accepts_legacy_ids() {
        let category: Category = serde_json::from_str("\"discussion-model-id\"").unwrap();
        assert_eq!(category, Category::Discussion);
        assert_eq!(
            serde_json::to_string(&Category::LanguageActivity).unwrap(),
            "\"language-activity\""
        );
    }

    #[test]
    fn test_categories_have_distinct_collections() {
        let collections: std::collections::HashSet<_> =
            Category::ALL.iter().map(|c| c.collection()).collect();
        assert_eq!(collections.len(), 4);
    }

    #[test]
    fn test_composition_mode_default_is_manual() {
        assert_eq!(CompositionMode::default(), CompositionMode::Manual);
        assert_eq!("AI".parse::<CompositionMode>(), Ok(CompositionMode::Ai));
    }
}
