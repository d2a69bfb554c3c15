//! Collection wrapper types for displaying groups of domain objects.

use std::fmt;

use crate::models::{EducationModel, ModelRevision, PlanSummary};

/// Newtype wrapper for displaying saved-plan listings.
///
/// ```rust
/// use kokugo_core::display::PlanSummaries;
///
/// let output = PlanSummaries(vec![]).to_string();
/// assert_eq!(output, "No saved plans found.\n");
/// ```
pub struct PlanSummaries(pub Vec<PlanSummary>);

impl PlanSummaries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanSummary> {
        self.0.iter()
    }
}

impl IntoIterator for PlanSummaries {
    type Item = PlanSummary;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for PlanSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            writeln!(f, "No saved plans found.")
        } else {
            for plan in &self.0 {
                write!(f, "{plan}")?;
            }
            Ok(())
        }
    }
}

/// Newtype wrapper for displaying the available education models.
pub struct EducationModels(pub Vec<EducationModel>);

impl fmt::Display for EducationModels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No education models found.");
        }
        for model in &self.0 {
            write!(f, "{model}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying the education-model history.
pub struct ModelHistory(pub Vec<ModelRevision>);

impl fmt::Display for ModelHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No model history found.");
        }
        for revision in &self.0 {
            write!(f, "{revision}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    #[test]
    fn test_plan_summaries_display() {
        let summaries = PlanSummaries(vec![PlanSummary {
            id: "1700000000000".to_string(),
            category: Category::Reading,
            grade: "4年".to_string(),
            genre: "物語文".to_string(),
            unit: "ごんぎつね".to_string(),
            lesson_count: 8,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }]);
        let output = summaries.to_string();
        assert!(output.contains("## ごんぎつね (ID: 1700000000000)"));
        assert!(output.contains("- **Lessons**: 8"));
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn test_empty_education_models() {
        assert!(EducationModels(vec![]).to_string().contains("No education models"));
        assert_eq!(ModelHistory(vec![]).to_string(), "No model history found.\n");
    }

    #[test]
    fn test_model_history_display() {
        let history = ModelHistory(vec![ModelRevision {
            id: "1700000000000".to_string(),
            name: "対話型".to_string(),
            philosophy: "対話で深める".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            note: "初版".to_string(),
            ..Default::default()
        }]);
        let output = history.to_string();
        assert!(output.contains("## 対話型 (ID: 1700000000000)"));
        assert!(output.contains("- **Note**: 初版"));
        assert!(output.contains("- **言語活動の重視点**: _(未入力)_"));
    }
}
