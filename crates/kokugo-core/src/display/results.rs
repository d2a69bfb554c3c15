//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use crate::models::{LessonResult, Viewpoint};

/// A result in the 授業案 Markdown layout stored with saved plans and used
/// for export.
///
/// Empty sections are left out; the flow is listed in lesson order.
///
/// ```rust
/// use kokugo_core::{display::AssistantPlan, models::LessonResult};
///
/// let result = LessonResult {
///     unit_goal: "場面の様子を想像する".to_string(),
///     flow: vec!["音読する".to_string()],
///     ..Default::default()
/// };
/// let markdown = AssistantPlan(&result).to_string();
/// assert!(markdown.starts_with("## 授業案\n\n### ねらい\n場面の様子を想像する"));
/// assert!(markdown.ends_with("- 1時間目：\n音読する"));
/// ```
pub struct AssistantPlan<'a>(pub &'a LessonResult);

impl fmt::Display for AssistantPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let mut parts = vec!["## 授業案".to_string()];

        let goal = result.unit_goal.trim();
        if !goal.is_empty() {
            parts.push(format!("### ねらい\n{goal}"));
        }

        let viewpoints: Vec<_> = Viewpoint::ALL
            .iter()
            .map(|v| {
                let items: Vec<_> = result
                    .evaluation
                    .get(*v)
                    .iter()
                    .map(|p| p.trim())
                    .filter(|p| !p.is_empty())
                    .map(|p| format!("  - {p}"))
                    .collect();
                (v.label(), items)
            })
            .filter(|(_, items)| !items.is_empty())
            .collect();
        if !viewpoints.is_empty() {
            parts.push("### 評価".to_string());
            for (label, items) in viewpoints {
                parts.push(format!("- {label}\n{}", items.join("\n")));
            }
        }

        let activities = result.language_activities.trim();
        if !activities.is_empty() {
            parts.push(format!("### 言語活動の工夫\n{activities}"));
        }

        let flow: Vec<_> = result
            .labelled_flow()
            .map(|(label, text)| format!("- {label}：\n{}", text.trim()))
            .collect();
        if !flow.is_empty() {
            parts.push(format!("### 流れ\n{}", flow.join("\n")));
        }

        write!(f, "{}", parts.join("\n\n").trim())
    }
}

/// Confirmation of an exported plan.
pub struct ExportResult {
    pub plan_id: String,
    pub url: String,
}

impl fmt::Display for ExportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Exported plan {} to {}", self.plan_id, self.url)
    }
}

/// Confirmation of a deleted plan.
pub struct DeleteResult {
    pub plan_id: String,
    pub unit: String,
}

impl fmt::Display for DeleteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deleted plan '{}' (ID: {})", self.unit, self.plan_id)
    }
}
