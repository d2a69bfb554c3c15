//! Display implementations for domain models.
//!
//! The Display implementations provide Markdown with the same Japanese
//! headings teachers see on the preview page, so a rendered draft or plan
//! reads like the printed lesson plan.

use std::fmt;

use super::datetime::StoredTime;
use crate::models::{
    Draft, EducationModel, EvaluationPoints, LessonResult, ModelRevision, PlanSummary, SavedPlan,
    Viewpoint,
};

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        "_(未入力)_"
    } else {
        text
    }
}

fn fmt_evaluation(f: &mut fmt::Formatter<'_>, points: &EvaluationPoints) -> fmt::Result {
    for viewpoint in Viewpoint::ALL {
        writeln!(f, "**{}**", viewpoint.label())?;
        writeln!(f)?;
        let entries: Vec<_> = points
            .get(viewpoint)
            .iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if entries.is_empty() {
            writeln!(f, "- _(なし)_")?;
        }
        for entry in entries {
            writeln!(f, "- {entry}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

impl fmt::Display for LessonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## 授業の概要")?;
        writeln!(f)?;
        writeln!(f, "- 教科書名：{}", self.textbook)?;
        writeln!(f, "- 学年：{}", self.grade)?;
        writeln!(f, "- ジャンル：{}", self.genre)?;
        writeln!(f, "- 教材名：{}", self.unit)?;
        writeln!(f, "- 授業時間数：{}時間", self.hours)?;
        writeln!(f, "- 育てたい子どもの姿：{}", self.child_vision)?;
        writeln!(f)?;

        writeln!(f, "## 単元の目標")?;
        writeln!(f)?;
        writeln!(f, "{}", or_placeholder(&self.unit_goal))?;
        writeln!(f)?;

        writeln!(f, "## 評価の観点")?;
        writeln!(f)?;
        fmt_evaluation(f, &self.evaluation)?;

        writeln!(f, "## 言語活動の工夫")?;
        writeln!(f)?;
        writeln!(f, "{}", or_placeholder(&self.language_activities))?;
        writeln!(f)?;

        writeln!(f, "## 授業の流れ")?;
        writeln!(f)?;
        for (label, text) in self.labelled_flow() {
            writeln!(f, "- **{label}：** {text}")?;
        }

        if !self.summary.is_empty() {
            writeln!(f)?;
            writeln!(f, "## 結果")?;
            writeln!(f)?;
            writeln!(f, "{}", self.summary)?;
        }
        Ok(())
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form = &self.form;
        match &self.id {
            Some(id) => writeln!(f, "# Draft (editing plan {id})")?,
            None => writeln!(f, "# Draft")?,
        }
        writeln!(f)?;

        writeln!(f, "- **Mode**: {}", self.mode)?;
        match self.category {
            Some(category) => writeln!(f, "- **Category**: {category} ({})", category.as_str())?,
            None => writeln!(f, "- **Category**: _(not selected)_")?,
        }
        if let Some(model) = &form.education_model_id {
            writeln!(f, "- **Education model**: {model}")?;
        }
        writeln!(f, "- **Training consent**: {}", if self.allow_train { "yes" } else { "no" })?;
        match &self.timestamp {
            Some(ts) => writeln!(f, "- **Last mirrored**: {}", StoredTime(ts))?,
            None => writeln!(f, "- **Last mirrored**: never")?,
        }
        writeln!(f)?;

        writeln!(f, "## 基本情報")?;
        writeln!(f)?;
        writeln!(f, "- 教科書名：{}", form.subject)?;
        writeln!(f, "- 学年：{}", form.grade)?;
        writeln!(f, "- ジャンル：{}", form.genre)?;
        writeln!(f, "- 教材名：{}", or_placeholder(&form.unit))?;
        writeln!(f, "- 授業時間数：{}", or_placeholder(&form.hours))?;
        writeln!(f)?;

        writeln!(f, "## 単元の目標")?;
        writeln!(f)?;
        writeln!(f, "{}", or_placeholder(&form.unit_goal))?;
        writeln!(f)?;

        writeln!(f, "## 評価の観点")?;
        writeln!(f)?;
        fmt_evaluation(f, &form.evaluation_points)?;

        writeln!(f, "## 育てたい子どもの姿")?;
        writeln!(f)?;
        writeln!(f, "{}", or_placeholder(&form.child_vision))?;
        writeln!(f)?;

        writeln!(f, "## 言語活動の工夫")?;
        writeln!(f)?;
        writeln!(f, "{}", or_placeholder(&form.language_activities))?;
        writeln!(f)?;

        writeln!(f, "## 授業の流れ")?;
        writeln!(f)?;
        if form.lesson_plan_list.is_empty() {
            writeln!(f, "_(授業時間数を入力してください)_")?;
        }
        for (i, step) in form.lesson_plan_list.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, or_placeholder(step))?;
        }

        if self.result.is_some() {
            writeln!(f)?;
            writeln!(f, "_A generated result is attached; save it with `plan save`._")?;
        }
        Ok(())
    }
}

impl fmt::Display for SavedPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {} (ID: {})", or_placeholder(&self.form.unit), self.id)?;
        writeln!(f)?;
        writeln!(f, "- **Category**: {}", self.category)?;
        writeln!(f, "- **Mode**: {}", self.mode)?;
        if let Some(name) = &self.education_model_name {
            writeln!(f, "- **Education model**: {name}")?;
        }
        writeln!(f, "- **Saved**: {}", StoredTime(&self.timestamp))?;
        writeln!(f)?;
        write!(f, "{}", self.result)
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {} (ID: {})", or_placeholder(&self.unit), self.id)?;
        writeln!(f)?;
        writeln!(f, "- **Category**: {}", self.category)?;
        writeln!(f, "- **Grade**: {} / {}", self.grade, self.genre)?;
        writeln!(f, "- **Lessons**: {}", self.lesson_count)?;
        writeln!(f, "- **Saved**: {}", StoredTime(&self.timestamp))?;
        writeln!(f)
    }
}

impl fmt::Display for EducationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {} (ID: {})", self.name, self.id)?;
        writeln!(f)?;
        if !self.creator_name.is_empty() {
            writeln!(f, "- **Creator**: {}", self.creator_name)?;
        }
        if !self.philosophy.is_empty() {
            writeln!(f, "- **教育観**: {}", self.philosophy)?;
        }
        if !self.updated_at.is_empty() {
            writeln!(f, "- **Updated**: {}", StoredTime(&self.updated_at))?;
        }
        writeln!(f)
    }
}

impl fmt::Display for ModelRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {} (ID: {})", self.name, self.id)?;
        writeln!(f)?;
        writeln!(f, "- **Saved**: {}", StoredTime(&self.updated_at))?;
        writeln!(f, "- **Note**: {}", self.note)?;
        writeln!(f, "- **教育観**: {}", or_placeholder(&self.philosophy))?;
        writeln!(f, "- **評価観点の重視点**: {}", or_placeholder(&self.evaluation_focus))?;
        writeln!(f, "- **言語活動の重視点**: {}", or_placeholder(&self.language_focus))?;
        writeln!(f, "- **育てたい子どもの姿**: {}", or_placeholder(&self.child_focus))?;
        writeln!(f)
    }
}
