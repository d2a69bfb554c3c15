use serde::{Deserialize, Serialize};
use serde_json::Value;

const UNNAMED_MODEL: &str = "無名のモデル";

/// Note recorded for a revision saved without one.
pub const NO_REVISION_NOTE: &str = "（更新時にメモなし）";

/// A teaching-philosophy profile that takes priority in generated plans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EducationModel {
    pub id: String,
    pub name: String,
    pub philosophy: String,
    pub evaluation_focus: String,
    pub language_focus: String,
    pub child_focus: String,
    pub creator_name: String,
    pub updated_at: String,
}

impl EducationModel {
    /// Reads a model from an `educationModels` document.
    ///
    /// Missing or non-string fields become empty; a blank name becomes
    /// 無名のモデル.
    pub fn from_document(id: impl Into<String>, document: &Value) -> Self {
        let text = |key: &str| {
            document
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let name = match text("name") {
            name if name.trim().is_empty() => UNNAMED_MODEL.to_string(),
            name => name,
        };
        Self {
            id: id.into(),
            name,
            philosophy: text("philosophy"),
            evaluation_focus: text("evaluationFocus"),
            language_focus: text("languageFocus"),
            child_focus: text("childFocus"),
            creator_name: text("creatorName"),
            updated_at: text("updatedAt"),
        }
    }
}

/// One saved state of a model, as kept in the model history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelRevision {
    pub id: String,
    pub name: String,
    pub philosophy: String,
    pub evaluation_focus: String,
    pub language_focus: String,
    pub child_focus: String,
    pub updated_at: String,
    pub note: String,
}

impl ModelRevision {
    pub fn new(model: &EducationModel, note: Option<&str>) -> Self {
        let note = match note.map(str::trim) {
            Some(note) if !note.is_empty() => note.to_string(),
            _ => NO_REVISION_NOTE.to_string(),
        };
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            philosophy: model.philosophy.clone(),
            evaluation_focus: model.evaluation_focus.clone(),
            language_focus: model.language_focus.clone(),
            child_focus: model.child_focus.clone(),
            updated_at: model.updated_at.clone(),
            note,
        }
    }
}

/// Trims model text and drops commas that directly follow a full stop.
///
/// ```rust
/// use kokugo_core::models::tidy_model_text;
///
/// assert_eq!(tidy_model_text(" 対話を重視する。、、考える。 "), "対話を重視する。考える。");
/// ```
pub fn tidy_model_text(text: &str) -> String {
    let mut tidied = String::with_capacity(text.len());
    let mut after_stop = false;
    for c in text.trim().chars() {
        if after_stop && c == '、' {
            continue;
        }
        after_stop = c == '。';
        tidied.push(c);
    }
    tidied
}
