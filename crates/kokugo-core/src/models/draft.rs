//! Auto-saved editing snapshots.

use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{Category, CompositionMode, LessonForm, LessonResult};
use crate::{error::Result, reconcile::parse_timestamp};

/// A transient snapshot of the form, mirrored to the local and remote stores.
///
/// Drafts are read from stores other clients also write to, so every field
/// tolerates missing or oddly typed values instead of rejecting the whole
/// snapshot. Only a body that is not a JSON object at all fails to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Draft {
    /// Id of the saved plan being edited, if any
    #[serde(deserialize_with = "super::form::lenient_option")]
    pub id: Option<String>,

    #[serde(deserialize_with = "lenient_mode")]
    pub mode: CompositionMode,

    #[serde(flatten)]
    pub form: LessonForm,

    #[serde(alias = "authorId", deserialize_with = "lenient_category")]
    pub category: Option<Category>,

    #[serde(deserialize_with = "lenient_result")]
    pub result: Option<LessonResult>,

    /// ISO-8601 time of the last mirrored write
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<String>,

    /// Consent to use the plan as training data
    #[serde(deserialize_with = "lenient_bool")]
    pub allow_train: bool,
}

impl Draft {
    /// Parses a stored draft body.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Serializes the draft for storage.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Stamps the draft with the current time.
    pub fn touch(&mut self) {
        self.timestamp = Some(Timestamp::now().to_string());
    }

    /// The timestamp as an instant, when it is present and valid.
    pub fn parsed_timestamp(&self) -> Option<Timestamp> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

fn lenient_mode<'de, D>(deserializer: D) -> std::result::Result<CompositionMode, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse().unwrap_or_default(),
        _ => CompositionMode::default(),
    })
}

fn lenient_category<'de, D>(deserializer: D) -> std::result::Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

fn lenient_result<'de, D>(deserializer: D) -> std::result::Result<Option<LessonResult>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => LessonResult::from_value(value).ok(),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_draft_round_trips_through_json() {
        let mut draft = Draft {
            mode: CompositionMode::Ai,
            category: Some(Category::Writing),
            allow_train: true,
            ..Default::default()
        };
        draft.form.set_hours("2");
        draft.form.set_lesson(1, "作文を書く").unwrap();
        draft.touch();

        let body = draft.to_json().unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["lessonPlanList"], json!(["", "作文を書く"]));
        assert_eq!(value["allowTrain"], json!(true));
        assert_eq!(value["category"], json!("writing"));

        assert_eq!(Draft::from_json(&body).unwrap(), draft);
    }

    #[test]
    fn test_draft_tolerates_foreign_shapes() {
        let draft: Draft = serde_json::from_value(json!({
            "mode": "quantum",
            "authorId": "reading-model-id",
            "selectedStyleId": "",
            "isDraft": true,
            "timestamp": 12345,
            "result": "garbage",
            "allowTrain": "yes",
            "hours": 3
        }))
        .unwrap();
        assert_eq!(draft.mode, CompositionMode::Manual);
        assert_eq!(draft.category, Some(Category::Reading));
        assert_eq!(draft.timestamp, None);
        assert_eq!(draft.result, None);
        assert!(!draft.allow_train);
        assert_eq!(draft.form.hours, "3");
    }

    #[test]
    fn test_non_object_body_is_corrupt() {
        assert!(Draft::from_json("not json").is_err());
        assert!(Draft::from_json("42").is_err());
    }

    #[test]
    fn test_parsed_timestamp() {
        let mut draft = Draft::default();
        assert!(draft.parsed_timestamp().is_none());
        draft.timestamp = Some("2024-01-01T00:00:00Z".to_string());
        assert!(draft.parsed_timestamp().is_some());
        draft.timestamp = Some("yesterday".to_string());
        assert!(draft.parsed_timestamp().is_none());
    }
}
