//! Normalized structured lesson plan.
//!
//! Results arrive from two places: the completion endpoint and the manual
//! form. The endpoint is loose about shapes (criteria may be a list or a
//! single string, the flow may be an object, a list or one block of text),
//! so the wire form is read into [`RawLessonResult`] and normalized once,
//! here. Everything downstream works with the flat [`LessonResult`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{parse_lesson_count, resize_list, EvaluationPoints, LessonForm};
use crate::error::Result;

const KEY_KNOWLEDGE: &str = "知識・技能";
const KEY_THINKING: &str = "思考・判断・表現";
const KEY_ATTITUDE: &str = "主体的に学習に取り組む態度";
const KEY_ATTITUDE_SHORT: &str = "態度";
const LESSON_SUFFIX: &str = "時間目";

/// A structured lesson plan with every field in a single canonical shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLessonResult", into = "RawLessonResult")]
pub struct LessonResult {
    pub textbook: String,
    pub grade: String,
    pub genre: String,
    pub unit: String,
    pub hours: u32,
    pub unit_goal: String,
    pub evaluation: EvaluationPoints,
    pub child_vision: String,
    /// One entry per lesson, in lesson order
    pub flow: Vec<String>,
    pub language_activities: String,
    /// Free-form closing remark (結果)
    pub summary: String,
}

impl LessonResult {
    /// Normalizes an arbitrary JSON value into a result.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Builds the result of a manually composed plan.
    ///
    /// The per-lesson list is sized to the lesson count first, mirroring what
    /// submission does to the form itself.
    pub fn from_form(form: &LessonForm) -> Self {
        let count = form.lesson_count();
        Self {
            textbook: form.subject.clone(),
            grade: form.grade.clone(),
            genre: form.genre.clone(),
            unit: form.unit.clone(),
            hours: count as u32,
            unit_goal: form.unit_goal.clone(),
            evaluation: form.evaluation_points.clone(),
            child_vision: form.child_vision.clone(),
            flow: resize_list(&form.lesson_plan_list, count),
            language_activities: form.language_activities.clone(),
            summary: String::new(),
        }
    }

    /// Flow entries labelled "1時間目", "2時間目", …
    pub fn labelled_flow(&self) -> impl Iterator<Item = (String, &str)> {
        self.flow
            .iter()
            .enumerate()
            .map(|(i, text)| (lesson_label(i + 1), text.as_str()))
    }
}

/// "3" → "3時間目"
pub(crate) fn lesson_label(n: usize) -> String {
    format!("{n}{LESSON_SUFFIX}")
}

/// Normalizes a criteria value to a list of strings.
///
/// Arrays map element-wise, a non-blank scalar becomes a one-element list and
/// null or blank text becomes an empty list.
///
/// ```rust
/// use kokugo_core::models::to_array;
/// use serde_json::json;
///
/// assert_eq!(to_array(&json!(["a", "b"])), vec!["a", "b"]);
/// assert_eq!(to_array(&json!("a")), vec!["a"]);
/// assert!(to_array(&json!("  ")).is_empty());
/// assert!(to_array(&json!(null)).is_empty());
/// ```
pub fn to_array(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(scalar_text).collect(),
        Value::Null => Vec::new(),
        other => {
            let text = scalar_text(other);
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn trimmed(value: &Value) -> String {
    scalar_text(value).trim().to_string()
}

fn normalize_hours(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map_or(0, |f| f.trunc().min(f64::from(u32::MAX)) as u32),
        Value::String(s) => parse_lesson_count(s) as u32,
        _ => 0,
    }
}

fn normalize_evaluation(value: &Value) -> EvaluationPoints {
    let field = |key: &str| value.get(key).unwrap_or(&Value::Null);
    let attitude = match field(KEY_ATTITUDE) {
        Value::Null => field(KEY_ATTITUDE_SHORT),
        present => present,
    };
    EvaluationPoints {
        knowledge: to_array(field(KEY_KNOWLEDGE)),
        thinking: to_array(field(KEY_THINKING)),
        attitude: to_array(attitude),
    }
}

/// Leading integer of a key such as "12時間目", or 0.
fn key_number(key: &str) -> u64 {
    key.chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// Strips a leading "N時間目:" / "N 時間目：" label from one line.
fn strip_lesson_prefix(line: &str) -> &str {
    let rest = line.trim_start();
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return line.trim();
    }
    let Some(after) = rest[digits..].trim_start().strip_prefix(LESSON_SUFFIX) else {
        return line.trim();
    };
    after
        .strip_prefix(':')
        .or_else(|| after.strip_prefix('：'))
        .unwrap_or(after)
        .trim()
}

fn normalize_flow(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(scalar_text).collect(),
        Value::String(text) => text.lines().map(|l| strip_lesson_prefix(l).to_string()).collect(),
        Value::Object(entries) => {
            let mut ordered: Vec<_> = entries.iter().collect();
            ordered.sort_by_key(|(key, _)| key_number(key));
            ordered.into_iter().map(|(_, v)| scalar_text(v)).collect()
        }
        _ => Vec::new(),
    }
}

/// Wire shape with the Japanese keys used by the completion endpoint and the
/// stored documents.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawLessonResult {
    #[serde(rename = "教科書名", default)]
    textbook: Value,
    #[serde(rename = "学年", default)]
    grade: Value,
    #[serde(rename = "ジャンル", default)]
    genre: Value,
    #[serde(rename = "教材名", default)]
    unit: Value,
    #[serde(rename = "単元名", default, skip_serializing)]
    unit_name: Value,
    #[serde(rename = "授業時間数", default)]
    hours: Value,
    #[serde(rename = "単元の目標", default)]
    unit_goal: Value,
    #[serde(rename = "評価の観点", default)]
    evaluation: Value,
    #[serde(rename = "育てたい子どもの姿", default)]
    child_vision: Value,
    #[serde(rename = "授業の流れ", default)]
    flow: Value,
    #[serde(rename = "言語活動の工夫", default)]
    language_activities: Value,
    #[serde(rename = "結果", default)]
    summary: Value,
}

impl From<RawLessonResult> for LessonResult {
    fn from(raw: RawLessonResult) -> Self {
        let unit = match trimmed(&raw.unit) {
            unit if unit.is_empty() => trimmed(&raw.unit_name),
            unit => unit,
        };
        Self {
            textbook: trimmed(&raw.textbook),
            grade: trimmed(&raw.grade),
            genre: trimmed(&raw.genre),
            unit,
            hours: normalize_hours(&raw.hours),
            unit_goal: trimmed(&raw.unit_goal),
            evaluation: normalize_evaluation(&raw.evaluation),
            child_vision: trimmed(&raw.child_vision),
            flow: normalize_flow(&raw.flow),
            language_activities: trimmed(&raw.language_activities),
            summary: trimmed(&raw.summary),
        }
    }
}

impl From<LessonResult> for RawLessonResult {
    fn from(result: LessonResult) -> Self {
        let strings = |items: Vec<String>| Value::from(items);

        let mut evaluation = Map::new();
        evaluation.insert(KEY_KNOWLEDGE.into(), strings(result.evaluation.knowledge));
        evaluation.insert(KEY_THINKING.into(), strings(result.evaluation.thinking));
        evaluation.insert(KEY_ATTITUDE.into(), strings(result.evaluation.attitude));

        let flow: Map<String, Value> = result
            .flow
            .into_iter()
            .enumerate()
            .map(|(i, text)| (lesson_label(i + 1), Value::String(text)))
            .collect();

        Self {
            textbook: result.textbook.into(),
            grade: result.grade.into(),
            genre: result.genre.into(),
            unit: result.unit.into(),
            unit_name: Value::Null,
            hours: result.hours.into(),
            unit_goal: result.unit_goal.into(),
            evaluation: Value::Object(evaluation),
            child_vision: result.child_vision.into(),
            flow: Value::Object(flow),
            language_activities: result.language_activities.into(),
            summary: result.summary.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_normalizes_scalar_criteria_and_object_flow() {
        let result = LessonResult::from_value(json!({
            "教科書名": " 光村図書 ",
            "学年": "2年",
            "ジャンル": "物語文",
            "単元名": "スイミー",
            "授業時間数": "3",
            "単元の目標": "場面の様子を想像して読む",
            "評価の観点": {
                "知識・技能": "音読する",
                "思考・判断・表現": ["想像する", "伝え合う"],
                "態度": "進んで読む"
            },
            "授業の流れ": {
                "10時間目": "j",
                "2時間目": "b",
                "1時間目": "a"
            },
            "言語活動の工夫": "音読劇"
        }))
        .unwrap();

        assert_eq!(result.textbook, "光村図書");
        assert_eq!(result.unit, "スイミー");
        assert_eq!(result.hours, 3);
        assert_eq!(result.evaluation.knowledge, vec!["音読する"]);
        assert_eq!(result.evaluation.thinking, vec!["想像する", "伝え合う"]);
        assert_eq!(result.evaluation.attitude, vec!["進んで読む"]);
        assert_eq!(result.flow, vec!["a", "b", "j"]);
        assert_eq!(result.summary, "");
    }

    #[test]
    fn test_full_attitude_key_wins_over_short_key() {
        let result = LessonResult::from_value(json!({
            "評価の観点": {
                "主体的に学習に取り組む態度": [],
                "態度": "ignored"
            }
        }))
        .unwrap();
        assert!(result.evaluation.attitude.is_empty());
    }

    #[test]
    fn test_flow_as_text_strips_lesson_labels() {
        let result = LessonResult::from_value(json!({
            "授業の流れ": "1時間目: 読む\n 2 時間目：書く\n話し合う"
        }))
        .unwrap();
        assert_eq!(result.flow, vec!["読む", "書く", "話し合う"]);
    }

    #[test]
    fn test_flow_as_array_and_numeric_hours() {
        let result = LessonResult::from_value(json!({
            "授業時間数": 2.0,
            "授業の流れ": ["x", 7]
        }))
        .unwrap();
        assert_eq!(result.hours, 2);
        assert_eq!(result.flow, vec!["x", "7"]);
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(LessonResult::from_value(json!("just text")).is_err());
    }

    #[test]
    fn test_serializes_with_japanese_keys_and_labelled_flow() {
        let result = LessonResult {
            unit: "ごんぎつね".to_string(),
            hours: 2,
            flow: vec!["first".to_string(), "second".to_string()],
            evaluation: EvaluationPoints::empty(),
            ..Default::default()
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["教材名"], "ごんぎつね");
        assert_eq!(value["授業の流れ"]["2時間目"], "second");
        assert!(value.get("単元名").is_none());

        let back: LessonResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_from_form_sizes_flow_to_lesson_count() {
        let mut form = LessonForm::default();
        form.lesson_plan_list = vec!["a".to_string()];
        form.hours = "3".to_string();
        let result = LessonResult::from_form(&form);
        assert_eq!(result.hours, 3);
        assert_eq!(result.flow, vec!["a", "", ""]);
    }

    #[test]
    fn test_apply_result_uses_flow_length_when_hours_missing() {
        let result = LessonResult {
            unit: "たんぽぽ".to_string(),
            flow: vec!["a".to_string(), "b".to_string()],
            evaluation: EvaluationPoints::empty(),
            ..Default::default()
        };
        let mut form = LessonForm::default();
        form.subject = "教育出版".to_string();
        form.apply_result(&result);

        assert_eq!(form.subject, "教育出版");
        assert_eq!(form.unit, "たんぽぽ");
        assert_eq!(form.hours, "2");
        assert_eq!(form.lesson_plan_list, vec!["a", "b"]);
        assert_eq!(form.evaluation_points, EvaluationPoints::empty());
    }
}
