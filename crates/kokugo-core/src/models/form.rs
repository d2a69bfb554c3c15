//! The editable lesson-plan form and lesson-count handling.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{PlannerError, Result};

use super::LessonResult;

/// Upper bound applied to the lesson-count field.
pub const MAX_LESSON_COUNT: usize = 200;

/// Coerces user-entered lesson-count text to a non-negative integer.
///
/// Surrounding whitespace is ignored and fractions are truncated. Negative,
/// empty or non-numeric input yields 0; values above [`MAX_LESSON_COUNT`]
/// are clamped.
///
/// ```rust
/// use kokugo_core::models::parse_lesson_count;
///
/// assert_eq!(parse_lesson_count(" 4 "), 4);
/// assert_eq!(parse_lesson_count("2.7"), 2);
/// assert_eq!(parse_lesson_count("-3"), 0);
/// assert_eq!(parse_lesson_count("五"), 0);
/// ```
pub fn parse_lesson_count(text: &str) -> usize {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => (n.trunc() as usize).min(MAX_LESSON_COUNT),
        Ok(n) if n == f64::INFINITY => MAX_LESSON_COUNT,
        _ => 0,
    }
}

fn exceeds_cap(text: &str) -> bool {
    matches!(text.trim().parse::<f64>(), Ok(n) if n >= (MAX_LESSON_COUNT + 1) as f64)
}

/// Returns a list of exactly `len` entries.
///
/// Positions inside the original list keep their values, positions past its
/// end are filled with empty strings and positions at or beyond `len` are
/// dropped.
pub fn resize_list(list: &[String], len: usize) -> Vec<String> {
    (0..len)
        .map(|i| list.get(i).cloned().unwrap_or_default())
        .collect()
}

/// One of the three evaluation viewpoints of the course of study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewpoint {
    /// 知識・技能
    Knowledge,
    /// 思考・判断・表現
    Thinking,
    /// 主体的に学習に取り組む態度
    Attitude,
}

impl Viewpoint {
    pub const ALL: [Viewpoint; 3] = [Viewpoint::Knowledge, Viewpoint::Thinking, Viewpoint::Attitude];

    /// Japanese heading used in prompts, results and previews.
    pub fn label(&self) -> &'static str {
        match self {
            Viewpoint::Knowledge => "知識・技能",
            Viewpoint::Thinking => "思考・判断・表現",
            Viewpoint::Attitude => "主体的に学習に取り組む態度",
        }
    }
}

impl FromStr for Viewpoint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "knowledge" => Ok(Viewpoint::Knowledge),
            "thinking" => Ok(Viewpoint::Thinking),
            "attitude" => Ok(Viewpoint::Attitude),
            other => Viewpoint::ALL
                .into_iter()
                .find(|v| v.label() == other)
                .ok_or_else(|| format!("Invalid viewpoint: {s}")),
        }
    }
}

impl fmt::Display for Viewpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Evaluation criteria grouped by viewpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPoints {
    #[serde(default)]
    pub knowledge: Vec<String>,
    #[serde(default)]
    pub thinking: Vec<String>,
    #[serde(default)]
    pub attitude: Vec<String>,
}

impl Default for EvaluationPoints {
    /// One blank entry per viewpoint, ready for input.
    fn default() -> Self {
        Self {
            knowledge: vec![String::new()],
            thinking: vec![String::new()],
            attitude: vec![String::new()],
        }
    }
}

impl EvaluationPoints {
    /// Empty lists for all three viewpoints.
    pub fn empty() -> Self {
        Self {
            knowledge: Vec::new(),
            thinking: Vec::new(),
            attitude: Vec::new(),
        }
    }

    pub fn get(&self, viewpoint: Viewpoint) -> &[String] {
        match viewpoint {
            Viewpoint::Knowledge => &self.knowledge,
            Viewpoint::Thinking => &self.thinking,
            Viewpoint::Attitude => &self.attitude,
        }
    }

    pub fn get_mut(&mut self, viewpoint: Viewpoint) -> &mut Vec<String> {
        match viewpoint {
            Viewpoint::Knowledge => &mut self.knowledge,
            Viewpoint::Thinking => &mut self.thinking,
            Viewpoint::Attitude => &mut self.attitude,
        }
    }

    /// Appends a blank criterion to a viewpoint.
    pub fn add_point(&mut self, viewpoint: Viewpoint) {
        self.get_mut(viewpoint).push(String::new());
    }

    /// Removes the criterion at `index`.
    pub fn remove_point(&mut self, viewpoint: Viewpoint, index: usize) -> Result<String> {
        let points = self.get_mut(viewpoint);
        if index >= points.len() {
            return Err(out_of_range(viewpoint.label(), index, points.len()));
        }
        Ok(points.remove(index))
    }

    /// Replaces the criterion at `index`.
    pub fn set_point(
        &mut self,
        viewpoint: Viewpoint,
        index: usize,
        value: impl Into<String>,
    ) -> Result<()> {
        let points = self.get_mut(viewpoint);
        let len = points.len();
        let slot = points
            .get_mut(index)
            .ok_or_else(|| out_of_range(viewpoint.label(), index, len))?;
        *slot = value.into();
        Ok(())
    }

    /// True when no viewpoint has a non-blank criterion.
    pub fn is_blank(&self) -> bool {
        Viewpoint::ALL
            .iter()
            .all(|v| self.get(*v).iter().all(|p| p.trim().is_empty()))
    }
}

/// Genre-specific source material that sharpens the generated flow.
///
/// Only the group matching the form's genre (物語文, 説明文, 詩) ends up in
/// the prompt, but all groups are kept so switching genre loses nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenreMaterials {
    #[serde(deserialize_with = "lenient_string")]
    pub story_main: String,
    #[serde(deserialize_with = "lenient_string")]
    pub story_counter: String,
    #[serde(deserialize_with = "lenient_string")]
    pub story_setting: String,
    #[serde(deserialize_with = "lenient_string")]
    pub story_climax: String,

    #[serde(deserialize_with = "lenient_string")]
    pub ex_topic: String,
    #[serde(deserialize_with = "lenient_string")]
    pub ex_purpose: String,
    #[serde(deserialize_with = "lenient_string")]
    pub ex_structure: String,
    #[serde(deserialize_with = "lenient_string")]
    pub ex_keywords: String,

    #[serde(deserialize_with = "lenient_string")]
    pub poem_speaker: String,
    #[serde(deserialize_with = "lenient_string")]
    pub poem_feelings: String,
    #[serde(deserialize_with = "lenient_string")]
    pub poem_imagery: String,
    #[serde(deserialize_with = "lenient_string")]
    pub poem_repetition: String,
}

/// The lesson-plan input form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonForm {
    /// Textbook publisher (教科書名)
    #[serde(deserialize_with = "lenient_string")]
    pub subject: String,

    /// School year, e.g. "3年"
    #[serde(deserialize_with = "lenient_string")]
    pub grade: String,

    /// Text genre (物語文, 説明文, 詩, その他)
    #[serde(deserialize_with = "lenient_string")]
    pub genre: String,

    /// Teaching material or unit name (教材名)
    #[serde(deserialize_with = "lenient_string")]
    pub unit: String,

    /// Lesson count exactly as entered
    #[serde(deserialize_with = "lenient_string")]
    pub hours: String,

    #[serde(deserialize_with = "lenient_string")]
    pub unit_goal: String,

    pub evaluation_points: EvaluationPoints,

    /// 育てたい子どもの姿
    #[serde(deserialize_with = "lenient_string")]
    pub child_vision: String,

    /// 言語活動の工夫: the goal activity of the unit
    #[serde(deserialize_with = "lenient_string")]
    pub language_activities: String,

    /// One text block per lesson
    pub lesson_plan_list: Vec<String>,

    /// Optional education model steering generation
    #[serde(deserialize_with = "lenient_option")]
    pub education_model_id: Option<String>,

    #[serde(flatten)]
    pub materials: GenreMaterials,
}

impl Default for LessonForm {
    fn default() -> Self {
        Self {
            subject: "東京書籍".to_string(),
            grade: "1年".to_string(),
            genre: "物語文".to_string(),
            unit: String::new(),
            hours: String::new(),
            unit_goal: String::new(),
            evaluation_points: EvaluationPoints::default(),
            child_vision: String::new(),
            language_activities: String::new(),
            lesson_plan_list: Vec::new(),
            education_model_id: None,
            materials: GenreMaterials::default(),
        }
    }
}

impl LessonForm {
    /// The lesson count as a number.
    pub fn lesson_count(&self) -> usize {
        parse_lesson_count(&self.hours)
    }

    /// Stores the lesson-count text and resizes the per-lesson list to match.
    ///
    /// A count above [`MAX_LESSON_COUNT`] is stored as the cap itself, so the
    /// field always agrees with the length of the list.
    pub fn set_hours(&mut self, text: impl Into<String>) {
        self.hours = text.into();
        self.sync_lesson_list();
    }

    /// Pads or truncates the per-lesson list to the current lesson count.
    pub fn sync_lesson_list(&mut self) {
        if exceeds_cap(&self.hours) {
            self.hours = MAX_LESSON_COUNT.to_string();
        }
        self.lesson_plan_list = resize_list(&self.lesson_plan_list, self.lesson_count());
    }

    /// Replaces the text of one lesson (0-based).
    pub fn set_lesson(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        let len = self.lesson_plan_list.len();
        let slot = self
            .lesson_plan_list
            .get_mut(index)
            .ok_or_else(|| out_of_range("lesson", index, len))?;
        *slot = text.into();
        Ok(())
    }

    /// Sets one free-text field.
    pub fn set_text(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        let m = &mut self.materials;
        match field {
            DraftField::Hours => return self.set_hours(value),
            DraftField::Subject => self.subject = value,
            DraftField::Grade => self.grade = value,
            DraftField::Genre => self.genre = value,
            DraftField::Unit => self.unit = value,
            DraftField::UnitGoal => self.unit_goal = value,
            DraftField::ChildVision => self.child_vision = value,
            DraftField::LanguageActivities => self.language_activities = value,
            DraftField::EducationModel => {
                self.education_model_id = Some(value).filter(|v| !v.trim().is_empty())
            }
            DraftField::StoryMain => m.story_main = value,
            DraftField::StoryCounter => m.story_counter = value,
            DraftField::StorySetting => m.story_setting = value,
            DraftField::StoryClimax => m.story_climax = value,
            DraftField::ExTopic => m.ex_topic = value,
            DraftField::ExPurpose => m.ex_purpose = value,
            DraftField::ExStructure => m.ex_structure = value,
            DraftField::ExKeywords => m.ex_keywords = value,
            DraftField::PoemSpeaker => m.poem_speaker = value,
            DraftField::PoemFeelings => m.poem_feelings = value,
            DraftField::PoemImagery => m.poem_imagery = value,
            DraftField::PoemRepetition => m.poem_repetition = value,
        }
    }

    /// Copies a structured result back into the form.
    ///
    /// Non-blank textbook, grade, genre and unit overwrite the form; the goal,
    /// child vision, language activities and evaluation criteria are always
    /// taken over. The lesson count becomes the result's count, or the number
    /// of flow entries when the result has none, and the per-lesson list is
    /// padded to it.
    pub fn apply_result(&mut self, result: &LessonResult) {
        if !result.textbook.is_empty() {
            self.subject = result.textbook.clone();
        }
        if !result.grade.is_empty() {
            self.grade = result.grade.clone();
        }
        if !result.genre.is_empty() {
            self.genre = result.genre.clone();
        }
        if !result.unit.is_empty() {
            self.unit = result.unit.clone();
        }

        let count = match result.hours as usize {
            0 => result.flow.len(),
            n => n,
        }
        .min(MAX_LESSON_COUNT);
        self.hours = count.to_string();
        self.lesson_plan_list = resize_list(&result.flow, count);

        self.unit_goal = result.unit_goal.clone();
        self.child_vision = result.child_vision.clone();
        self.language_activities = result.language_activities.clone();
        self.evaluation_points = result.evaluation.clone();
    }
}

/// Addressable free-text fields of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DraftField {
    Subject,
    Grade,
    Genre,
    Unit,
    Hours,
    UnitGoal,
    ChildVision,
    LanguageActivities,
    EducationModel,
    StoryMain,
    StoryCounter,
    StorySetting,
    StoryClimax,
    ExTopic,
    ExPurpose,
    ExStructure,
    ExKeywords,
    PoemSpeaker,
    PoemFeelings,
    PoemImagery,
    PoemRepetition,
}

impl DraftField {
    pub const ALL: [DraftField; 21] = [
        DraftField::Subject,
        DraftField::Grade,
        DraftField::Genre,
        DraftField::Unit,
        DraftField::Hours,
        DraftField::UnitGoal,
        DraftField::ChildVision,
        DraftField::LanguageActivities,
        DraftField::EducationModel,
        DraftField::StoryMain,
        DraftField::StoryCounter,
        DraftField::StorySetting,
        DraftField::StoryClimax,
        DraftField::ExTopic,
        DraftField::ExPurpose,
        DraftField::ExStructure,
        DraftField::ExKeywords,
        DraftField::PoemSpeaker,
        DraftField::PoemFeelings,
        DraftField::PoemImagery,
        DraftField::PoemRepetition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Subject => "subject",
            DraftField::Grade => "grade",
            DraftField::Genre => "genre",
            DraftField::Unit => "unit",
            DraftField::Hours => "hours",
            DraftField::UnitGoal => "unit-goal",
            DraftField::ChildVision => "child-vision",
            DraftField::LanguageActivities => "language-activities",
            DraftField::EducationModel => "education-model",
            DraftField::StoryMain => "story-main",
            DraftField::StoryCounter => "story-counter",
            DraftField::StorySetting => "story-setting",
            DraftField::StoryClimax => "story-climax",
            DraftField::ExTopic => "ex-topic",
            DraftField::ExPurpose => "ex-purpose",
            DraftField::ExStructure => "ex-structure",
            DraftField::ExKeywords => "ex-keywords",
            DraftField::PoemSpeaker => "poem-speaker",
            DraftField::PoemFeelings => "poem-feelings",
            DraftField::PoemImagery => "poem-imagery",
            DraftField::PoemRepetition => "poem-repetition",
        }
    }
}

impl FromStr for DraftField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        DraftField::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| format!("Invalid field: {s}"))
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn out_of_range(field: &str, index: usize, len: usize) -> PlannerError {
    PlannerError::invalid_input(field).with_reason(format!(
        "index {} is out of range (1..={len})",
        index + 1
    ))
}

/// Accepts strings, numbers and null where a string is expected.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Like [`lenient_string`] but maps null and blank text to `None`.
pub(crate) fn lenient_option<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_string(deserializer)?;
    Ok(Some(text).filter(|t| !t.trim().is_empty()))
}
