//! Subcommands and their handlers.
//!
//! Each argument struct carries clap attributes only and converts into the
//! interface-agnostic parameter types of `kokugo_core::params`, which also
//! back the MCP tools:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Session
//! ```
//!
//! [`Cli`] runs one command against a restored [`Session`] and renders the
//! Markdown the core produces.

use anyhow::{bail, Result};
use clap::{Args, Subcommand, ValueEnum};
use kokugo_core::{
    display::{AssistantPlan, DeleteResult, EducationModels, ModelHistory, OperationStatus},
    models::{Category, CompositionMode, EducationModel, Viewpoint},
    params::{
        EvaluationPoint, ListPlans, PlanId, SaveEducationModel, SavePlan, SetLesson,
        SetLessonCount, UpdateDraft,
    },
    GenerateOutcome, Session,
};
use log::debug;

use crate::renderer::TerminalRenderer;

/// Runs CLI commands against one session.
pub struct Cli {
    session: Session,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(session: Session, renderer: TerminalRenderer) -> Self {
        Self { session, renderer }
    }

    /// Waits for the last edit to reach both stores.
    pub async fn finish(self) {
        self.session.settle().await;
    }

    pub fn show_draft(&self) -> Result<()> {
        self.renderer.render(&self.session.draft().to_string())
    }

    pub async fn handle_draft_command(&mut self, command: DraftCommands) -> Result<()> {
        match command {
            DraftCommands::Show => self.show_draft(),
            DraftCommands::Set(args) => {
                let params = UpdateDraft::from(args);
                let field = params.field()?;
                self.session.set_field(field, params.value);
                self.status(format!("Set {field}"))
            }
            DraftCommands::Hours(args) => {
                let params = SetLessonCount::from(args);
                self.session.set_hours(params.hours);
                let count = self.session.draft().form.lesson_count();
                self.status(format!("Lesson count set to {count}"))
            }
            DraftCommands::Lesson(args) => {
                let params = SetLesson::from(args);
                self.session.set_lesson(params.index()?, params.text)?;
                self.status(format!("Updated lesson {}", params.lesson))
            }
            DraftCommands::Eval { command } => self.handle_eval_command(command),
            DraftCommands::Mode { mode } => {
                let mode = CompositionMode::from(mode);
                self.session.set_mode(mode);
                self.status(format!("Composition mode set to {mode}"))
            }
            DraftCommands::Category { category } => {
                let category = category.category();
                self.session.set_category(category);
                match category {
                    Some(category) => self.status(format!("Category set to {category}")),
                    None => self.status("Category unset".to_string()),
                }
            }
            DraftCommands::Consent { consent } => {
                let allow = consent == ConsentArg::Yes;
                self.session.set_allow_train(allow);
                self.status(format!(
                    "Training consent {}",
                    if allow { "given" } else { "withdrawn" }
                ))
            }
            DraftCommands::Clear => {
                self.session.clear().await?;
                self.status("Draft cleared".to_string())
            }
            DraftCommands::Prompt => {
                println!("{}", self.session.prompt().await?);
                Ok(())
            }
            DraftCommands::Generate => match self.session.generate().await? {
                GenerateOutcome::Applied(result) => {
                    self.renderer.render(&format!("{}\n", AssistantPlan(&result)))
                }
                GenerateOutcome::Discarded => self.renderer.render(
                    &OperationStatus::failure(
                        "The draft changed during generation; the result was discarded"
                            .to_string(),
                    )
                    .to_string(),
                ),
            },
        }
    }

    fn handle_eval_command(&mut self, command: EvalCommands) -> Result<()> {
        match command {
            EvalCommands::Add { viewpoint } => {
                let viewpoint = Viewpoint::from(viewpoint);
                self.session.add_evaluation_point(viewpoint);
                let count = self
                    .session
                    .draft()
                    .form
                    .evaluation_points
                    .get(viewpoint)
                    .len();
                self.status(format!("Added criterion {count} to {}", viewpoint.label()))
            }
            EvalCommands::Remove(args) => {
                let params = EvaluationPoint::from(args);
                let viewpoint = params.viewpoint()?;
                let removed = self
                    .session
                    .remove_evaluation_point(viewpoint, params.index()?)?;
                debug!("Removed criterion text: {removed}");
                self.status(format!("Removed criterion from {}", viewpoint.label()))
            }
            EvalCommands::Set(args) => {
                let params = EvaluationPoint::from(args);
                let viewpoint = params.viewpoint()?;
                let text = params.text.clone().unwrap_or_default();
                self.session
                    .set_evaluation_point(viewpoint, params.index()?, text)?;
                self.status(format!("Updated criterion of {}", viewpoint.label()))
            }
        }
    }

    pub async fn handle_plan_command(&mut self, command: PlanCommands) -> Result<()> {
        match command {
            PlanCommands::Save(args) => {
                let params = SavePlan::from(args);
                let plan = self.session.save(params.category()?).await?;
                self.status(format!(
                    "Saved plan '{}' (ID: {}) under {}",
                    plan.form.unit, plan.id, plan.category
                ))
            }
            PlanCommands::List(args) => {
                let params = ListPlans::from(args);
                let plans = self.session.list_plans(params.category()?).await?;
                self.renderer
                    .render(&format!("# Saved Plans\n\n{plans}"))
            }
            PlanCommands::Show(args) => {
                let params = PlanId::from(args);
                let plan = self.session.get_plan(&params.id).await?;
                self.renderer.render(&plan.to_string())
            }
            PlanCommands::Open(args) => {
                let params = PlanId::from(args);
                self.session.load_plan(&params.id).await?;
                self.show_draft()
            }
            PlanCommands::Delete(args) => {
                if !args.confirm {
                    bail!(
                        "Deleting plan {} cannot be undone. Pass --confirm to delete it",
                        args.id
                    );
                }
                let plan = self.session.delete_plan(&args.id).await?;
                let result = DeleteResult {
                    plan_id: plan.id,
                    unit: plan.form.unit,
                };
                self.renderer.render(&result.to_string())
            }
            PlanCommands::Export(args) => {
                let params = PlanId::from(args);
                let result = self.session.export_plan(&params.id).await?;
                self.renderer.render(&result.to_string())
            }
        }
    }

    pub async fn handle_model_command(&self, command: Option<ModelCommands>) -> Result<()> {
        match command.unwrap_or(ModelCommands::List) {
            ModelCommands::List => {
                let models = self.session.list_education_models().await?;
                self.renderer.render(&format!(
                    "# Education Models\n\n{}",
                    EducationModels(models)
                ))
            }
            ModelCommands::Create(args) => {
                let model = self.session.save_education_model(&args.into_new()).await?;
                self.status(format!(
                    "Created education model '{}' (ID: {})",
                    model.name, model.id
                ))
            }
            ModelCommands::Edit(args) => {
                let current = self.session.get_education_model(&args.id).await?;
                let params = args.fields.into_update(current);
                let model = self.session.save_education_model(&params).await?;
                self.status(format!(
                    "Updated education model '{}' (ID: {})",
                    model.name, model.id
                ))
            }
            ModelCommands::Delete(args) => {
                if !args.confirm {
                    bail!(
                        "Deleting education model {} cannot be undone. Pass --confirm to delete it",
                        args.id
                    );
                }
                let model = self.session.delete_education_model(&args.id).await?;
                self.status(format!(
                    "Deleted education model '{}' (ID: {})",
                    model.name, model.id
                ))
            }
            ModelCommands::History { id } => {
                let history = self.session.education_model_history(id.as_deref()).await?;
                self.renderer
                    .render(&format!("# Model History\n\n{}", ModelHistory(history)))
            }
        }
    }

    fn status(&self, message: String) -> Result<()> {
        self.renderer
            .render(&OperationStatus::success(message).to_string())
    }
}

#[derive(Subcommand)]
pub enum DraftCommands {
    /// Show the current draft
    #[command(alias = "s")]
    Show,
    /// Set a text field of the form
    Set(SetFieldArgs),
    /// Set the lesson count; the per-lesson list follows it
    Hours(HoursArgs),
    /// Write what happens in one lesson
    Lesson(LessonArgs),
    /// Edit the evaluation criteria
    Eval {
        #[command(subcommand)]
        command: EvalCommands,
    },
    /// Choose between AI completion and manual composition
    Mode { mode: ModeArg },
    /// Choose the authoring category, or 'none' to unset it
    Category { category: CategoryChoice },
    /// Allow or refuse use of the plan as training data
    Consent { consent: ConsentArg },
    /// Delete the draft from both stores and reset the form
    Clear,
    /// Print the generation prompt for the current form
    Prompt,
    /// Generate the structured lesson plan
    #[command(alias = "g")]
    Generate,
}

#[derive(Subcommand)]
pub enum EvalCommands {
    /// Append an empty criterion
    Add { viewpoint: ViewpointArg },
    /// Remove a criterion
    Remove(EvalIndexArgs),
    /// Replace the text of a criterion
    Set(EvalSetArgs),
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Save the draft as a lesson plan
    Save(SavePlanArgs),
    /// List saved plans, newest first
    #[command(alias = "ls")]
    List(ListPlansArgs),
    /// Show a saved plan
    Show(PlanIdArgs),
    /// Open a saved plan for editing
    Open(PlanIdArgs),
    /// Delete a saved plan permanently
    Delete(DeletePlanArgs),
    /// Export a saved plan as a Markdown document
    Export(PlanIdArgs),
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// List the education models available for generation
    #[command(alias = "ls")]
    List,
    /// Create an education model; every field is required
    Create(ModelFieldArgs),
    /// Change an education model; omitted fields keep their value
    Edit(EditModelArgs),
    /// Delete an education model permanently
    Delete(DeleteModelArgs),
    /// Show saved revisions, newest first
    History {
        #[arg(help = "Only show revisions of this model")]
        id: Option<String>,
    },
}

/// Set a text field of the form
#[derive(Args)]
pub struct SetFieldArgs {
    #[arg(help = "Field name, e.g. subject, grade, unit, unit-goal, child-vision, story-main")]
    pub field: String,
    #[arg(help = "New value")]
    pub value: String,
}

impl From<SetFieldArgs> for UpdateDraft {
    fn from(val: SetFieldArgs) -> Self {
        UpdateDraft {
            field: val.field,
            value: val.value,
        }
    }
}

#[derive(Args)]
pub struct HoursArgs {
    #[arg(help = "Number of lessons in the unit")]
    pub hours: String,
}

impl From<HoursArgs> for SetLessonCount {
    fn from(val: HoursArgs) -> Self {
        SetLessonCount { hours: val.hours }
    }
}

#[derive(Args)]
pub struct LessonArgs {
    #[arg(help = "Lesson number, starting at 1")]
    pub lesson: usize,
    #[arg(help = "What happens in that lesson")]
    pub text: String,
}

impl From<LessonArgs> for SetLesson {
    fn from(val: LessonArgs) -> Self {
        SetLesson {
            lesson: val.lesson,
            text: val.text,
        }
    }
}

#[derive(Args)]
pub struct EvalIndexArgs {
    pub viewpoint: ViewpointArg,
    #[arg(help = "Criterion number, starting at 1")]
    pub index: usize,
}

impl From<EvalIndexArgs> for EvaluationPoint {
    fn from(val: EvalIndexArgs) -> Self {
        EvaluationPoint {
            viewpoint: val.viewpoint.to_string(),
            index: Some(val.index),
            text: None,
        }
    }
}

#[derive(Args)]
pub struct EvalSetArgs {
    pub viewpoint: ViewpointArg,
    #[arg(help = "Criterion number, starting at 1")]
    pub index: usize,
    #[arg(help = "New criterion text")]
    pub text: String,
}

impl From<EvalSetArgs> for EvaluationPoint {
    fn from(val: EvalSetArgs) -> Self {
        EvaluationPoint {
            viewpoint: val.viewpoint.to_string(),
            index: Some(val.index),
            text: Some(val.text),
        }
    }
}

#[derive(Args)]
pub struct SavePlanArgs {
    /// Category to save under; defaults to the draft's category
    #[arg(short, long)]
    pub category: Option<CategoryArg>,
}

impl From<SavePlanArgs> for SavePlan {
    fn from(val: SavePlanArgs) -> Self {
        SavePlan {
            category: val.category.map(|c| c.to_string()),
        }
    }
}

#[derive(Args)]
pub struct ListPlansArgs {
    /// Only list plans of this category
    #[arg(short, long)]
    pub category: Option<CategoryArg>,
}

impl From<ListPlansArgs> for ListPlans {
    fn from(val: ListPlansArgs) -> Self {
        ListPlans {
            category: val.category.map(|c| c.to_string()),
        }
    }
}

#[derive(Args)]
pub struct PlanIdArgs {
    #[arg(help = "ID of the saved plan")]
    pub id: String,
}

impl From<PlanIdArgs> for PlanId {
    fn from(val: PlanIdArgs) -> Self {
        PlanId { id: val.id }
    }
}

/// Delete a plan permanently
#[derive(Args)]
pub struct DeletePlanArgs {
    #[arg(help = "ID of the plan to permanently delete")]
    pub id: String,
    /// Confirm the deletion (required to prevent accidental deletion)
    #[arg(long)]
    pub confirm: bool,
}

#[derive(Args)]
pub struct ModelFieldArgs {
    /// Display name of the model
    #[arg(long)]
    pub name: Option<String>,
    /// Teaching philosophy (教育観)
    #[arg(long)]
    pub philosophy: Option<String>,
    /// What to emphasise when evaluating (評価観点の重視点)
    #[arg(long)]
    pub evaluation_focus: Option<String>,
    /// Language-activity emphasis (言語活動の重視点)
    #[arg(long)]
    pub language_focus: Option<String>,
    /// The children the model aims to raise (育てたい子どもの姿)
    #[arg(long)]
    pub child_focus: Option<String>,
    /// Note kept with this revision in the model history
    #[arg(long)]
    pub note: Option<String>,
}

impl ModelFieldArgs {
    fn into_new(self) -> SaveEducationModel {
        SaveEducationModel {
            id: None,
            name: self.name.unwrap_or_default(),
            philosophy: self.philosophy.unwrap_or_default(),
            evaluation_focus: self.evaluation_focus.unwrap_or_default(),
            language_focus: self.language_focus.unwrap_or_default(),
            child_focus: self.child_focus.unwrap_or_default(),
            note: self.note,
        }
    }

    fn into_update(self, current: EducationModel) -> SaveEducationModel {
        SaveEducationModel {
            id: Some(current.id),
            name: self.name.unwrap_or(current.name),
            philosophy: self.philosophy.unwrap_or(current.philosophy),
            evaluation_focus: self.evaluation_focus.unwrap_or(current.evaluation_focus),
            language_focus: self.language_focus.unwrap_or(current.language_focus),
            child_focus: self.child_focus.unwrap_or(current.child_focus),
            note: self.note,
        }
    }
}

#[derive(Args)]
pub struct EditModelArgs {
    #[arg(help = "ID of the education model")]
    pub id: String,
    #[command(flatten)]
    pub fields: ModelFieldArgs,
}

/// Delete an education model permanently
#[derive(Args)]
pub struct DeleteModelArgs {
    #[arg(help = "ID of the education model to permanently delete")]
    pub id: String,
    /// Confirm the deletion (required to prevent accidental deletion)
    #[arg(long)]
    pub confirm: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Complete the plan through the completion endpoint
    Ai,
    /// Compose the plan by hand
    Manual,
}

impl From<ModeArg> for CompositionMode {
    fn from(val: ModeArg) -> Self {
        match val {
            ModeArg::Ai => CompositionMode::Ai,
            ModeArg::Manual => CompositionMode::Manual,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// 読解
    Reading,
    /// 話し合い
    Discussion,
    /// 作文
    Writing,
    /// 言語活動
    LanguageActivity,
}

impl From<CategoryArg> for Category {
    fn from(val: CategoryArg) -> Self {
        match val {
            CategoryArg::Reading => Category::Reading,
            CategoryArg::Discussion => Category::Discussion,
            CategoryArg::Writing => Category::Writing,
            CategoryArg::LanguageActivity => Category::LanguageActivity,
        }
    }
}

impl std::fmt::Display for CategoryArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Category::from(*self).as_str())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum CategoryChoice {
    Reading,
    Discussion,
    Writing,
    LanguageActivity,
    /// Unset the category
    None,
}

impl CategoryChoice {
    pub fn category(self) -> Option<Category> {
        match self {
            CategoryChoice::Reading => Some(Category::Reading),
            CategoryChoice::Discussion => Some(Category::Discussion),
            CategoryChoice::Writing => Some(Category::Writing),
            CategoryChoice::LanguageActivity => Some(Category::LanguageActivity),
            CategoryChoice::None => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ConsentArg {
    Yes,
    No,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ViewpointArg {
    /// 知識・技能
    Knowledge,
    /// 思考・判断・表現
    Thinking,
    /// 主体的に学習に取り組む態度
    Attitude,
}

impl From<ViewpointArg> for Viewpoint {
    fn from(val: ViewpointArg) -> Self {
        match val {
            ViewpointArg::Knowledge => Viewpoint::Knowledge,
            ViewpointArg::Thinking => Viewpoint::Thinking,
            ViewpointArg::Attitude => Viewpoint::Attitude,
        }
    }
}

impl std::fmt::Display for ViewpointArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewpointArg::Knowledge => write!(f, "knowledge"),
            ViewpointArg::Thinking => write!(f, "thinking"),
            ViewpointArg::Attitude => write!(f, "attitude"),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;
    use crate::args::{Args, Commands};

    #[test]
    fn test_command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_eval_set_converts_to_core_params() {
        let args = Args::try_parse_from(["kokugo", "draft", "eval", "set", "thinking", "2", "比べて読む"])
            .unwrap();
        let Some(Commands::Draft {
            command: DraftCommands::Eval {
                command: EvalCommands::Set(set),
            },
        }) = args.command
        else {
            panic!("Expected draft eval set");
        };

        let params = EvaluationPoint::from(set);
        assert_eq!(params.viewpoint().unwrap(), Viewpoint::Thinking);
        assert_eq!(params.index().unwrap(), 1);
        assert_eq!(params.text.as_deref(), Some("比べて読む"));
    }

    #[test]
    fn test_category_flag_uses_kebab_case() {
        let args =
            Args::try_parse_from(["kokugo", "plan", "list", "--category", "language-activity"])
                .unwrap();
        let Some(Commands::Plan {
            command: PlanCommands::List(list),
        }) = args.command
        else {
            panic!("Expected plan list");
        };

        let params = ListPlans::from(list);
        assert_eq!(params.category().unwrap(), Some(Category::LanguageActivity));
    }

    #[test]
    fn test_model_edit_keeps_omitted_fields() {
        let args = Args::try_parse_from([
            "kokugo",
            "models",
            "edit",
            "1700000000000",
            "--philosophy",
            "対話で深め合う",
        ])
        .unwrap();
        let Some(Commands::Models {
            command: Some(ModelCommands::Edit(edit)),
        }) = args.command
        else {
            panic!("Expected models edit");
        };
        assert_eq!(edit.id, "1700000000000");

        let current = EducationModel {
            id: edit.id.clone(),
            name: "対話型".to_string(),
            philosophy: "対話で深める".to_string(),
            child_focus: "聞き合う子".to_string(),
            ..Default::default()
        };
        let params = edit.fields.into_update(current);
        assert_eq!(params.id.as_deref(), Some("1700000000000"));
        assert_eq!(params.name, "対話型");
        assert_eq!(params.philosophy, "対話で深め合う");
        assert_eq!(params.child_focus, "聞き合う子");
        assert_eq!(params.note, None);
    }

    #[test]
    fn test_models_without_subcommand_lists() {
        let args = Args::try_parse_from(["kokugo", "models"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Models { command: None })));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["kokugo", "draft", "show", "--user", "t1", "--no-color"])
            .unwrap();
        assert_eq!(args.user, "t1");
        assert!(args.no_color);
        assert_eq!(args.debounce_ms, 800);
    }
}
