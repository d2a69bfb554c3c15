//! Core library for the kokugo lesson-plan drafting tool.
//!
//! This crate holds everything behind the CLI and the MCP server: the
//! lesson-plan form and its models, reconciliation of the local and remote
//! drafts, debounced mirroring of edits to both stores, prompt assembly,
//! the completion client, and saving, listing and exporting plans.
//!
//! # Display Architecture
//!
//! - **Domain Models** ([`models`]): Implement [`std::fmt::Display`] for direct
//!   formatting
//! - **Display Wrappers** ([`display`]): Lists, the 授業案 Markdown layout and
//!   operation outcomes
//! - **Terminal Rendering**: Rich markdown output via the CLI's terminal
//!   renderer
//!
//! # Quick Start
//!
//! ```rust
//! use kokugo_core::{models::DraftField, SessionBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = SessionBuilder::new()
//!     .with_data_dir(Some("/tmp/kokugo"))
//!     .with_user_id("teacher-1")
//!     .build()
//!     .await?;
//!
//! // Load the newer of the local and remote drafts
//! session.restore().await;
//!
//! session.set_field(DraftField::Unit, "ごんぎつね");
//! session.set_hours("8");
//! println!("{}", session.draft());
//!
//! // Flush the pending mirror write before exiting
//! session.settle().await;
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod db;
pub mod display;
pub mod error;
pub mod mirror;
pub mod models;
pub mod params;
pub mod prompt;
pub mod reconcile;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use completion::{CompletionClient, HttpCompletionClient};
pub use db::Database;
pub use display::{
    AssistantPlan, DeleteResult, EducationModels, ExportResult, OperationStatus, PlanSummaries,
};
pub use error::{PlannerError, Result};
pub use models::{
    Category, CompositionMode, Draft, DraftField, EducationModel, LessonForm, LessonResult,
    PlanSummary, SavedPlan, Viewpoint,
};
pub use params::{
    EvaluationPoint, ListPlans, PlanId, SaveEducationModel, SavePlan, SetLesson, SetLessonCount,
    UpdateDraft,
};
pub use reconcile::choose_draft;
pub use session::{GenerateOutcome, RestoreOutcome, Session, SessionBuilder};
