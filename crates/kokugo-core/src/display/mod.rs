//! Markdown formatting for drafts, results, plan lists and operation
//! outcomes.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! collections and operation outcomes get small wrapper types so the same
//! data can be formatted differently depending on context. Every formatter
//! produces Markdown, which the CLI renders for the terminal and the MCP
//! server returns verbatim.
//!
//! ## Module Organization
//!
//! - [`collections`]: collection wrappers ([`PlanSummaries`], [`EducationModels`])
//! - [`results`]: operation outcomes ([`AssistantPlan`], [`ExportResult`], [`DeleteResult`])
//! - [`status`]: success/failure messages ([`OperationStatus`])
//! - [`datetime`]: local-time formatting of stored timestamps
//! - [`models`]: Display implementations for domain models
//!
//! ```rust
//! use kokugo_core::display::OperationStatus;
//!
//! let status = OperationStatus::success("Draft cleared".to_string());
//! assert!(status.to_string().starts_with("Success:"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{EducationModels, ModelHistory, PlanSummaries};
pub use datetime::{LocalDateTime, StoredTime};
pub use results::{AssistantPlan, DeleteResult, ExportResult};
pub use status::OperationStatus;
