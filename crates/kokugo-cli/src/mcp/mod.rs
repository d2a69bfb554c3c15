//! MCP server implementation for Kokugo
//!
//! Exposes the draft of one user to AI assistants over the Model Context
//! Protocol: reading and editing the form, generating the structured plan,
//! and saving and browsing saved plans.

use std::sync::Arc;

use anyhow::Result;
use kokugo_core::Session;
use log::{debug, error, info};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::Mutex,
};

pub mod errors;
pub mod handlers;

pub use errors::to_mcp_error;
pub use handlers::{
    ListPlans, McpResult, PlanId, SavePlan, SetLesson, SetLessonCount, UpdateDraft,
};

/// MCP server for Kokugo
#[derive(Clone)]
pub struct KokugoMcpServer {
    session: Arc<Mutex<Session>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl KokugoMcpServer {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    fn handlers(&self) -> handlers::McpHandlers {
        handlers::McpHandlers::new(self.session.clone())
    }

    #[tool(
        name = "show_draft",
        description = "Show the current lesson-plan draft: composition mode, category, every form field, the per-lesson flow and the generated plan if there is one. Read this before editing."
    )]
    async fn show_draft(&self) -> McpResult {
        self.handlers().show_draft().await
    }

    #[tool(
        name = "update_draft",
        description = "Set one field of the draft. Text fields: subject (textbook), grade, genre, unit, hours, unit-goal, child-vision, language-activities, education-model, story-main, story-counter, story-setting, story-climax, ex-topic, ex-purpose, ex-structure, ex-keywords, poem-speaker, poem-feelings, poem-imagery, poem-repetition. Use field 'category' with reading, discussion, writing or language-activity (or 'none') and field 'mode' with 'ai' or 'manual'. Every edit is auto-saved."
    )]
    async fn update_draft(&self, params: Parameters<UpdateDraft>) -> McpResult {
        self.handlers().update_draft(params).await
    }

    #[tool(
        name = "set_lesson_count",
        description = "Set the number of lessons in the unit. The per-lesson flow grows with empty entries or is truncated to match; non-numeric text counts as zero lessons."
    )]
    async fn set_lesson_count(&self, params: Parameters<SetLessonCount>) -> McpResult {
        self.handlers().set_lesson_count(params).await
    }

    #[tool(
        name = "set_lesson",
        description = "Write what happens in one lesson of the per-lesson flow. Lessons are numbered from 1 up to the lesson count; set the count first with set_lesson_count."
    )]
    async fn set_lesson(&self, params: Parameters<SetLesson>) -> McpResult {
        self.handlers().set_lesson(params).await
    }

    #[tool(
        name = "clear_draft",
        description = "Delete the draft from both the local and the shared store and reset the form. The composition mode is kept. This cannot be undone."
    )]
    async fn clear_draft(&self) -> McpResult {
        self.handlers().clear_draft().await
    }

    #[tool(
        name = "generate_plan",
        description = "Generate the structured lesson plan (授業案) from the draft. Requires a category. In 'ai' mode the completion endpoint writes the plan; in 'manual' mode the plan is assembled from the form as typed. Returns the plan in Markdown."
    )]
    async fn generate_plan(&self) -> McpResult {
        self.handlers().generate_plan().await
    }

    #[tool(
        name = "save_plan",
        description = "Save the draft as a lesson plan once a plan has been generated. Optionally override the category. Saving a plan opened for editing updates it in place; the draft is cleared from both stores afterwards."
    )]
    async fn save_plan(&self, params: Parameters<SavePlan>) -> McpResult {
        self.handlers().save_plan(params).await
    }

    #[tool(
        name = "list_plans",
        description = "List saved lesson plans, newest first, optionally only those of one category. Returns IDs, units, grades and save times."
    )]
    async fn list_plans(&self, params: Parameters<ListPlans>) -> McpResult {
        self.handlers().list_plans(params).await
    }

    #[tool(
        name = "show_plan",
        description = "Show a saved lesson plan in full by its ID, including the form it was generated from."
    )]
    async fn show_plan(&self, params: Parameters<PlanId>) -> McpResult {
        self.handlers().show_plan(params).await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for KokugoMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "kokugo".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(r#"Kokugo drafts lesson plans (授業案) for Japanese-language classes.

## Workflow
1. Read the draft with `show_draft`
2. Pick a category and fill the form with `update_draft`; size the unit with `set_lesson_count` and describe each lesson with `set_lesson`
3. Produce the plan with `generate_plan`
4. Commit it with `save_plan`; browse with `list_plans` and `show_plan`

Edits are auto-saved to the local and the shared store after a short quiet period. `clear_draft` discards the draft everywhere."#.to_string()),
            ..Default::default()
        }
    }
}

/// Run the MCP server with stdio transport
pub async fn run_stdio_server(server: KokugoMcpServer) -> Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    info!("Starting Kokugo MCP server on stdio");
    debug!(
        "Server created with {} tools",
        server.tool_router.list_all().len()
    );

    let session = server.session.clone();
    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!("serving error: {e:?}");
    })?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => info!("MCP server stopped normally"),
                Err(e) => error!("MCP server error: {e:?}"),
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    session.lock().await.settle().await;
    info!("MCP server shutdown complete");
    Ok(())
}
