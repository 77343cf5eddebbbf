use std::sync::Arc;

use canvas_context::Workspace;
use canvas_tools::{CanvasHost, ToolEnv, ToolRegistry, ToolSchemaValidationError};
use canvas_types::FocusInfo;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AppConfig;

/// One agent conversation over a canvas. The workspace lives as long as the conversation;
/// tools and their parsers are rebuilt every turn.
pub struct Conversation {
    id: String,
    host: Arc<dyn CanvasHost>,
    config: AppConfig,
    focus: FocusInfo,
    workspace: Arc<RwLock<Workspace>>,
    turns: u64,
}

impl Conversation {
    pub fn new(host: Arc<dyn CanvasHost>, config: AppConfig, focus: FocusInfo) -> Self {
        let workspace = Workspace::with_options(focus.clone(), config.context.serialize_options());
        Self {
            id: Uuid::new_v4().to_string(),
            host,
            config,
            focus,
            workspace: Arc::new(RwLock::new(workspace)),
            turns: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn focus(&self) -> &FocusInfo {
        &self.focus
    }

    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn workspace(&self) -> Arc<RwLock<Workspace>> {
        self.workspace.clone()
    }

    /// Moves the focus without dropping opened documents.
    pub async fn set_focus(&mut self, focus: FocusInfo) {
        self.workspace.write().await.set_focus(focus.clone());
        self.focus = focus;
    }

    /// Fresh tools for the next turn, bound to the current focus.
    pub fn begin_turn(&mut self) -> Result<ToolRegistry, ToolSchemaValidationError> {
        self.turns += 1;
        let turn_id = Uuid::new_v4().to_string();
        tracing::debug!(
            target: "canvas.core",
            conversation_id = %self.id,
            turn_id = %turn_id,
            turn = self.turns,
            page_id = %self.focus.page_id,
            "begin turn"
        );
        ToolRegistry::new(ToolEnv {
            host: self.host.clone(),
            workspace: self.workspace.clone(),
            focus: self.focus.clone(),
            root_alias: self.config.actions.root_alias(None),
            conversation_id: self.id.clone(),
            turn_id,
        })
    }

    /// Page index, focused hierarchy and opened documents, for the agent's context.
    pub async fn render_context(&self) -> String {
        self.workspace
            .read()
            .await
            .render_overview(self.host.as_ref())
    }

    /// Starts over with a new id and an empty workspace.
    pub async fn reset(&mut self, focus: FocusInfo) {
        self.workspace.write().await.reset(focus.clone());
        self.focus = focus;
        self.id = Uuid::new_v4().to_string();
        self.turns = 0;
    }
}
