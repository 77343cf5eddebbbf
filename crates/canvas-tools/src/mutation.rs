//! Tools that turn the agent's action stream into host mutations.

use std::collections::HashMap;

use async_trait::async_trait;
use canvas_actions::{
    find_file_block, strip_file_blocks, summarize_commands, ActionParser, MutationCommand,
    RootAlias,
};
use canvas_context::{collect_titles, OutlineSource};
use canvas_observability::{emit_event, redact_text, ObservabilityEvent, ProcessKind};
use canvas_types::{BatchStatus, DocumentKind, ToolResult, ToolSchema};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use crate::error::{detect_transport_error, ToolError};
use crate::{Tool, ToolEnv};

const ACTIONS_EXTENSION: &str = "json";
const NO_CHANGES: &str = "No changes were made.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationToolKind {
    /// Builds a whole page from scratch; the page is cleared when streaming starts.
    GeneratePage,
    /// Edits the focused component (or page) while the response streams.
    RefactorComponent,
    /// Small edits to several components, applied once the response is complete.
    ModifyComponents,
}

impl MutationToolKind {
    pub fn name(self) -> &'static str {
        match self {
            MutationToolKind::GeneratePage => "generate-page",
            MutationToolKind::RefactorComponent => "refactor-component",
            MutationToolKind::ModifyComponents => "modify-components-in-page",
        }
    }

    fn description(self) -> &'static str {
        match self {
            MutationToolKind::GeneratePage => {
                "Generate the focused page from scratch. Respond with an actions.json block, one [targetId, selector, kind, params] array per line, starting from _root_/_rootSlot_."
            }
            MutationToolKind::RefactorComponent => {
                "Restructure the focused component. Respond with an actions.json block, one [targetId, selector, kind, params] array per line."
            }
            MutationToolKind::ModifyComponents => {
                "Modify configuration, style or layout of existing components in the page. Respond with an actions.json block, one [targetId, selector, kind, params] array per line."
            }
        }
    }

    fn streams_live(self) -> bool {
        !matches!(self, MutationToolKind::ModifyComponents)
    }
}

/// Parser state of one tool call: the live parser follows the stream, the complete parser
/// re-reads the final text from scratch.
#[derive(Debug)]
struct ActionSession {
    live: ActionParser,
    complete: ActionParser,
    started: bool,
}

impl ActionSession {
    fn new(alias: &RootAlias) -> Self {
        Self {
            live: ActionParser::with_root_alias(alias.clone()),
            complete: ActionParser::with_root_alias(alias.clone()),
            started: false,
        }
    }

    /// True exactly once: for the call that opens the batch sequence.
    fn begin(&mut self) -> bool {
        !std::mem::replace(&mut self.started, true)
    }

    /// Newly confirmed commands and the status to apply them with.
    fn stream(&mut self, content: &str) -> (Vec<MutationCommand>, BatchStatus) {
        let commands = find_file_block(content, ACTIONS_EXTENSION)
            .map(|block| self.live.feed(&block.body))
            .unwrap_or_default();
        let status = if self.begin() {
            BatchStatus::Start
        } else {
            BatchStatus::InProgress
        };
        (commands, status)
    }

    /// Every command of the final text, or `None` when it carries no actions block.
    fn complete(&mut self, content: &str) -> Option<Vec<MutationCommand>> {
        let block = find_file_block(content, ACTIONS_EXTENSION)?;
        Some(self.complete.finish(&block.body))
    }
}

pub struct MutationTool {
    kind: MutationToolKind,
    env: ToolEnv,
    page_id: String,
    target_id: String,
    session: Mutex<ActionSession>,
}

impl MutationTool {
    pub fn new(kind: MutationToolKind, env: ToolEnv) -> Self {
        let page_id = env.focus.page_id.clone();
        let target_id = match kind {
            MutationToolKind::GeneratePage => page_id.clone(),
            _ => env.focus.target_id().to_string(),
        };
        let alias = match env.host.root_container_id(&page_id) {
            Some(container) => env.root_alias.clone().with_container(container),
            None => env.root_alias.clone(),
        };
        Self {
            kind,
            session: Mutex::new(ActionSession::new(&alias)),
            env,
            page_id,
            target_id,
        }
    }

    fn apply(
        &self,
        target_id: &str,
        commands: &[MutationCommand],
        status: BatchStatus,
    ) -> Result<(), ToolError> {
        tracing::info!(
            target: "canvas.tools",
            tool = self.kind.name(),
            target_id,
            status = status.as_str(),
            commands = commands.len(),
            "applying mutation batch"
        );
        self.env
            .host
            .apply_mutation(target_id, commands, status)
            .map_err(|err| {
                tracing::warn!(target: "canvas.tools", tool = self.kind.name(), target_id, error = %err, "host rejected batch");
                ToolError::from(err)
            })
    }

    /// Opens the batch sequence; `generate-page` empties the page first.
    fn start(&self, commands: &[MutationCommand]) -> Result<(), ToolError> {
        if self.kind == MutationToolKind::GeneratePage {
            self.env.host.clear_page(&self.page_id)?;
        }
        self.apply(&self.target_id, commands, BatchStatus::Start)
    }

    fn report(&self, event: &str, error: &ToolError) {
        let detail = match error {
            ToolError::Transport(message) => redact_text(message),
            other => other.to_string(),
        };
        emit_event(
            Level::WARN,
            ProcessKind::Embedded,
            ObservabilityEvent {
                event,
                component: "canvas.tools",
                conversation_id: Some(&self.env.conversation_id),
                turn_id: Some(&self.env.turn_id),
                tool: Some(self.kind.name()),
                target_id: Some(&self.target_id),
                error_code: Some(error.code()),
                detail: Some(&detail),
                ..ObservabilityEvent::default()
            },
        );
    }

    fn titles(&self) -> HashMap<String, String> {
        self.env
            .host
            .outline(&self.page_id, DocumentKind::Page)
            .map(|outline| collect_titles(&outline))
            .unwrap_or_default()
    }
}

#[async_trait]
impl Tool for MutationTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.kind.name().to_string(),
            description: self.kind.description().to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"content": {"type": "string"}},
                "required": ["content"]
            }),
        }
    }

    async fn stream(&self, content: &str) -> anyhow::Result<()> {
        if !self.kind.streams_live() {
            return Ok(());
        }
        let (commands, status) = self.session.lock().await.stream(content);
        if status == BatchStatus::Start {
            self.start(&commands)?;
        } else if !commands.is_empty() {
            self.apply(&self.target_id, &commands, status)?;
        }
        Ok(())
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        self.execute_with_cancel(args, CancellationToken::new()).await
    }

    async fn execute_with_cancel(
        &self,
        args: Value,
        cancel: CancellationToken,
    ) -> anyhow::Result<ToolResult> {
        let content = content_arg(&args)?;
        if let Some(err) = detect_transport_error(content) {
            self.report("tool.transport_error", &err);
            return Err(err.into());
        }
        let (commands, opens_sequence) = {
            let mut session = self.session.lock().await;
            let Some(commands) = session.complete(content) else {
                return Ok(summary_result(content, 0));
            };
            (commands, self.kind.streams_live() && session.begin())
        };
        if cancel.is_cancelled() {
            tracing::info!(target: "canvas.tools", tool = self.kind.name(), "cancelled before final batch");
            return Err(ToolError::Cancelled.into());
        }
        // Executed without a prior stream: the host still sees Start before Complete.
        if opens_sequence {
            self.start(&[])
                .inspect_err(|err| self.report("tool.host_rejected", err))?;
        }

        let titles = self.titles();
        let prose = strip_file_blocks(content);
        let text = match self.kind {
            MutationToolKind::ModifyComponents => {
                let groups = group_by_target(&commands);
                for (target_id, group) in &groups {
                    self.apply(target_id, group, BatchStatus::Complete)
                        .inspect_err(|err| self.report("tool.host_rejected", err))?;
                }
                let ids = groups
                    .iter()
                    .map(|(id, _)| id.as_str())
                    .collect::<Vec<_>>();
                let head = if ids.is_empty() {
                    prose
                } else {
                    format!("Modified components: {}.", ids.join(", "))
                };
                compose_summary(&head, &commands, &titles)
            }
            _ => {
                self.apply(&self.target_id, &commands, BatchStatus::Complete)
                    .inspect_err(|err| self.report("tool.host_rejected", err))?;
                compose_summary(&prose, &commands, &titles)
            }
        };
        Ok(summary_result(&text, commands.len()))
    }
}

pub(crate) fn content_arg(args: &Value) -> Result<&str, ToolError> {
    args.get("content")
        .and_then(Value::as_str)
        .or_else(|| args.as_str())
        .ok_or_else(|| ToolError::missing("content", "the full response text"))
}

/// Commands grouped per target id, groups in order of first appearance.
fn group_by_target(commands: &[MutationCommand]) -> Vec<(String, Vec<MutationCommand>)> {
    let mut groups: Vec<(String, Vec<MutationCommand>)> = Vec::new();
    for cmd in commands {
        match groups.iter_mut().find(|(id, _)| *id == cmd.target_id) {
            Some((_, group)) => group.push(cmd.clone()),
            None => groups.push((cmd.target_id.clone(), vec![cmd.clone()])),
        }
    }
    groups
}

fn compose_summary(
    prose: &str,
    commands: &[MutationCommand],
    titles: &HashMap<String, String>,
) -> String {
    let changes = if commands.is_empty() {
        NO_CHANGES.to_string()
    } else {
        format!("Changes:\n{}", summarize_commands(commands, titles))
    };
    if prose.is_empty() {
        changes
    } else {
        format!("{prose}\n\n{changes}")
    }
}

fn summary_result(text: &str, commands: usize) -> ToolResult {
    ToolResult {
        output: text.to_string(),
        metadata: json!({
            "llm_summary": text,
            "display_summary": text,
            "commands": commands,
        }),
    }
}
