use async_trait::async_trait;
use canvas_context::render_namespace_docs;
use canvas_types::{ToolResult, ToolSchema};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::{Tool, ToolEnv};

/// Surfaces usage docs of component namespaces not yet shown in this conversation.
pub struct OpenCompTool {
    env: ToolEnv,
}

impl OpenCompTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for OpenCompTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "open-comp-document".to_string(),
            description: "Open usage docs of component namespaces that are not documented yet, e.g. before adding a new kind of component. namespaces: comma-separated.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"namespaces": {"type": "string"}},
                "required": ["namespaces"]
            }),
        }
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let namespaces = args
            .get("namespaces")
            .or_else(|| args.get("ids"))
            .and_then(Value::as_str)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|ns| !ns.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if namespaces.is_empty() {
            return Err(ToolError::missing("namespaces", "comma-separated component namespaces").into());
        }

        let mut workspace = self.env.workspace.write().await;
        let known = namespaces
            .iter()
            .filter(|ns| !workspace.register_namespace_doc(ns))
            .cloned()
            .collect::<Vec<_>>();
        let docs = workspace.drain_namespace_docs(self.env.host.as_ref());

        let mut output = if docs.is_empty() {
            "No new component docs.".to_string()
        } else {
            render_namespace_docs(&docs)
        };
        if !known.is_empty() {
            output.push_str(&format!("\nAlready documented: {}", known.join(", ")));
        }
        Ok(ToolResult {
            output,
            metadata: json!({
                "opened": docs.iter().map(|d| d.namespace.as_str()).collect::<Vec<_>>(),
                "already_open": known,
            }),
        })
    }
}
