use async_trait::async_trait;
use canvas_actions::find_file_block;
use canvas_context::{render_namespace_docs, ContextError, OpenOutcome};
use canvas_types::{ToolResult, ToolSchema};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::{Tool, ToolEnv};

/// Opens pages or components into the conversation workspace.
pub struct OpenDslTool {
    env: ToolEnv,
}

impl OpenDslTool {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Tool for OpenDslTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "open-dsl-document".to_string(),
            description: "Open the DSL of pages or components needed for the request. ids: comma-separated page/component ids. Open as little as needed; components inside an opened page are already visible.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "ids": {"type": "string"},
                    "content": {"type": "string"}
                }
            }),
        }
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult> {
        let ids = requested_ids(&args);
        if ids.is_empty() {
            return Err(ToolError::missing(
                "id",
                "give page or component ids, e.g. {\"ids\": \"u_1sd23,u_9sdi2\"}",
            )
            .into());
        }

        let host = self.env.host.as_ref();
        let mut workspace = self.env.workspace.write().await;
        let mut opened = Vec::new();
        let mut unknown = Vec::new();
        for id in &ids {
            match workspace.open_document(host, id) {
                Ok(OpenOutcome::AlreadyOpen) => {}
                Ok(_) => opened.push(id.clone()),
                Err(ContextError::UnknownDocument(_)) => unknown.push(id.clone()),
                Err(err) => return Err(ToolError::from(err).into()),
            }
        }
        if unknown.len() == ids.len() {
            return Err(ToolError::missing(
                "id",
                format!("no page or component matches {}", unknown.join(", ")),
            )
            .into());
        }
        tracing::info!(
            target: "canvas.tools",
            opened = opened.len(),
            unknown = unknown.len(),
            "opened dsl documents"
        );

        let docs = workspace.drain_namespace_docs(host);
        let mut output = format!("## Opened documents\n{}", workspace.render_documents());
        if !docs.is_empty() {
            output.push_str("\n\n");
            output.push_str(&render_namespace_docs(&docs));
        }
        if !unknown.is_empty() {
            output.push_str(&format!("\n\nNot found: {}", unknown.join(", ")));
        }
        Ok(ToolResult {
            output,
            metadata: json!({
                "opened": opened,
                "unknown": unknown,
                "namespaces": docs.iter().map(|d| d.namespace.as_str()).collect::<Vec<_>>(),
            }),
        })
    }
}

/// Ids from `ids` ("a,b" or ["a","b"]) or from a JSON file block in `content`
/// (`{"id": "a"}`, `[{"id": "a"}]`, `{"ids": "a,b"}`).
fn requested_ids(args: &Value) -> Vec<String> {
    let mut ids = ids_from_value(args.get("ids").unwrap_or(&Value::Null));
    if ids.is_empty() {
        if let Some(content) = args.get("content").and_then(Value::as_str) {
            let raw = find_file_block(content, "json")
                .map(|block| block.body)
                .unwrap_or_else(|| content.to_string());
            if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
                ids = ids_from_value(&value);
            }
        }
    }
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
    ids
}

fn ids_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::String(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items.iter().flat_map(ids_from_value).collect(),
        Value::Object(obj) => obj
            .get("id")
            .or_else(|| obj.get("ids"))
            .map(ids_from_value)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_come_from_every_accepted_shape() {
        assert_eq!(requested_ids(&json!({"ids": "u_a, u_b,,u_a"})), vec!["u_a", "u_b"]);
        assert_eq!(requested_ids(&json!({"ids": ["u_a", "u_b"]})), vec!["u_a", "u_b"]);
        assert_eq!(
            requested_ids(&json!({"content": "Opening.\n```json file=\"ids.json\"\n[{\"id\":\"u_a\"},{\"id\":\"u_c\"}]\n```"})),
            vec!["u_a", "u_c"]
        );
        assert_eq!(requested_ids(&json!({"content": "{ \"id\": \"p_1\" }"})), vec!["p_1"]);
        assert!(requested_ids(&json!({"content": "{ \"name\": \"x\" }"})).is_empty());
    }
}
