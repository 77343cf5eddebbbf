use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use canvas_actions::RootAlias;
use canvas_context::Workspace;
use canvas_types::{FocusInfo, ToolResult, ToolSchema};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

pub mod error;
pub mod host;
pub mod mutation;
pub mod open_comp;
pub mod open_dsl;

pub use error::{detect_transport_error, ToolError};
pub use host::{CanvasHost, HostError};
pub use mutation::{MutationTool, MutationToolKind};
pub use open_comp::OpenCompTool;
pub use open_dsl::OpenDslTool;

#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;

    /// Called with the whole response text received so far, on every streamed chunk.
    async fn stream(&self, _content: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolResult>;
    async fn execute_with_cancel(
        &self,
        args: Value,
        _cancel: CancellationToken,
    ) -> anyhow::Result<ToolResult> {
        self.execute(args).await
    }
}

/// Everything a turn's tools share.
#[derive(Clone)]
pub struct ToolEnv {
    pub host: Arc<dyn CanvasHost>,
    pub workspace: Arc<RwLock<Workspace>>,
    /// Focus at the start of the turn.
    pub focus: FocusInfo,
    pub root_alias: RootAlias,
    pub conversation_id: String,
    pub turn_id: String,
}

#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    /// Fresh tools for one turn; mutation tools start with fresh parsers.
    pub fn new(env: ToolEnv) -> Result<Self, ToolSchemaValidationError> {
        let mut tools: Vec<Arc<dyn Tool>> = [
            MutationToolKind::GeneratePage,
            MutationToolKind::RefactorComponent,
            MutationToolKind::ModifyComponents,
        ]
        .into_iter()
        .map(|kind| Arc::new(MutationTool::new(kind, env.clone())) as Arc<dyn Tool>)
        .collect();
        tools.push(Arc::new(OpenDslTool::new(env.clone())));
        tools.push(Arc::new(OpenCompTool::new(env)));
        Self::from_tools(tools)
    }

    /// Fails on a duplicate name or a schema some providers would refuse.
    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Result<Self, ToolSchemaValidationError> {
        let mut map: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        for tool in tools {
            let schema = tool.schema();
            validate_schema_node(&schema.name, "$", &schema.input_schema)?;
            if map.contains_key(&schema.name) {
                return Err(ToolSchemaValidationError {
                    tool_name: schema.name,
                    path: "$".to_string(),
                    reason: "duplicate tool name".to_string(),
                });
            }
            map.insert(schema.name, tool);
        }
        Ok(Self {
            tools: Arc::new(RwLock::new(map)),
        })
    }

    pub async fn list(&self) -> Vec<ToolSchema> {
        let mut schemas = self
            .tools
            .read()
            .await
            .values()
            .map(|tool| tool.schema())
            .collect::<Vec<_>>();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Forwards the response received so far; unknown tools ignore it.
    pub async fn stream(&self, name: &str, content: &str) -> anyhow::Result<()> {
        let tool = self.tools.read().await.get(name).cloned();
        match tool {
            Some(tool) => tool.stream(content).await,
            None => Ok(()),
        }
    }

    pub async fn execute(&self, name: &str, args: Value) -> anyhow::Result<ToolResult> {
        self.execute_with_cancel(name, args, CancellationToken::new())
            .await
    }

    pub async fn execute_with_cancel(
        &self,
        name: &str,
        args: Value,
        cancel: CancellationToken,
    ) -> anyhow::Result<ToolResult> {
        let tool = self.tools.read().await.get(name).cloned();
        let Some(tool) = tool else {
            tracing::warn!(target: "canvas.tools", tool = name, "unknown tool");
            return Ok(ToolResult {
                output: format!("Unknown tool: {name}"),
                metadata: json!({}),
            });
        };
        tool.execute_with_cancel(args, cancel).await
    }
}

/// A tool input schema some providers would refuse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid tool schema `{tool_name}` at `{path}`: {reason}")]
pub struct ToolSchemaValidationError {
    pub tool_name: String,
    pub path: String,
    pub reason: String,
}

pub fn validate_tool_schemas(schemas: &[ToolSchema]) -> Result<(), ToolSchemaValidationError> {
    schemas
        .iter()
        .try_for_each(|schema| validate_schema_node(&schema.name, "$", &schema.input_schema))
}

fn validate_schema_node(
    tool_name: &str,
    path: &str,
    value: &Value,
) -> Result<(), ToolSchemaValidationError> {
    let Some(obj) = value.as_object() else {
        return Ok(());
    };

    if obj.get("type").and_then(Value::as_str) == Some("array") && !obj.contains_key("items") {
        return Err(ToolSchemaValidationError {
            tool_name: tool_name.to_string(),
            path: path.to_string(),
            reason: "array schema missing items".to_string(),
        });
    }

    for key in ["items", "additionalProperties"] {
        if let Some(child) = obj.get(key) {
            validate_schema_node(tool_name, &format!("{path}.{key}"), child)?;
        }
    }
    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (key, child) in props {
            validate_schema_node(tool_name, &format!("{path}.properties.{key}"), child)?;
        }
    }
    for key in ["oneOf", "anyOf", "allOf"] {
        let Some(variants) = obj.get(key).and_then(Value::as_array) else {
            continue;
        };
        for (idx, child) in variants.iter().enumerate() {
            validate_schema_node(tool_name, &format!("{path}.{key}[{idx}]"), child)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSchema(ToolSchema);

    #[async_trait]
    impl Tool for FixedSchema {
        fn schema(&self) -> ToolSchema {
            self.0.clone()
        }

        async fn execute(&self, _args: Value) -> anyhow::Result<ToolResult> {
            Ok(ToolResult {
                output: self.0.name.clone(),
                metadata: json!({}),
            })
        }
    }

    fn fixed(name: &str, input_schema: Value) -> Arc<dyn Tool> {
        Arc::new(FixedSchema(ToolSchema {
            name: name.to_string(),
            description: format!("{name} tool"),
            input_schema,
        }))
    }

    #[test]
    fn validator_rejects_array_without_items() {
        let schemas = vec![ToolSchema {
            name: "bad".to_string(),
            description: "bad schema".to_string(),
            input_schema: json!({
                "type":"object",
                "properties":{"ids":{"type":"array"}}
            }),
        }];
        let err = validate_tool_schemas(&schemas).expect_err("expected schema validation failure");
        assert_eq!(err.tool_name, "bad");
        assert!(err.path.contains("properties.ids"));
    }

    #[test]
    fn registry_refuses_invalid_schema() {
        let err = ToolRegistry::from_tools(vec![fixed(
            "bad",
            json!({"type":"object","properties":{"ids":{"type":"array"}}}),
        )])
        .err()
        .expect("invalid schema");
        assert_eq!(err.tool_name, "bad");
        assert_eq!(err.path, "$.properties.ids");
    }

    #[test]
    fn registry_refuses_duplicate_names() {
        let schema = json!({"type":"object","properties":{"content":{"type":"string"}}});
        let err = ToolRegistry::from_tools(vec![
            fixed("open-dsl-document", schema.clone()),
            fixed("open-dsl-document", schema),
        ])
        .err()
        .expect("duplicate name");
        assert_eq!(err.tool_name, "open-dsl-document");
        assert_eq!(err.reason, "duplicate tool name");
    }

    #[tokio::test]
    async fn registry_routes_to_the_named_tool() {
        let schema = json!({"type":"object"});
        let registry =
            ToolRegistry::from_tools(vec![fixed("a", schema.clone()), fixed("b", schema)])
                .expect("registry");
        let result = registry.execute("b", json!({})).await.expect("execute");
        assert_eq!(result.output, "b");
        assert_eq!(registry.list().await.len(), 2);
    }
}
