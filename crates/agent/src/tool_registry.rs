//! Tool registry used by the runtime to list and dispatch tools.
//!
//! This is the tool-call boundary: lookup failures, missing required
//! parameters, and every underlying tool failure come back as error
//! results — nothing here panics or lets an error escape to the model.

use std::collections::HashMap;
use std::sync::Arc;

use proto::{ToolDefinition, ToolResult};
use serde_json::Value;
use tools::Tool;
use tracing::debug;

/// Registry of available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    // Registration order, so the catalog shown to the LLM is stable.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Tool names are unique; re-registering a name
    /// replaces the earlier tool.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        debug!("Registering tool: {name}");
        if self.tools.insert(name.clone(), Arc::new(tool)).is_none() {
            self.order.push(name);
        }
    }

    /// Get tool definitions for the LLM, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.parameters_schema()))
            .collect()
    }

    /// Dispatch a tool call.
    pub async fn execute(&self, call_id: &str, name: &str, args: Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolResult::error(call_id, name, format!("未知工具: {name}"));
        };

        if let Some(missing) = first_missing_required(&tool.parameters_schema(), &args) {
            return ToolResult::error(
                call_id,
                name,
                format!("工具 '{name}' 缺少必需参数 '{missing}'"),
            );
        }

        debug!("Executing tool: {name} (call_id: {call_id})");
        tool.execute(call_id, args).await
    }

    /// Returns the list of registered tool names in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the first parameter declared `required` by the schema that is
/// absent from the call arguments, if any.
fn first_missing_required(schema: &Value, args: &Value) -> Option<String> {
    let required = schema["required"].as_array()?;
    required
        .iter()
        .filter_map(Value::as_str)
        .find(|param| args.get(param).is_none())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use proto::ToolResult;

    use super::*;

    struct EchoTool;

    #[async_trait]
    impl tools::Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the input"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type":"object",
                "properties":{"value":{"type":"string"}},
                "required":["value"]
            })
        }

        async fn execute(&self, call_id: &str, args: serde_json::Value) -> ToolResult {
            let value = args["value"].as_str().unwrap_or_default().to_string();
            ToolResult::success(call_id, self.name(), value)
        }
    }

    #[tokio::test]
    async fn register_and_execute_known_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let result = registry
            .execute("c1", "echo", serde_json::json!({"value":"hello"}))
            .await;
        assert!(!result.is_error);
        assert_eq!(result.output, "hello");
        assert_eq!(result.tool_name, "echo");
    }

    #[tokio::test]
    async fn execute_unknown_tool_returns_error() {
        let registry = ToolRegistry::new();
        let result = registry
            .execute("c2", "missing", serde_json::json!({}))
            .await;
        assert!(result.is_error);
        assert!(result.output.contains("未知工具"));
        assert!(result.output.contains("missing"));
    }

    #[tokio::test]
    async fn execute_with_missing_required_parameter_returns_error() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let result = registry.execute("c3", "echo", serde_json::json!({})).await;
        assert!(result.is_error);
        assert!(result.output.contains("缺少必需参数"));
        assert!(result.output.contains("value"));

        // Non-object arguments are also just a missing parameter, not a panic.
        let result = registry
            .execute("c4", "echo", serde_json::Value::Null)
            .await;
        assert!(result.is_error);
    }

    #[test]
    fn definitions_and_names_keep_registration_order() {
        struct NoopTool(&'static str);

        #[async_trait]
        impl tools::Tool for NoopTool {
            fn name(&self) -> &str {
                self.0
            }
            fn description(&self) -> &str {
                "noop"
            }
            fn parameters_schema(&self) -> serde_json::Value {
                serde_json::json!({"type":"object","properties":{},"required":[]})
            }
            async fn execute(&self, call_id: &str, _args: serde_json::Value) -> ToolResult {
                ToolResult::success(call_id, self.name(), "ok")
            }
        }

        let mut registry = ToolRegistry::new();
        registry.register(NoopTool("open_browser"));
        registry.register(NoopTool("navigate_baidu_map"));
        registry.register(NoopTool("navigate_gaode_map"));
        registry.register(NoopTool("close_browser"));

        assert_eq!(
            registry.tool_names(),
            vec![
                "open_browser",
                "navigate_baidu_map",
                "navigate_gaode_map",
                "close_browser"
            ]
        );

        let defs = registry.definitions();
        assert_eq!(defs.len(), 4);
        assert_eq!(defs[0].name, "open_browser");
        assert_eq!(defs[3].name, "close_browser");
    }

    #[test]
    fn first_missing_required_reports_in_schema_order() {
        let schema = serde_json::json!({
            "type": "object",
            "required": ["start_location", "end_location"]
        });
        let args = serde_json::json!({"end_location": "上海"});
        assert_eq!(
            first_missing_required(&schema, &args),
            Some("start_location".to_string())
        );

        let complete = serde_json::json!({"start_location":"北京","end_location":"上海"});
        assert_eq!(first_missing_required(&schema, &complete), None);
    }
}
