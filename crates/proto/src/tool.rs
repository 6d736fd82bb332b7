use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declaration of a callable tool exposed to the LLM.
///
/// `parameters` is a JSON-Schema-shaped object (`type: object`,
/// `properties`, `required`) describing the accepted arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name within a registry.
    pub name: String,
    /// Natural-language description shown to the model for tool selection.
    pub description: String,
    /// JSON schema of accepted arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Creates a tool definition from name, description, and parameter schema.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names of parameters this tool declares as required.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters["required"]
            .as_array()
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back in the result.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON arguments object.
    pub arguments: Value,
}

/// Result of executing a tool call, returned to the model as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Call id this result answers.
    pub call_id: String,
    /// Name of the tool that produced the result.
    pub tool_name: String,
    /// Human-readable output text.
    pub output: String,
    /// Whether the call failed. Failures are surfaced as results, never
    /// as faults crossing the tool-call boundary.
    pub is_error: bool,
}

impl ToolResult {
    /// Creates a successful tool result.
    pub fn success(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            output: output.into(),
            is_error: false,
        }
    }

    /// Creates a failed tool result with a human-readable message.
    pub fn error(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            output: output.into(),
            is_error: true,
        }
    }
}
