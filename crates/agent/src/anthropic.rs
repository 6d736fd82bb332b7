//! Anthropic Messages API provider implementation.

use async_trait::async_trait;
use proto::{LlmError, ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::llm::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, TokenUsage};

const ANTHROPIC_API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

// ── Request types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: AnthropicContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: Value,
}

// ── Response types ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

// ── Provider ───────────────────────────────────────────────────────────────────

/// Anthropic Messages API LLM provider.
///
/// Authenticates with a single static API key (`x-api-key` header).
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Creates a provider targeting the default Anthropic API endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".to_string(),
        }
    }

    /// Creates a provider targeting a custom base URL (useful for proxies/tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, LlmError> {
        // Extract system messages into top-level system field (Anthropic requirement).
        let system_parts: Vec<String> = req
            .messages
            .iter()
            .filter(|m| m.role == proto::Role::System)
            .map(|m| m.content.clone())
            .collect();
        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n"))
        };

        let messages = convert_messages(&req.messages);
        let tools: Vec<AnthropicTool> = req.tools.iter().map(convert_tool).collect();

        let anthropic_req = AnthropicRequest {
            model: req.model.clone(),
            max_tokens: MAX_TOKENS,
            system,
            messages,
            tools,
        };

        let url = format!("{}/v1/messages", self.base_url);
        debug!(
            model = %req.model,
            messages = %anthropic_req.messages.len(),
            tools = %anthropic_req.tools.len(),
            "Sending request to Anthropic"
        );

        let response = self
            .client
            .post(&url)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .json(&anthropic_req)
            .send()
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let status = response.status();
        debug!(status = %status.as_u16(), "Anthropic response received");
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimit);
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        if !status.is_success() {
            let preview: String = body.chars().take(500).collect();
            return Err(LlmError::Api(format!("HTTP {status}: {preview}")));
        }

        let anthropic_resp: AnthropicResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::InvalidResponse(format!(
                "Deserialization error: {e}; body: {}",
                body.chars().take(200).collect::<String>()
            ))
        })?;

        let usage = anthropic_resp
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
            })
            .unwrap_or_default();

        if anthropic_resp.stop_reason.as_deref() == Some("tool_use") {
            let tool_calls: Vec<ToolCall> = anthropic_resp
                .content
                .into_iter()
                .filter_map(|block| {
                    if let ContentBlock::ToolUse { id, name, input } = block {
                        Some(ToolCall {
                            id,
                            name,
                            arguments: input,
                        })
                    } else {
                        None
                    }
                })
                .collect();
            return Ok(ChatResponse::ToolCalls(tool_calls, usage));
        }

        let text = anthropic_resp
            .content
            .into_iter()
            .filter_map(|block| {
                if let ContentBlock::Text { text } = block {
                    Some(text)
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        Ok(ChatResponse::Text(text, usage))
    }
}

// ── Conversion helpers ─────────────────────────────────────────────────────────

/// Converts internal chat messages into Anthropic format.
///
/// System messages are skipped (handled via the top-level `system`
/// field). Consecutive `Role::Tool` messages are merged into a single
/// user message with multiple `tool_result` blocks, since Anthropic
/// forbids consecutive same-role messages.
fn convert_messages(messages: &[ChatMessage]) -> Vec<AnthropicMessage> {
    let mut result: Vec<AnthropicMessage> = Vec::new();
    let mut pending_tool_results: Vec<ContentBlock> = Vec::new();

    for msg in messages {
        if msg.role != proto::Role::Tool && !pending_tool_results.is_empty() {
            result.push(AnthropicMessage {
                role: "user",
                content: AnthropicContent::Blocks(std::mem::take(&mut pending_tool_results)),
            });
        }
        match msg.role {
            proto::Role::System => {
                // Already extracted to the top-level system field.
            }
            proto::Role::User => {
                result.push(AnthropicMessage {
                    role: "user",
                    content: AnthropicContent::Text(msg.content.clone()),
                });
            }
            proto::Role::Assistant => {
                if let Some(tool_calls) = &msg.tool_calls {
                    let blocks: Vec<ContentBlock> = tool_calls
                        .iter()
                        .map(|tc| ContentBlock::ToolUse {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            input: tc.arguments.clone(),
                        })
                        .collect();
                    result.push(AnthropicMessage {
                        role: "assistant",
                        content: AnthropicContent::Blocks(blocks),
                    });
                } else {
                    result.push(AnthropicMessage {
                        role: "assistant",
                        content: AnthropicContent::Text(msg.content.clone()),
                    });
                }
            }
            proto::Role::Tool => {
                pending_tool_results.push(ContentBlock::ToolResult {
                    tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                    content: msg.content.clone(),
                });
            }
        }
    }

    if !pending_tool_results.is_empty() {
        result.push(AnthropicMessage {
            role: "user",
            content: AnthropicContent::Blocks(pending_tool_results),
        });
    }

    result
}

/// Converts internal tool schema into Anthropic's tool declaration.
fn convert_tool(t: &ToolDefinition) -> AnthropicTool {
    AnthropicTool {
        name: t.name.clone(),
        description: t.description.clone(),
        input_schema: t.parameters.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_messages_skips_system_role() {
        let messages = vec![ChatMessage::system("prompt"), ChatMessage::user("hello")];
        let converted = convert_messages(&messages);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, "user");
    }

    #[test]
    fn convert_messages_merges_consecutive_tool_results() {
        let messages = vec![
            ChatMessage::user("route please"),
            ChatMessage::assistant_tool_calls(vec![
                ToolCall {
                    id: "tc1".to_string(),
                    name: "open_browser".to_string(),
                    arguments: serde_json::json!({}),
                },
                ToolCall {
                    id: "tc2".to_string(),
                    name: "navigate_baidu_map".to_string(),
                    arguments: serde_json::json!({"start_location":"A","end_location":"B"}),
                },
            ]),
            ChatMessage::tool_result("tc1", "open_browser", "浏览器已成功打开"),
            ChatMessage::tool_result("tc2", "navigate_baidu_map", "已设置导航"),
        ];

        let converted = convert_messages(&messages);
        assert_eq!(converted.len(), 3);
        assert_eq!(converted[1].role, "assistant");
        assert_eq!(converted[2].role, "user");
        let AnthropicContent::Blocks(blocks) = &converted[2].content else {
            panic!("expected blocks for merged tool results");
        };
        assert_eq!(blocks.len(), 2);
        assert!(matches!(
            &blocks[0],
            ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id == "tc1"
        ));
    }

    #[test]
    fn convert_messages_flushes_tool_results_before_next_user_turn() {
        let messages = vec![
            ChatMessage::tool_result("tc1", "close_browser", "浏览器已关闭"),
            ChatMessage::user("thanks"),
        ];
        let converted = convert_messages(&messages);
        assert_eq!(converted.len(), 2);
        assert!(matches!(converted[0].content, AnthropicContent::Blocks(_)));
        assert!(matches!(converted[1].content, AnthropicContent::Text(_)));
    }

    #[test]
    fn convert_tool_maps_schema_to_input_schema() {
        let def = ToolDefinition::new(
            "navigate_gaode_map",
            "在高德地图中设置从起点到终点的导航路线",
            serde_json::json!({"type":"object","required":["start_location","end_location"]}),
        );
        let tool = convert_tool(&def);
        assert_eq!(tool.name, "navigate_gaode_map");
        assert_eq!(tool.input_schema["required"][0], "start_location");
    }

    #[test]
    fn request_serialization_omits_empty_optional_fields() {
        let req = AnthropicRequest {
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: MAX_TOKENS,
            system: None,
            messages: vec![AnthropicMessage {
                role: "user",
                content: AnthropicContent::Text("hi".to_string()),
            }],
            tools: vec![],
        };
        let json = serde_json::to_value(&req).expect("serialize");
        assert!(json.get("system").is_none());
        assert!(json.get("tools").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn response_with_tool_use_block_deserializes() {
        let body = r#"{
            "content": [
                {"type":"tool_use","id":"tc1","name":"open_browser","input":{}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 120, "output_tokens": 30}
        }"#;
        let resp: AnthropicResponse = serde_json::from_str(body).expect("deserialize");
        assert_eq!(resp.stop_reason.as_deref(), Some("tool_use"));
        assert_eq!(resp.usage.as_ref().map(|u| u.input_tokens), Some(120));
        assert!(matches!(resp.content[0], ContentBlock::ToolUse { .. }));
    }

    #[test]
    fn provider_builders_construct_provider_instances() {
        let _provider = AnthropicProvider::new("sk-key");
        let _provider = AnthropicProvider::with_base_url("sk-key", "http://localhost:9999");
    }
}
