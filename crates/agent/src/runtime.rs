//! Runtime conversation loop for the navigation assistant.
//!
//! One `process()` call is one conversation turn: the user's request is
//! sent to the LLM together with the tool catalog, requested tool calls
//! are dispatched through the registry, and the loop repeats until the
//! model answers with text or the round budget runs out. History lives
//! in memory for the duration of the call; nothing is persisted.

use std::sync::Arc;

use proto::LlmError;
use tracing::{debug, info, warn};

use crate::{
    llm::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, TokenUsage},
    tool_registry::ToolRegistry,
};

use tools::{MapProvider, TravelMode};

/// The main agent runtime: chat loop plus tool dispatch.
pub struct AgentRuntime {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    model: String,
    max_tool_rounds: usize,
}

impl AgentRuntime {
    /// Creates a runtime with an LLM provider, tool registry, target
    /// model, and tool-round budget.
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            model: model.into(),
            max_tool_rounds,
        }
    }

    /// Processes one user request and returns the assistant's final
    /// text response with accumulated token usage.
    pub async fn process(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<(String, TokenUsage), proto::Error> {
        let mut messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_message),
        ];

        let tool_defs = self.tools.definitions();
        let mut round = 0;
        let mut total_usage = TokenUsage::default();

        loop {
            if round >= self.max_tool_rounds {
                warn!("Max tool rounds ({}) reached", self.max_tool_rounds);
                return Err(proto::Error::Llm(LlmError::MaxToolRoundsExceeded));
            }

            let req = ChatRequest {
                messages: messages.clone(),
                tools: tool_defs.clone(),
                model: self.model.clone(),
            };
            debug!("LLM call (round {round})");
            let t0 = std::time::Instant::now();
            let response = self.llm.chat(req).await.map_err(proto::Error::Llm)?;
            debug!(elapsed_ms = %t0.elapsed().as_millis(), round = %round, "LLM response received");

            match response {
                ChatResponse::Text(text, usage) => {
                    info!("Agent final response: {text:.50}...");
                    total_usage.add(&usage);
                    return Ok((text, total_usage));
                }

                ChatResponse::ToolCalls(tool_calls, usage) => {
                    debug!(
                        "Tool calls requested: {:?}",
                        tool_calls.iter().map(|tc| &tc.name).collect::<Vec<_>>()
                    );
                    total_usage.add(&usage);
                    messages.push(ChatMessage::assistant_tool_calls(tool_calls.clone()));
                    for tc in &tool_calls {
                        let result = self
                            .tools
                            .execute(&tc.id, &tc.name, tc.arguments.clone())
                            .await;
                        if result.is_error {
                            warn!(tool = %tc.name, "tool call failed: {}", result.output);
                        } else {
                            info!(tool = %tc.name, "tool call succeeded");
                        }
                        messages.push(ChatMessage::tool_result(&tc.id, &tc.name, &result.output));
                    }
                    round += 1;
                }
            }
        }
    }
}

/// Builds the navigation-workflow system prompt steering the model
/// toward the selected map provider and travel mode.
pub fn navigation_system_prompt(provider: MapProvider, mode: TravelMode) -> String {
    let (map_tool, map_label) = match provider {
        MapProvider::Baidu => ("navigate_baidu_map", "百度"),
        MapProvider::Gaode => ("navigate_gaode_map", "高德"),
    };
    format!(
        r#"你是一个导航助手。用户会告诉你起点和终点，你需要调用工具在浏览器中设置导航。

可用工具:
1. open_browser - 打开浏览器
2. {map_tool} - 在{map_label}地图中设置导航，需要参数: start_location 和 end_location
3. close_browser - 关闭浏览器

请按照以下步骤操作:
1. 首先调用 open_browser 打开浏览器
2. 从用户输入中提取起点和终点，调用 {map_tool} 设置导航，mode 参数使用 "{mode}"
3. 操作完成后给用户反馈

注意: 直接从用户的输入中提取地点名称，不要过度解析或改变地点名称。"#,
        mode = mode.baidu_flag()
    )
}
