//! Conversation runtime, tool registry, and LLM adapter interfaces.

pub mod anthropic;
pub mod llm;
pub mod runtime;
pub mod tool_registry;

/// Anthropic Messages API provider.
pub use anthropic::AnthropicProvider;
/// Chat request/response models and provider interface.
pub use llm::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, TokenUsage};
/// Main runtime conversation loop.
pub use runtime::{AgentRuntime, navigation_system_prompt};
/// Runtime tool registry and dispatch boundary.
pub use tool_registry::ToolRegistry;
