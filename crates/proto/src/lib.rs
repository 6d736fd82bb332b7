//! Shared protocol types for the map-navigation agent.
//!
//! This crate defines the tool-call boundary structures exchanged with
//! the LLM and the strongly-typed error enums shared across the
//! workspace.

pub mod error;
pub mod message;
pub mod tool;

/// Re-export of all protocol error types.
pub use error::*;
/// Re-export of the conversation role type.
pub use message::Role;
/// Re-export of tool call definition and result types.
pub use tool::{ToolCall, ToolDefinition, ToolResult};
