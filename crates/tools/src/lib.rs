//! Tool trait and the map-navigation tool implementations.
//!
//! The agent runtime uses this crate to expose the browser-session
//! lifecycle and map deep-link navigation as callable tools.

pub mod browser;
pub mod deeplink;
pub mod maps;

pub use browser::{BrowserSession, shared_session};
pub use deeplink::{MapProvider, TravelMode, directions_url};
pub use maps::{CloseBrowserTool, NavigateMapTool, OpenBrowserTool};

use async_trait::async_trait;
use proto::ToolResult;

/// Trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name exposed to the LLM.
    fn name(&self) -> &str;
    /// Human-readable description for tool selection.
    fn description(&self) -> &str;
    /// JSON schema for accepted tool arguments.
    fn parameters_schema(&self) -> serde_json::Value;
    /// Executes the tool with the given call id and JSON args.
    async fn execute(&self, call_id: &str, args: serde_json::Value) -> ToolResult;
}
