//! Map navigation tool catalog.
//!
//! Four tools drive the shared browser session: open it, set up a route
//! on Baidu or Gaode maps via a directions deep link, and close it.
//! Result sentences are operator-facing Chinese, matching the rest of
//! the assistant's surface.

use async_trait::async_trait;
use proto::{BrowserError, ToolResult};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::browser::{BrowserSession, shared_session};
use crate::deeplink::{MapProvider, TravelMode, directions_url};

/// Selector candidates for Baidu's "start navigation" control.
/// CSS-only: CDP element lookup is querySelector-based.
const BAIDU_NAV_SELECTORS: &[&str] = &["[class*=\"start-nav\"]", "[class*=\"start-guide\"]"];
/// Selector candidates for Gaode's "start navigation" control.
const GAODE_NAV_SELECTORS: &[&str] = &["[class*=\"start-navi\"]", "[class*=\"route-start\"]"];

/// Tool that opens the shared browser session.
pub struct OpenBrowserTool {
    session: Arc<Mutex<BrowserSession>>,
}

/// Tool that sets up a route on one map provider.
pub struct NavigateMapTool {
    provider: MapProvider,
    session: Arc<Mutex<BrowserSession>>,
}

/// Tool that closes the shared browser session.
pub struct CloseBrowserTool {
    session: Arc<Mutex<BrowserSession>>,
}

impl OpenBrowserTool {
    /// Creates the tool against the process-wide browser session.
    pub fn new() -> Self {
        Self {
            session: shared_session(),
        }
    }

    /// Creates the tool against a specific session (tests).
    pub fn with_session(session: Arc<Mutex<BrowserSession>>) -> Self {
        Self { session }
    }
}

impl Default for OpenBrowserTool {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigateMapTool {
    /// Baidu Maps navigation tool on the process-wide session.
    pub fn baidu() -> Self {
        Self {
            provider: MapProvider::Baidu,
            session: shared_session(),
        }
    }

    /// Gaode Maps navigation tool on the process-wide session.
    pub fn gaode() -> Self {
        Self {
            provider: MapProvider::Gaode,
            session: shared_session(),
        }
    }

    /// Creates the tool against a specific session (tests).
    pub fn with_session(provider: MapProvider, session: Arc<Mutex<BrowserSession>>) -> Self {
        Self { provider, session }
    }

    fn provider_label(&self) -> &'static str {
        match self.provider {
            MapProvider::Baidu => "百度",
            MapProvider::Gaode => "高德",
        }
    }

    fn nav_selectors(&self) -> &'static [&'static str] {
        match self.provider {
            MapProvider::Baidu => BAIDU_NAV_SELECTORS,
            MapProvider::Gaode => GAODE_NAV_SELECTORS,
        }
    }
}

impl CloseBrowserTool {
    /// Creates the tool against the process-wide browser session.
    pub fn new() -> Self {
        Self {
            session: shared_session(),
        }
    }

    /// Creates the tool against a specific session (tests).
    pub fn with_session(session: Arc<Mutex<BrowserSession>>) -> Self {
        Self { session }
    }
}

impl Default for CloseBrowserTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct NavigateArgs {
    start_location: String,
    end_location: String,
    mode: Option<String>,
}

#[async_trait]
impl crate::Tool for OpenBrowserTool {
    fn name(&self) -> &str {
        "open_browser"
    }

    fn description(&self) -> &str {
        "打开浏览器并准备导航"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, call_id: &str, _args: serde_json::Value) -> ToolResult {
        let mut session = self.session.lock().await;
        match session.open().await {
            Ok(()) => {
                info!("browser opened");
                ToolResult::success(call_id, self.name(), "浏览器已成功打开")
            }
            Err(e) => ToolResult::error(call_id, self.name(), format!("打开浏览器失败: {e}")),
        }
    }
}

#[async_trait]
impl crate::Tool for NavigateMapTool {
    fn name(&self) -> &str {
        match self.provider {
            MapProvider::Baidu => "navigate_baidu_map",
            MapProvider::Gaode => "navigate_gaode_map",
        }
    }

    fn description(&self) -> &str {
        match self.provider {
            MapProvider::Baidu => "在百度地图中设置从起点到终点的导航路线",
            MapProvider::Gaode => "在高德地图中设置从起点到终点的导航路线",
        }
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "start_location": {
                    "type": "string",
                    "description": "起点位置"
                },
                "end_location": {
                    "type": "string",
                    "description": "终点位置"
                },
                "mode": {
                    "type": "string",
                    "enum": ["driving", "walking"],
                    "description": "出行方式，默认 driving"
                }
            },
            "required": ["start_location", "end_location"]
        })
    }

    async fn execute(&self, call_id: &str, args: serde_json::Value) -> ToolResult {
        let parsed: NavigateArgs = match serde_json::from_value(args) {
            Ok(v) => v,
            Err(e) => {
                return ToolResult::error(call_id, self.name(), format!("参数无效: {e}"));
            }
        };

        let mode = match parsed.mode.as_deref() {
            None => TravelMode::Driving,
            Some(raw) => match TravelMode::from_str(raw) {
                Ok(mode) => mode,
                Err(e) => {
                    return ToolResult::error(call_id, self.name(), format!("参数无效: {e}"));
                }
            },
        };

        let url = directions_url(
            self.provider,
            mode,
            &parsed.start_location,
            &parsed.end_location,
        );

        let mut session = self.session.lock().await;
        match session.navigate_to(&url, self.nav_selectors()).await {
            Ok(()) => {
                info!(
                    provider = %self.provider,
                    mode = %mode,
                    "route set up: {} → {}",
                    parsed.start_location,
                    parsed.end_location
                );
                let mode_label = match mode {
                    TravelMode::Driving => "驾车",
                    TravelMode::Walking => "步行",
                };
                ToolResult::success(
                    call_id,
                    self.name(),
                    format!(
                        "已在{}地图中设置{}导航: {} → {} ({url})",
                        self.provider_label(),
                        mode_label,
                        parsed.start_location,
                        parsed.end_location
                    ),
                )
            }
            Err(BrowserError::SessionNotOpen) => {
                ToolResult::error(call_id, self.name(), "请先打开浏览器")
            }
            Err(e) => ToolResult::error(
                call_id,
                self.name(),
                format!("{}地图导航失败: {e}", self.provider_label()),
            ),
        }
    }
}

#[async_trait]
impl crate::Tool for CloseBrowserTool {
    fn name(&self) -> &str {
        "close_browser"
    }

    fn description(&self) -> &str {
        "关闭浏览器"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, call_id: &str, _args: serde_json::Value) -> ToolResult {
        let mut session = self.session.lock().await;
        match session.close().await {
            Ok(()) => {
                info!("browser closed");
                ToolResult::success(call_id, self.name(), "浏览器已关闭")
            }
            // The session is closed regardless; the teardown failure is
            // still reported to the caller.
            Err(e) => ToolResult::error(call_id, self.name(), format!("关闭浏览器失败: {e}")),
        }
    }
}
