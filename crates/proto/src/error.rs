use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// LLM provider error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool registration/dispatch error.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Browser session error.
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// LLM provider errors
#[derive(Debug, Error)]
pub enum LlmError {
    /// Remote API failure.
    #[error("{0}")]
    Api(String),

    /// Provider throttled the request.
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Provider response schema/content was invalid.
    #[error("Invalid response from LLM: {0}")]
    InvalidResponse(String),

    /// Runtime exceeded configured tool-call rounds.
    #[error("Max tool rounds exceeded")]
    MaxToolRoundsExceeded,

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Tool dispatch errors
#[derive(Debug, Error)]
pub enum ToolError {
    /// Requested tool is unknown.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// A parameter declared `required` is absent from the call arguments.
    #[error("Missing required parameter '{param}' for tool '{tool}'")]
    MissingParameter { tool: String, param: String },

    /// Tool call arguments are invalid.
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// Tool operation failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Browser session errors
///
/// These map one-to-one onto the session state machine: operations that
/// require an open session fail with [`BrowserError::SessionNotOpen`]
/// without touching browser state.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Navigate/interaction requested while the session is closed.
    #[error("Browser session is not open")]
    SessionNotOpen,

    /// Chromium process or CDP handler could not be started.
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    /// Page navigation failed or timed out.
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Session teardown reported an error; the session is closed regardless.
    #[error("Browser teardown failed: {0}")]
    TeardownFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_config_error_variant() {
        let err = ConfigError::MissingField("anthropic_api_key".to_string());
        assert!(err.to_string().contains("Missing required field"));
    }

    #[test]
    fn wraps_llm_error_into_top_level_error() {
        let err: Error = LlmError::MaxToolRoundsExceeded.into();
        assert!(err.to_string().contains("Max tool rounds exceeded"));
    }

    #[test]
    fn wraps_tool_error_into_top_level_error() {
        let err: Error = ToolError::MissingParameter {
            tool: "navigate_baidu_map".to_string(),
            param: "start_location".to_string(),
        }
        .into();
        assert!(err.to_string().contains("Tool error"));
        assert!(err.to_string().contains("start_location"));
    }

    #[test]
    fn wraps_browser_error_into_top_level_error() {
        let err: Error = BrowserError::SessionNotOpen.into();
        assert!(err.to_string().contains("Browser error"));

        let err: Error = BrowserError::TeardownFailed("cdp closed".to_string()).into();
        assert!(err.to_string().contains("teardown failed"));
    }
}
