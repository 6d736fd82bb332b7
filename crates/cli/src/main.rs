//! CLI entrypoint for the map navigation assistant.

mod config;

use clap::Parser;

#[cfg(not(test))]
use std::sync::Arc;

#[cfg(not(test))]
use agent::{AgentRuntime, AnthropicProvider, ToolRegistry, navigation_system_prompt};
#[cfg(not(test))]
use config::Config;
#[cfg(not(test))]
use tools::{CloseBrowserTool, MapProvider, NavigateMapTool, OpenBrowserTool, TravelMode};
#[cfg(not(test))]
use tracing::{info, warn};
#[cfg(not(test))]
use tracing_subscriber::{EnvFilter, fmt};

/// Top-level command-line arguments for the mapnav application.
#[derive(Parser)]
#[command(name = "mapnav")]
#[command(about = "LLM-driven map navigation assistant", version = "0.1.0")]
struct Cli {
    /// Navigation request, e.g. "从北京到上海". Omit for interactive mode.
    instruction: Option<String>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Map provider override (baidu, gaode)
    #[arg(long)]
    map: Option<String>,

    /// Travel mode override (driving, walking)
    #[arg(long)]
    mode: Option<String>,

    /// Model id override
    #[arg(long)]
    model: Option<String>,
}

#[cfg(not(test))]
#[tokio::main]
/// Program entrypoint.
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    // Load config
    let mut config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Failed to load config ({e}), using defaults");
        Config::default()
    });
    if let Some(map) = cli.map {
        config.map = map;
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    config.validate()?;

    let provider: MapProvider = config.map.parse().map_err(anyhow::Error::msg)?;
    let mode: TravelMode = config.mode.parse().map_err(anyhow::Error::msg)?;

    let runtime = build_runtime(&config)?;
    let system_prompt = navigation_system_prompt(provider, mode);

    match cli.instruction {
        Some(instruction) => run_once(&runtime, &system_prompt, &instruction).await,
        None => run_interactive(&runtime, &system_prompt).await,
    }
}

#[cfg(not(test))]
/// Creates a runtime with the map navigation tools and LLM provider.
fn build_runtime(config: &Config) -> anyhow::Result<AgentRuntime> {
    let mut registry = ToolRegistry::new();
    registry.register(OpenBrowserTool::new());
    registry.register(NavigateMapTool::baidu());
    registry.register(NavigateMapTool::gaode());
    registry.register(CloseBrowserTool::new());
    let registry = Arc::new(registry);

    let llm = Arc::new(AnthropicProvider::new(&config.anthropic_api_key));

    Ok(AgentRuntime::new(
        llm,
        registry,
        &config.model,
        config.max_tool_rounds,
    ))
}

#[cfg(not(test))]
/// Processes one request and exits.
async fn run_once(
    runtime: &AgentRuntime,
    system_prompt: &str,
    instruction: &str,
) -> anyhow::Result<()> {
    match runtime.process(system_prompt, instruction).await {
        Ok((text, usage)) => {
            println!("{text}");
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Request complete"
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("错误: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(not(test))]
/// Reads navigation requests from stdin until "quit" or EOF.
async fn run_interactive(runtime: &AgentRuntime, system_prompt: &str) -> anyhow::Result<()> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

    println!("地图导航助手已启动。输入导航需求 (例如: 从北京到上海)，输入 quit 退出。");

    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all("> ".as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }

        match runtime.process(system_prompt, input).await {
            Ok((text, usage)) => {
                println!("{text}");
                info!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "Request complete"
                );
            }
            Err(e) => {
                eprintln!("错误: {e}");
            }
        }
    }

    println!("再见。");
    Ok(())
}
