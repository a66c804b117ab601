//! spyglass-mcp - MCP server for AWS cost breakdowns and Google search

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use spyglass::config::{Config, ConfigOptions, Toolset};
use spyglass::mcp::{McpServer, TransportMode};
use spyglass::service::{AwsCostExplorer, CostExplorer, GoogleSearch, PageFetcher};
use spyglass::tools::{
    Ec2SpendTool, GoogleSearchTool, PageTextTool, SpendBreakdownTool, ToolRegistry,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Overall bound on a search request; page fetches use `--fetch-timeout`
const SEARCH_TIMEOUT_SECS: u64 = 30;

#[derive(ValueEnum, Debug, Copy, Clone)]
enum TransportArg {
    Auto,
    Lsp,
    Line,
}

#[derive(ValueEnum, Debug, Copy, Clone)]
enum ToolsetArg {
    Cost,
    Search,
    All,
}

#[derive(Parser, Debug)]
#[command(name = "spyglass-mcp")]
#[command(about = "MCP server for AWS cost breakdowns and Google search")]
struct Args {
    /// Tool groups to expose: cost, search, all
    #[arg(long, value_enum, default_value = "all")]
    toolset: ToolsetArg,

    /// Transport framing: auto, lsp, line
    #[arg(long, value_enum, default_value = "auto")]
    transport: TransportArg,

    /// AWS region for the Cost Explorer client
    #[arg(long)]
    aws_region: Option<String>,

    /// AWS shared config profile
    #[arg(long)]
    aws_profile: Option<String>,

    /// Base URL of the search engine
    #[arg(long)]
    search_base_url: Option<String>,

    /// Number of search results to return
    #[arg(long)]
    search_results: Option<usize>,

    /// Page fetch timeout in seconds
    #[arg(long)]
    fetch_timeout: Option<u64>,
}

async fn build_registry(config: &Config) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    if config.toolset.includes_cost() {
        let explorer: Arc<dyn CostExplorer> = Arc::new(
            AwsCostExplorer::from_env(config.aws_region.clone(), config.aws_profile.clone()).await,
        );
        registry.register(Arc::new(Ec2SpendTool::new(explorer.clone())));
        registry.register(Arc::new(SpendBreakdownTool::new(explorer)));
    }

    if config.toolset.includes_search() {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.fetch_timeout_secs))
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        let search = GoogleSearch::new(
            client.clone(),
            &config.search_base_url,
            config.search_results,
        );
        let fetcher = PageFetcher::new(client, Duration::from_secs(config.fetch_timeout_secs));

        registry.register(Arc::new(GoogleSearchTool::new(Arc::new(search))));
        registry.register(Arc::new(PageTextTool::new(Arc::new(fetcher))));
    }

    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the protocol
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let toolset = match args.toolset {
        ToolsetArg::Cost => Toolset::Cost,
        ToolsetArg::Search => Toolset::Search,
        ToolsetArg::All => Toolset::All,
    };

    let config = Config::new(ConfigOptions {
        toolset,
        aws_region: args.aws_region,
        aws_profile: args.aws_profile,
        search_base_url: args.search_base_url,
        search_results: args.search_results,
        fetch_timeout: args.fetch_timeout,
    })?;

    info!("Starting {} MCP server", config.toolset.server_name());

    let transport_mode = match args.transport {
        TransportArg::Auto => None,
        TransportArg::Lsp => Some(TransportMode::Lsp),
        TransportArg::Line => Some(TransportMode::Line),
    };

    let registry = Arc::new(build_registry(&config).await?);
    let server = McpServer::new(config.toolset.server_name(), registry, transport_mode);

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
