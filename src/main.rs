//! OpenCTI MCP Agent
//!
//! Serves OpenCTI threat intelligence tools to an MCP host over stdio, or
//! runs a single query from the command line and prints the JSON result.
//!
//! # Usage
//! ```bash
//! # Serve tools over stdio (default)
//! OPENCTI_URL=https://cti.example.com OPENCTI_TOKEN=... opencti-mcp
//!
//! # One-off queries
//! opencti-mcp search Emotet --limit 5
//! opencti-mcp indicators --pattern-type stix
//! opencti-mcp entity malware--0b8c5d4e-...
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use opencti_mcp::{OpenCtiClient, OpenCtiConfig, OpenCtiServer, OpenCtiTools, Record};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "opencti-mcp")]
#[command(about = "OpenCTI threat intelligence tools for MCP agents", long_about = None)]
#[command(version)]
struct Cli {
    /// OpenCTI URL (host or full /graphql endpoint)
    #[arg(long, env = "OPENCTI_URL", global = true)]
    url: Option<String>,

    /// OpenCTI API token
    #[arg(long, env = "OPENCTI_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "OPENCTI_TIMEOUT_SECS", default_value = "30", global = true)]
    timeout: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tools over stdio (default)
    Serve,

    /// Search all knowledge by keyword
    Search {
        keyword: String,
        #[arg(long, default_value = "5")]
        limit: u32,
    },

    /// List the latest indicators of compromise
    Indicators {
        #[arg(long, default_value = "10")]
        limit: u32,
        /// Pattern type filter (stix, pcre, sigma, snort, ...)
        #[arg(long)]
        pattern_type: Option<String>,
    },

    /// List the latest intelligence reports
    Reports {
        #[arg(long, default_value = "5")]
        limit: u32,
    },

    /// Show one entity by ID
    Entity { id: String },

    /// Find malware by name
    Malware {
        name: String,
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Find threat actors by name
    ThreatActor {
        name: String,
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Find vulnerabilities by CVE
    Vulnerability {
        cve: String,
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Find observables by value
    Observable {
        value: String,
        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs)?;

    let client = OpenCtiConfig::new(cli.url, cli.token)
        .map(|config| config.with_timeout(Duration::from_secs(cli.timeout)))
        .and_then(OpenCtiClient::new);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let tools = OpenCtiTools::from_result(client);
            info!(configured = tools.is_configured(), "Starting OpenCTI MCP server on stdio");

            let service = OpenCtiServer::new(tools)
                .serve(stdio())
                .await
                .context("Failed to start MCP server")?;
            service.waiting().await.context("MCP server stopped unexpectedly")?;

            info!("OpenCTI MCP server stopped");
        }

        command => {
            let client = client.context("OpenCTI client is not configured")?;
            run_query(&client, command).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries the MCP protocol.
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

async fn run_query(client: &OpenCtiClient, command: Commands) -> Result<()> {
    let records: Vec<Record> = match command {
        Commands::Serve => return Ok(()),
        Commands::Search { keyword, limit } => client.search_knowledge(&keyword, limit).await?,
        Commands::Indicators { limit, pattern_type } => {
            client.get_indicators(limit, pattern_type.as_deref()).await?
        }
        Commands::Reports { limit } => client.get_reports(limit).await?,
        Commands::Entity { id } => {
            let entity = client.get_entity_details(&id).await?;
            if entity.is_empty() {
                println!("No entity found with ID '{}'.", id);
                return Ok(());
            }
            vec![entity]
        }
        Commands::Malware { name, limit } => client.search_malware(&name, limit).await?,
        Commands::ThreatActor { name, limit } => client.search_threat_actors(&name, limit).await?,
        Commands::Vulnerability { cve, limit } => client.search_vulnerabilities(&cve, limit).await?,
        Commands::Observable { value, limit } => client.search_observables(&value, limit).await?,
    };

    println!("{}", serde_json::to_string_pretty(&records)?);
    info!("✅ Returned {} records", records.len());
    Ok(())
}
