use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use surelook_holmes::config::{DEFAULT_BIND, DEFAULT_MCP_PATH};
use surelook_holmes::{AppConfig, create_server, logging};
use tracing::info;

#[derive(Parser)]
#[command(name = "surelook-holmes")]
#[command(about = "Surelook Holmes MCP server")]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(flatten)]
    http: HttpArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct HttpArgs {
    /// Bind address for the HTTP transport, e.g. 0.0.0.0:8000
    #[arg(long, global = true, env = "MCP_BIND", default_value = DEFAULT_BIND)]
    bind: String,
    /// Path the MCP endpoint is mounted at
    #[arg(long, global = true, env = "MCP_PATH", default_value = DEFAULT_MCP_PATH)]
    path: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as an MCP streamable HTTP server (default)
    McpHttp,
    /// Run as an MCP stdio server (for use in mcp.json)
    McpStdio,
    /// Print the registered tools and resource templates, then exit
    ListCapabilities,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::McpHttp);

    logging::init(matches!(command, Commands::McpStdio));

    let server = create_server(&cli.config)?;

    match command {
        Commands::McpHttp => {
            info!("Starting Surelook Holmes MCP server on streamable HTTP transport");
            surelook_holmes::server::start_mcp_http(server, &cli.http.bind, &cli.http.path)
                .await?;
        }
        Commands::McpStdio => {
            info!("Starting Surelook Holmes MCP server on stdio transport");
            surelook_holmes::server::serve_stdio(server).await?;
        }
        Commands::ListCapabilities => {
            println!("Tools:");
            for name in server.tool_registry().list_names() {
                println!("  {}", name);
            }
            println!("Resource templates:");
            for template in server.resource_registry().list_uri_templates() {
                println!("  {}", template);
            }
        }
    }

    Ok(())
}
