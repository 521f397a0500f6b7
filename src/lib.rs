pub mod backend;
pub mod config;
pub mod logging;
pub mod resources;
pub mod server;
pub mod tools;
pub mod types;

pub use backend::{BackendClient, BackendError};
pub use config::{AppConfig, BackendConfig};
pub use resources::{GreetingResource, ResourceHandler, ResourceRegistry};
pub use server::McpServer;
pub use tools::{ToolHandler, ToolRegistry};

use std::sync::Arc;

use anyhow::Result;
use tools::{
    AddToolHandler, GetEventsHandler, GetSessionHandler, ListIdentitiesHandler, ListSessionsHandler,
};

/// Build the server with every tool and resource registered.
///
/// `backend` is `None` when the session backend is not configured; the
/// session tools are still registered and report that at call time.
pub fn build_server(backend: Option<BackendClient>) -> Result<McpServer> {
    let backend = backend.map(Arc::new);

    let tool_registry = ToolRegistry::new()
        .register_handler(AddToolHandler::new())
        .register_handler(ListSessionsHandler::new(backend.clone()))
        .register_handler(GetSessionHandler::new(backend.clone()))
        .register_handler(ListIdentitiesHandler::new(backend.clone()))
        .register_handler(GetEventsHandler::new(backend));

    let resource_registry = ResourceRegistry::new().register_handler(GreetingResource::new())?;

    tracing::info!(
        tools = tool_registry.len(),
        resource_templates = resource_registry.len(),
        "Registered MCP capabilities"
    );

    Ok(McpServer::new(
        Arc::new(tool_registry),
        Arc::new(resource_registry),
    ))
}

/// Convenience function to create a fully configured MCP server from the
/// start-up configuration.
pub fn create_server(config: &AppConfig) -> Result<McpServer> {
    let backend = match config.backend()? {
        Some(backend_config) => Some(BackendClient::new(&backend_config)?),
        None => None,
    };

    if config.external_api_key.is_some() {
        tracing::debug!("EXTERNAL_API_KEY is set but not used by any capability yet");
    }

    build_server(backend)
}
