//! MCP server implementation using rmcp.
//!
//! Provides the `ServerHandler` that answers tool and resource requests from
//! the registries, plus the streamable HTTP and stdio entry points.

use std::sync::Arc;

use anyhow::Result;
use axum::{Router, http::StatusCode, response::Json, routing::get};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer, ServiceExt},
};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::resources::{ResourceError, ResourceRegistry};
use crate::tools::{ToolContext, ToolRegistry};
use crate::types::ResourceUri;

/// Type alias for HTTP request parts stored in rmcp extensions.
type HttpParts = http::request::Parts;

/// Header carrying the streamable HTTP session id.
const SESSION_HEADER: &str = "mcp-session-id";

const INSTRUCTIONS: &str = "Surelook Holmes: add numbers with the `add` tool, read \
     `greeting://{name}` resources, and browse recorded sessions, identities and \
     events with the session tools.";

/// MCP server that handles protocol requests and delegates to the registries.
#[derive(Clone)]
pub struct McpServer {
    tool_registry: Arc<ToolRegistry>,
    resource_registry: Arc<ResourceRegistry>,
}

impl McpServer {
    /// Create a new MCP server over the given registries.
    pub fn new(
        tool_registry: Arc<ToolRegistry>,
        resource_registry: Arc<ResourceRegistry>,
    ) -> Self {
        Self {
            tool_registry,
            resource_registry,
        }
    }

    /// Get the tool registry.
    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// Get the resource registry.
    pub fn resource_registry(&self) -> &Arc<ResourceRegistry> {
        &self.resource_registry
    }

    /// Run a tool by name. An unknown name is `invalid_params`; a handler
    /// failure is `internal_error`. Argument problems stay in-band.
    pub async fn dispatch_tool(
        &self,
        tool_name: &str,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult, McpError> {
        if !self.tool_registry.contains(tool_name) {
            return Err(McpError::invalid_params(
                format!("Tool not found: {}", tool_name),
                None,
            ));
        }

        tracing::info!(tool = %tool_name, session = ?ctx.session_id, "Calling tool");

        self.tool_registry
            .call_tool(tool_name, args, ctx)
            .await
            .map_err(|e| {
                tracing::error!(tool = %tool_name, "Tool execution failed: {}", e);
                McpError::internal_error(format!("Tool execution failed: {}", e), None)
            })
    }

    /// Read a concrete resource URI through the resource registry.
    pub fn read_uri(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        self.resource_registry
            .read(&ResourceUri::new(uri))
            .map_err(resource_error_to_mcp)
    }

    fn capabilities() -> ServerCapabilities {
        ServerCapabilities::builder()
            .enable_tools()
            .enable_resources()
            .build()
    }
}

/// Map a registry read failure onto the MCP error it should surface as.
pub fn resource_error_to_mcp(err: ResourceError) -> McpError {
    match err {
        ResourceError::NotFound(uri) => {
            // -32002: MCP "resource not found"
            McpError::new(ErrorCode(-32002), format!("Resource not found: {}", uri), None)
        }
        ResourceError::InvalidUri(uri) => {
            McpError::invalid_params(format!("Invalid URI: {}", uri), None)
        }
        ResourceError::InvalidTemplate(msg) => {
            McpError::internal_error(format!("Failed to read resource: {}", msg), None)
        }
    }
}

impl ServerHandler for McpServer {
    fn list_tools(
        &self,
        request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let cursor = request.as_ref().and_then(|r| r.cursor.as_deref());
        let (tools, next_cursor) = self.tool_registry.list_tools(cursor);
        let result = ListToolsResult {
            tools,
            next_cursor,
            ..Default::default()
        };
        std::future::ready(Ok(result))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_name = request.name.to_string();
        let args = request.arguments.unwrap_or_default();

        // rmcp stores http::request::Parts in extensions for HTTP transport
        let session_id = context
            .extensions
            .get::<HttpParts>()
            .and_then(|parts| parts.headers.get(SESSION_HEADER))
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let ctx = ToolContext { session_id };
        async move { self.dispatch_tool(&tool_name, args, &ctx).await }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        // Every resource here is templated; concrete URIs are not enumerable.
        std::future::ready(Ok(ListResourcesResult {
            meta: None,
            resources: Vec::new(),
            next_cursor: None,
        }))
    }

    fn list_resource_templates(
        &self,
        request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_ {
        let cursor = request.as_ref().and_then(|r| r.cursor.as_deref());
        let (resource_templates, next_cursor) = self.resource_registry.list_templates(cursor);
        std::future::ready(Ok(ListResourceTemplatesResult {
            meta: None,
            resource_templates,
            next_cursor,
        }))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        std::future::ready(self.read_uri(&request.uri))
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: Self::capabilities(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}

/// Build the axum router: the MCP endpoint nested at `mcp_path` plus `/health`.
pub fn create_router(server: McpServer, mcp_path: &str) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new()
        .route("/health", get(health_check))
        .nest_service(mcp_path, service)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Start the server as an MCP Streamable HTTP server.
///
/// Exposes the MCP endpoint at `mcp_path` (e.g. `/mcp`) on the given bind
/// address, e.g. `127.0.0.1:8000`. Returns after Ctrl-C.
pub async fn start_mcp_http(server: McpServer, bind: &str, mcp_path: &str) -> Result<()> {
    let router = create_router(server, mcp_path);
    let listener = tokio::net::TcpListener::bind(bind).await?;

    tracing::info!("MCP HTTP server listening on http://{}{}", bind, mcp_path);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

/// Serve a single MCP session over stdin/stdout. Blocks until it ends.
pub async fn serve_stdio(server: McpServer) -> Result<()> {
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .inspect_err(|e| tracing::error!("serving error: {:?}", e))?;

    service.waiting().await?;
    tracing::info!("MCP stdio server session ended");
    Ok(())
}
