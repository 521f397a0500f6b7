//! Read-only tools over the session backend: `list_sessions`, `get_session`,
//! `list_identities` and `get_events`.
//!
//! Each handler holds an optional client. When the backend was not configured
//! at start-up the tools are still listed, but every call reports
//! `backend client not initialized`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject};
use serde_json::{Value, json};

use crate::backend::{BackendClient, BackendError};
use crate::tools::args::{limit_arg, string_arg};
use crate::tools::{ToolContext, ToolHandler, error_result, success_result};
use crate::types::SessionId;

type SharedClient = Option<Arc<BackendClient>>;

fn object_schema(properties: Value, required: &[&str]) -> JsonObject {
    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), properties);
    schema.insert("required".to_string(), json!(required));
    schema
}

fn limit_property(default: u32) -> Value {
    json!({
        "type": "integer",
        "description": "Maximum number of rows to return.",
        "minimum": 0,
        "default": default,
    })
}

fn session_id_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn rows_result(rows: Result<Vec<Value>, BackendError>) -> CallToolResult {
    match rows {
        Ok(rows) => {
            let text = serde_json::to_string(&rows)
                .unwrap_or_else(|_| "internal serialization error".to_string());
            let count = rows.len();
            success_result(text, json!({ "rows": rows, "count": count }))
        }
        Err(e) => error_result(e.to_string()),
    }
}

fn row_result(row: Result<Value, BackendError>) -> CallToolResult {
    match row {
        Ok(row) => {
            let text = serde_json::to_string(&row)
                .unwrap_or_else(|_| "internal serialization error".to_string());
            success_result(text, json!({ "row": row }))
        }
        Err(e) => error_result(e.to_string()),
    }
}

fn require_client(client: &SharedClient) -> Result<Arc<BackendClient>, BackendError> {
    client.clone().ok_or(BackendError::NotConfigured)
}

/// Handler for the `list_sessions` tool.
pub struct ListSessionsHandler {
    client: SharedClient,
}

impl ListSessionsHandler {
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

impl ToolHandler for ListSessionsHandler {
    fn name(&self) -> &str {
        "list_sessions"
    }

    fn description(&self) -> &str {
        "List recent sessions from the database, newest first."
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({ "limit": limit_property(Self::DEFAULT_LIMIT) }), &[])
    }

    fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<CallToolResult>> + Send + '_>> {
        let session = ctx.session_id.clone();
        Box::pin(async move {
            let limit = match limit_arg(&args, "limit", Self::DEFAULT_LIMIT) {
                Ok(limit) => limit,
                Err(reason) => return Ok(error_result(reason)),
            };
            tracing::debug!(?session, limit, "list_sessions");

            let rows = match require_client(&self.client) {
                Ok(client) => client.list_sessions(limit).await,
                Err(e) => Err(e),
            };
            Ok(rows_result(rows))
        })
    }
}

/// Handler for the `get_session` tool.
pub struct GetSessionHandler {
    client: SharedClient,
}

impl GetSessionHandler {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

impl ToolHandler for GetSessionHandler {
    fn name(&self) -> &str {
        "get_session"
    }

    fn description(&self) -> &str {
        "Get a specific session by ID."
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(
            json!({ "session_id": session_id_property("ID of the session to fetch.") }),
            &["session_id"],
        )
    }

    fn execute(
        &self,
        args: JsonObject,
        _ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<CallToolResult>> + Send + '_>> {
        Box::pin(async move {
            let session_id = match string_arg(&args, "session_id") {
                Ok(id) => SessionId::new(id),
                Err(reason) => return Ok(error_result(reason)),
            };

            let row = match require_client(&self.client) {
                Ok(client) => client.get_session(&session_id).await,
                Err(e) => Err(e),
            };
            Ok(row_result(row))
        })
    }
}

/// Handler for the `list_identities` tool.
pub struct ListIdentitiesHandler {
    client: SharedClient,
}

impl ListIdentitiesHandler {
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

impl ToolHandler for ListIdentitiesHandler {
    fn name(&self) -> &str {
        "list_identities"
    }

    fn description(&self) -> &str {
        "List identities from the database."
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({ "limit": limit_property(Self::DEFAULT_LIMIT) }), &[])
    }

    fn execute(
        &self,
        args: JsonObject,
        _ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<CallToolResult>> + Send + '_>> {
        Box::pin(async move {
            let limit = match limit_arg(&args, "limit", Self::DEFAULT_LIMIT) {
                Ok(limit) => limit,
                Err(reason) => return Ok(error_result(reason)),
            };

            let rows = match require_client(&self.client) {
                Ok(client) => client.list_identities(limit).await,
                Err(e) => Err(e),
            };
            Ok(rows_result(rows))
        })
    }
}

/// Handler for the `get_events` tool.
pub struct GetEventsHandler {
    client: SharedClient,
}

impl GetEventsHandler {
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }
}

impl ToolHandler for GetEventsHandler {
    fn name(&self) -> &str {
        "get_events"
    }

    fn description(&self) -> &str {
        "Get events associated with a specific session ID, oldest first."
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(
            json!({
                "session_id": session_id_property("ID of the session whose events to fetch."),
                "limit": limit_property(Self::DEFAULT_LIMIT),
            }),
            &["session_id"],
        )
    }

    fn execute(
        &self,
        args: JsonObject,
        _ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<CallToolResult>> + Send + '_>> {
        Box::pin(async move {
            let parsed = string_arg(&args, "session_id").and_then(|id| {
                limit_arg(&args, "limit", Self::DEFAULT_LIMIT)
                    .map(|limit| (SessionId::new(id), limit))
            });
            let (session_id, limit) = match parsed {
                Ok(parsed) => parsed,
                Err(reason) => return Ok(error_result(reason)),
            };

            let rows = match require_client(&self.client) {
                Ok(client) => client.get_events(&session_id, limit).await,
                Err(e) => Err(e),
            };
            Ok(rows_result(rows))
        })
    }
}
