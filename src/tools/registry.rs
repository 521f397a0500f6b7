//! Tool registry for managing MCP tool handlers.
//!
//! Provides a `ToolHandler` trait for implementing tools and a `ToolRegistry`
//! for registering and invoking them.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool as McpTool};
use serde_json::{Value, json};

use crate::types::ToolName;

/// Default page size for paginated tool listings.
const DEFAULT_PAGE_SIZE: usize = 100;

/// Context passed to tool handlers during execution.
#[derive(Clone, Debug, Default)]
pub struct ToolContext {
    /// Streamable HTTP session the call arrived on (None for stdio).
    pub session_id: Option<String>,
}

/// Trait for handling MCP tool invocations.
///
/// Each tool implements this trait to define its schema and execution logic.
pub trait ToolHandler: Send + Sync {
    /// Returns the tool's name (e.g., "add").
    fn name(&self) -> &str;

    /// Returns the tool's human-readable title.
    fn title(&self) -> Option<&str> {
        None
    }

    /// Returns the tool's description.
    fn description(&self) -> &str;

    /// Returns the input schema for this tool.
    fn input_schema(&self) -> JsonObject;

    /// Returns the output schema for this tool (optional).
    fn output_schema(&self) -> Option<JsonObject> {
        None
    }

    /// Executes the tool with the given arguments.
    fn execute(
        &self,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<CallToolResult>> + Send + '_>>;

    /// Converts this handler to an `McpTool` for use in `list_tools`.
    fn to_mcp_tool(&self) -> McpTool {
        let mut tool = McpTool::new(
            self.name().to_string(),
            self.description().to_string(),
            Arc::new(self.input_schema()),
        );
        tool.title = self.title().map(|s| s.to_string());
        tool.output_schema = self.output_schema().map(Arc::new);
        tool
    }
}

/// Registry for managing tool handlers.
///
/// Populated once at start-up; read-only afterwards.
#[derive(Clone)]
pub struct ToolRegistry {
    handlers: BTreeMap<ToolName, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Register a tool handler.
    ///
    /// Names are unique: registering a name twice keeps the latest handler.
    pub fn register(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        let name = ToolName::new(handler.name());
        if self.handlers.contains_key(&name) {
            tracing::warn!("Tool `{}` registered twice; replacing previous handler", name);
        }
        self.handlers.insert(name, handler);
        self
    }

    /// Register a tool handler from a type that implements `ToolHandler`.
    pub fn register_handler<T: ToolHandler + 'static>(self, handler: T) -> Self {
        self.register(Arc::new(handler))
    }

    /// Get a tool handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    /// List all registered tool names, sorted.
    pub fn list_names(&self) -> Vec<String> {
        self.handlers.keys().map(|k| k.to_string()).collect()
    }

    /// Get one page of registered tools for `list_tools`.
    ///
    /// The cursor is the offset as a string (e.g., "0", "100"). Returns the
    /// page and the cursor of the next page, if any.
    pub fn list_tools(&self, cursor: Option<&str>) -> (Vec<McpTool>, Option<String>) {
        let offset = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
        let total = self.handlers.len();

        let page: Vec<McpTool> = self
            .handlers
            .values()
            .skip(offset)
            .take(DEFAULT_PAGE_SIZE)
            .map(|handler| handler.to_mcp_tool())
            .collect();

        let next_offset = offset + page.len();
        let next_cursor = if next_offset < total {
            Some(next_offset.to_string())
        } else {
            None
        };

        (page, next_cursor)
    }

    /// Execute a tool by name with the given arguments.
    pub async fn call_tool(
        &self,
        name: &str,
        args: JsonObject,
        ctx: &ToolContext,
    ) -> Result<CallToolResult> {
        let handler = self
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Tool not found: {}", name))?;
        handler.execute(args, ctx).await
    }

    /// Check if a tool with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Return the number of registered tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Return `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Successful result: `text` for display, `structured` for clients that
/// read structured content.
pub(crate) fn success_result(text: String, structured: Value) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: Some(structured),
        is_error: Some(false),
        meta: None,
    }
}

/// In-band tool failure with a `{"status": "error", "reason": ...}` payload.
pub(crate) fn error_result(reason: impl Into<String>) -> CallToolResult {
    let payload = json!({
        "status": "error",
        "reason": reason.into(),
    });
    let text = serde_json::to_string(&payload)
        .unwrap_or_else(|_| "internal serialization error".to_string());
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedTool(String);

    impl NamedTool {
        fn new(name: impl Into<String>) -> Self {
            Self(name.into())
        }
    }

    impl ToolHandler for NamedTool {
        fn name(&self) -> &str {
            &self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn input_schema(&self) -> JsonObject {
            let mut schema = JsonObject::new();
            schema.insert("type".to_string(), json!("object"));
            schema
        }

        fn execute(
            &self,
            _args: JsonObject,
            _ctx: &ToolContext,
        ) -> Pin<Box<dyn Future<Output = Result<CallToolResult>> + Send + '_>> {
            let name = self.0.clone();
            Box::pin(async move { Ok(success_result(name.clone(), json!({ "name": name }))) })
        }
    }

    #[test]
    fn test_registry_empty() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        let (tools, next) = registry.list_tools(None);
        assert!(tools.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn test_names_are_unique_and_sorted() {
        let registry = ToolRegistry::new()
            .register_handler(NamedTool::new("zeta"))
            .register_handler(NamedTool::new("alpha"))
            .register_handler(NamedTool::new("zeta"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.list_names(), vec!["alpha", "zeta"]);
        assert!(registry.contains("alpha"));
        assert!(!registry.contains("beta"));
    }

    #[test]
    fn test_list_tools_pagination() {
        let registry = (0..150).fold(ToolRegistry::new(), |r, i| {
            r.register_handler(NamedTool::new(format!("tool_{i:03}")))
        });

        let (first, next) = registry.list_tools(None);
        assert_eq!(first.len(), 100);
        assert_eq!(next.as_deref(), Some("100"));

        let (second, next) = registry.list_tools(next.as_deref());
        assert_eq!(second.len(), 50);
        assert!(next.is_none());
        assert_eq!(second[0].name, "tool_100");
    }

    #[test]
    fn test_to_mcp_tool() {
        let tool = NamedTool::new("alpha").to_mcp_tool();
        assert_eq!(tool.name, "alpha");
        assert_eq!(tool.description.as_deref(), Some("test tool"));
        assert!(tool.title.is_none());
        assert!(tool.output_schema.is_none());
    }

    #[tokio::test]
    async fn test_call_tool_dispatch() {
        let registry = ToolRegistry::new().register_handler(NamedTool::new("alpha"));
        let ctx = ToolContext::default();

        let result = registry
            .call_tool("alpha", JsonObject::new(), &ctx)
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.structured_content, Some(json!({"name": "alpha"})));

        let err = registry
            .call_tool("missing", JsonObject::new(), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Tool not found: missing"));
    }

    #[test]
    fn test_error_result_payload() {
        let result = error_result("boom");
        assert_eq!(result.is_error, Some(true));
        assert!(result.structured_content.is_none());
        let text = result.content[0].as_text().map(|t| t.text.clone()).unwrap();
        let payload: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(payload, json!({"status": "error", "reason": "boom"}));
    }
}
