//! Templated, read-only MCP resources.
//!
//! A `ResourceHandler` owns a URI template (e.g. `greeting://{name}`) and
//! renders text for any URI that matches it. The `ResourceRegistry` keeps the
//! handlers and resolves incoming `resources/read` URIs against them.

mod greeting;
mod template;

pub use greeting::{GreetingResource, greet};
pub use template::{TemplateParams, UriTemplate};

use std::sync::Arc;

use rmcp::model::{
    AnnotateAble, RawResourceTemplate, ReadResourceResult, ResourceContents, ResourceTemplate,
};

use crate::types::ResourceUri;

/// Default page size for paginated template listings.
const DEFAULT_PAGE_SIZE: usize = 100;

/// Maximum URI length to prevent abuse.
const MAX_URI_LENGTH: usize = 4096;

/// Error types for resource operations.
#[derive(Debug, Clone)]
pub enum ResourceError {
    /// No registered template matches the URI.
    NotFound(String),
    /// Invalid URI (contains unsafe characters or fails validation).
    InvalidUri(String),
    /// A handler declared a malformed URI template.
    InvalidTemplate(String),
}

impl std::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceError::NotFound(uri) => write!(f, "Resource not found: {}", uri),
            ResourceError::InvalidUri(uri) => write!(f, "Invalid URI: {}", uri),
            ResourceError::InvalidTemplate(msg) => write!(f, "Invalid URI template: {}", msg),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Validate a resource URI before template matching: non-empty, bounded
/// length, has a scheme, no `../` segment. Returns true if the URI is safe.
fn is_valid_uri(uri: &str) -> bool {
    if uri.is_empty() || uri.len() > MAX_URI_LENGTH {
        return false;
    }

    if !uri.contains("://") {
        return false;
    }

    !uri.contains("../")
}

/// Trait for serving a family of resources addressed by one URI template.
pub trait ResourceHandler: Send + Sync {
    /// The URI template this handler serves (e.g., "greeting://{name}").
    fn uri_template(&self) -> &str;

    /// Short machine-friendly name.
    fn name(&self) -> &str;

    fn title(&self) -> Option<&str> {
        None
    }

    fn description(&self) -> &str;

    fn mime_type(&self) -> &str {
        "text/plain"
    }

    /// Render the resource for the variables extracted from a matched URI.
    fn read(&self, params: &TemplateParams) -> Result<String, ResourceError>;

    /// Converts this handler to a template entry for `list_resource_templates`.
    fn to_mcp_template(&self) -> ResourceTemplate {
        RawResourceTemplate {
            uri_template: self.uri_template().to_string(),
            name: self.name().to_string(),
            title: self.title().map(|s| s.to_string()),
            description: Some(self.description().to_string()),
            mime_type: Some(self.mime_type().to_string()),
            icons: None,
        }
        .no_annotation()
    }
}

/// Registry of templated resources, populated once at start-up.
///
/// Entries are kept sorted by template string, which is also the order in
/// which URIs are matched.
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    entries: Vec<(UriTemplate, Arc<dyn ResourceHandler>)>,
}

impl ResourceRegistry {
    /// Create a new empty resource registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Templates are unique: a second handler for the
    /// same template replaces the first.
    pub fn register(mut self, handler: Arc<dyn ResourceHandler>) -> Result<Self, ResourceError> {
        let template = UriTemplate::parse(handler.uri_template())?;

        match self
            .entries
            .binary_search_by(|(t, _)| t.as_str().cmp(template.as_str()))
        {
            Ok(index) => {
                tracing::warn!(
                    "Resource template `{}` registered twice; replacing previous handler",
                    template
                );
                self.entries[index] = (template, handler);
            }
            Err(index) => self.entries.insert(index, (template, handler)),
        }

        Ok(self)
    }

    /// Register a resource handler from a type that implements `ResourceHandler`.
    pub fn register_handler<T: ResourceHandler + 'static>(
        self,
        handler: T,
    ) -> Result<Self, ResourceError> {
        self.register(Arc::new(handler))
    }

    /// Find the handler for a concrete URI, with the extracted variables.
    pub fn resolve(&self, uri: &str) -> Option<(Arc<dyn ResourceHandler>, TemplateParams)> {
        self.entries.iter().find_map(|(template, handler)| {
            template
                .matches(uri)
                .map(|params| (handler.clone(), params))
        })
    }

    /// Read a resource by URI.
    pub fn read(&self, uri: &ResourceUri) -> Result<ReadResourceResult, ResourceError> {
        if !is_valid_uri(uri.as_str()) {
            return Err(ResourceError::InvalidUri(uri.to_string()));
        }

        let (handler, params) = self
            .resolve(uri.as_str())
            .ok_or_else(|| ResourceError::NotFound(uri.to_string()))?;

        let text = handler.read(&params)?;
        tracing::debug!(uri = %uri, template = handler.uri_template(), "Resource read");

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri.as_str())],
        })
    }

    /// List one page of templates. Cursor format is the offset as a string.
    pub fn list_templates(&self, cursor: Option<&str>) -> (Vec<ResourceTemplate>, Option<String>) {
        let offset = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
        let total = self.entries.len();

        let page: Vec<ResourceTemplate> = self
            .entries
            .iter()
            .skip(offset)
            .take(DEFAULT_PAGE_SIZE)
            .map(|(_, handler)| handler.to_mcp_template())
            .collect();

        let next_offset = offset + page.len();
        let next_cursor = if next_offset < total {
            Some(next_offset.to_string())
        } else {
            None
        };

        (page, next_cursor)
    }

    /// All registered template strings, sorted.
    pub fn list_uri_templates(&self) -> Vec<String> {
        self.entries.iter().map(|(t, _)| t.to_string()).collect()
    }

    /// Return the number of registered templates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if no templates are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
