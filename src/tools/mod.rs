//! Tool handler registry for the MCP tools this server exposes.
//!
//! Tools are registered once at start-up and looked up by name on every
//! `tools/call`.

mod registry;

pub use registry::{ToolContext, ToolHandler, ToolRegistry};
pub(crate) use registry::{error_result, success_result};

mod args;

// Tool handler implementations
mod add;
mod sessions;

pub use add::{AddToolHandler, add_numbers};
pub use sessions::{GetEventsHandler, GetSessionHandler, ListIdentitiesHandler, ListSessionsHandler};
