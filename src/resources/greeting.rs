use super::{ResourceError, ResourceHandler, TemplateParams};

/// Render the greeting for `name`.
pub fn greet(name: &str) -> String {
    format!("Hello, {}!", name)
}

/// The `greeting://{name}` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreetingResource;

impl GreetingResource {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceHandler for GreetingResource {
    fn uri_template(&self) -> &str {
        "greeting://{name}"
    }

    fn name(&self) -> &str {
        "greeting"
    }

    fn description(&self) -> &str {
        "Get a greeting for a name."
    }

    fn read(&self, params: &TemplateParams) -> Result<String, ResourceError> {
        let name = params.get("name").ok_or_else(|| {
            ResourceError::InvalidUri("greeting URI is missing a name".to_string())
        })?;
        Ok(greet(name))
    }
}
