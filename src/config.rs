use std::time::Duration;

use clap::Args;
use url::Url;

/// Default bind address for the streamable HTTP transport.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Default mount path of the MCP endpoint.
pub const DEFAULT_MCP_PATH: &str = "/mcp";

/// Timeout applied to every backend request.
pub const BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings read from the command line or the environment at start-up.
#[derive(Debug, Clone, Default, Args)]
pub struct AppConfig {
    /// Base URL of the session backend (Supabase project URL)
    #[arg(long, global = true, env = "PUBLIC_SUPABASE_URL")]
    pub backend_url: Option<String>,

    /// Public (publishable) key for the session backend
    #[arg(
        long,
        global = true,
        env = "PUBLIC_SUPABASE_PUBLISHABLE_DEFAULT_KEY",
        hide_env_values = true
    )]
    pub backend_key: Option<String>,

    /// Third-party API key, reserved for future capabilities
    #[arg(long, global = true, env = "EXTERNAL_API_KEY", hide_env_values = true)]
    pub external_api_key: Option<String>,
}

impl AppConfig {
    /// Resolve the backend settings, if both halves are present.
    ///
    /// A missing URL or key is not fatal: the server still starts and the
    /// backend tools report that the client is not initialized.
    pub fn backend(&self) -> anyhow::Result<Option<BackendConfig>> {
        match BackendConfig::from_parts(self.backend_url.as_deref(), self.backend_key.as_deref()) {
            Some(config) => config.map(Some),
            None => {
                tracing::warn!(
                    "PUBLIC_SUPABASE_URL and PUBLIC_SUPABASE_PUBLISHABLE_DEFAULT_KEY must be set; \
                     session backend tools are disabled"
                );
                Ok(None)
            }
        }
    }
}

/// Connection settings for the PostgREST session backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: Url,
    pub key: String,
    pub timeout: Duration,
}

impl BackendConfig {
    /// Build a config from optional raw values.
    ///
    /// Returns `None` when either value is missing or blank, and
    /// `Some(Err(_))` when the URL is present but unusable.
    pub fn from_parts(url: Option<&str>, key: Option<&str>) -> Option<anyhow::Result<Self>> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;
        let key = key.map(str::trim).filter(|k| !k.is_empty())?;
        Some(Self::new(url, key))
    }

    pub fn new(url: &str, key: &str) -> anyhow::Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| anyhow::anyhow!("Invalid backend URL `{}`: {}", url, e))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!(
                "Backend URL must use http or https, got `{}`",
                url.scheme()
            ));
        }

        Ok(Self {
            url,
            key: key.to_string(),
            timeout: BACKEND_TIMEOUT,
        })
    }
}
