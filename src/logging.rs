//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset, blank or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "surelook_holmes=info,rmcp=warn";

/// Filter from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
pub fn env_filter() -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

fn filter_from(raw: Option<&str>) -> EnvFilter {
    raw.filter(|r| !r.trim().is_empty())
        .and_then(|r| EnvFilter::try_new(r).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber.
pub fn init(stdio: bool) {
    // stdout belongs to the protocol in stdio mode
    if stdio {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    }
}
