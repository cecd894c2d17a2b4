//! Logging setup for the Gatekeeper binary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log level used when `RUST_LOG` is unset: both Gatekeeper crates at
/// `info`, so store lifecycle events and permission writes are visible while
/// sqlx and hyper stay quiet.
pub const DEFAULT_FILTER: &str = "gatekeeper=info,gatekeeper_core=info";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_filter`. With `log_json` every event
/// (including the request spans from the HTTP trace layer) is written as one
/// JSON object per line for log aggregation.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
