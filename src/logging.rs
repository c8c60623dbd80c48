use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{GatewayError, Result};

/// Default filter when `RUST_LOG` is not set: the library, the calling
/// binary and HTTP traces at `info`.
pub fn default_filter(component: &str) -> String {
    let level = Level::INFO;
    if component == env!("CARGO_CRATE_NAME") {
        format!("{}={},tower_http={}", component, level, level)
    } else {
        format!("{}={},{}={},tower_http={}", env!("CARGO_CRATE_NAME"), level, component, level, level)
    }
}

/// Sets up the logging subscriber for the process.
///
/// # Arguments
/// * `component` - Binary crate name, enabled at `info` when `RUST_LOG` is unset
pub fn init_logger(component: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(component)));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_ansi(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| GatewayError::Internal(format!("Failed to initialize logger: {}", e)))
}
