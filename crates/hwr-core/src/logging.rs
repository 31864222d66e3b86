use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize tracing for the relay.
///
/// Events go to stdout as `timestamp LEVEL message`. Can be overridden with `RUST_LOG`.
pub fn init(service_name: &str) -> Result<()> {
    // Default: debug for our crates, info for everything else.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,hwr=debug,hwr_core=debug,hwr_practicum=debug,hwr_telegram=debug,{}=debug",
            service_name.replace('-', "_")
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(false)
        .try_init()
        .map_err(|e| Error::External(format!("logging init failed: {e}")))
}
