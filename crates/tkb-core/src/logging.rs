use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize tracing for the bot.
///
/// `RUST_LOG` wins when set; otherwise our crates log at `info` (`debug` when
/// `debug` is true) and everything else at `warn`.
pub fn init(service_name: &str, debug: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name, debug)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("logging init failed: {e}")))
}

fn default_directives(service_name: &str, debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    let service = service_name.replace('-', "_");
    format!("warn,tkb_core={level},tkb_redmine={level},tkb_slack={level},{service}={level}")
}
