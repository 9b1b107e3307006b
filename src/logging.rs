use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a `tracing` filter directive, e.g.
/// `BACKCHECK_LOG=backcheck_cache=debug,info`.
pub const LOG_ENV: &str = "BACKCHECK_LOG";

/// Install the global subscriber. `BACKCHECK_LOG` wins over `fallback`; an
/// unparsable fallback means `info`.
pub fn init(fallback: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
