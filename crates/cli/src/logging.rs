//! Log subscriber setup.

use anyhow::anyhow;
use featuregate_domain::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr so that
/// command results on stdout stay machine-readable.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|err| anyhow!("invalid log filter `{}`: {err}", config.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if config.json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}
