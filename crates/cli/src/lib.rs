//! # FeatureGate CLI
//!
//! The `featuregate` binary: register features, toggle them globally or per
//! entity, audit templates and render them through the feature conditionals.

pub mod cli;
pub mod commands;
pub mod context;
pub mod logging;

use featuregate_domain::{Config, Result};

pub use cli::{Cli, Command};
pub use commands::execute;
pub use context::AppContext;

/// Resolve configuration for a parsed command line.
///
/// `--config` replaces the usual environment and file lookup; `--database`
/// overrides the database path from any source.
///
/// # Errors
/// `Config` when the configuration cannot be loaded.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => featuregate_infra::config::load_from_file(Some(path.clone()))?,
        None => featuregate_infra::config::load()?,
    };

    if let Some(database) = &cli.database {
        config.database.path = database.display().to_string();
    }
    Ok(config)
}
