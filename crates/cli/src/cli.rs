//! Command-line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use featuregate_domain::FeaturableKey;

/// Manage feature flags stored in a FeatureGate database.
#[derive(Debug, Parser)]
#[command(name = "featuregate", version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file (overrides configuration)
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Configuration file (JSON or TOML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Feature commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new feature
    Add {
        /// Feature name
        feature: String,

        /// Initial state (on/off, 1/0, true/false); anything else adds it disabled
        #[arg(long)]
        state: Option<String>,
    },

    /// Remove a feature and all of its entity overrides
    #[command(visible_alias = "rm")]
    Remove {
        /// Feature name
        feature: String,
    },

    /// Turn a feature on for everyone
    #[command(visible_alias = "on")]
    Enable {
        /// Feature name
        feature: String,
    },

    /// Turn a feature off globally
    #[command(visible_alias = "off")]
    Disable {
        /// Feature name
        feature: String,
    },

    /// Print whether a feature is enabled
    Status {
        /// Feature name
        feature: String,

        /// Resolve for one entity (`kind:id`)
        #[arg(long = "for", value_name = "KIND:ID", value_parser = parse_featurable)]
        featurable: Option<FeaturableKey>,
    },

    /// Force-enable a feature for one entity
    EnableFor {
        /// Feature name
        feature: String,

        /// Entity as `kind:id`
        #[arg(value_parser = parse_featurable)]
        featurable: FeaturableKey,
    },

    /// Remove a per-entity override
    DisableFor {
        /// Feature name
        feature: String,

        /// Entity as `kind:id`
        #[arg(value_parser = parse_featurable)]
        featurable: FeaturableKey,
    },

    /// List features
    #[command(visible_alias = "ls")]
    List {
        /// Only features attached to this entity (`kind:id`)
        #[arg(long = "for", value_name = "KIND:ID", value_parser = parse_featurable)]
        featurable: Option<FeaturableKey>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report feature names referenced by templates below a directory
    Scan {
        /// Directory to walk
        dir: PathBuf,

        /// Template file extensions
        #[arg(long = "ext", value_delimiter = ',', value_name = "EXT")]
        extensions: Vec<String>,
    },

    /// Render a template through the feature conditionals
    Render {
        /// Template file
        file: PathBuf,

        /// Bind an entity for `@featurefor` (`name=kind:id`)
        #[arg(long = "bind", value_name = "NAME=KIND:ID", value_parser = parse_binding)]
        bindings: Vec<(String, FeaturableKey)>,
    },
}

fn parse_featurable(value: &str) -> Result<FeaturableKey, String> {
    value.parse::<FeaturableKey>().map_err(|err| err.to_string())
}

fn parse_binding(value: &str) -> Result<(String, FeaturableKey), String> {
    let (name, key) =
        value.split_once('=').ok_or_else(|| format!("expected NAME=KIND:ID, got `{value}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("binding name is empty in `{value}`"));
    }
    Ok((name.to_string(), parse_featurable(key)?))
}
