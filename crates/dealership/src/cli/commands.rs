//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::seed::{DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_NAME, DEFAULT_ADMIN_PASSWORD};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Interface to bind (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Administrator account commands.
#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Create an administrator if the email is not registered yet
    Create {
        /// Login email
        #[arg(long, default_value = DEFAULT_ADMIN_EMAIL)]
        email: String,

        /// Login password
        #[arg(long, default_value = DEFAULT_ADMIN_PASSWORD)]
        password: String,

        /// Display name
        #[arg(long, default_value = DEFAULT_ADMIN_NAME)]
        name: String,
    },
}

/// Vehicle seed data commands.
#[derive(Debug, Subcommand)]
pub enum SeedCommand {
    /// Import a JSON array of vehicles
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Delete every vehicle
    Destroy {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// User account commands.
#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List every account
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_command_debug() {
        let cmd = AdminCommand::Create {
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
            name: DEFAULT_ADMIN_NAME.to_string(),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Create"));
        assert!(debug_str.contains(DEFAULT_ADMIN_EMAIL));
    }

    #[test]
    fn test_seed_command_debug() {
        let cmd = SeedCommand::Destroy { yes: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Destroy"));
        assert!(debug_str.contains("yes"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
