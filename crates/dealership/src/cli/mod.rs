//! Command-line interface for dealership.
//!
//! This module provides the CLI structure for the `dealerd` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AdminCommand, ConfigCommand, SeedCommand, ServeCommand, StatusCommand, UsersCommand,
};

use crate::logging::Verbosity;

/// dealerd - Vehicle dealership backend
///
/// Serves the storefront and back-office HTTP API and provides operator
/// commands for accounts and inventory data.
#[derive(Debug, Parser)]
#[command(name = "dealerd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve(ServeCommand),

    /// Show database location and record counts
    Status(StatusCommand),

    /// Manage administrator accounts
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Import or remove vehicle data
    #[command(subcommand)]
    Seed(SeedCommand),

    /// Inspect user accounts
    #[command(subcommand)]
    Users(UsersCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
