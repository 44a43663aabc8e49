//! `dealerd` - CLI and server for the dealership backend
//!
//! This binary runs the HTTP API and provides operator commands for
//! bootstrapping accounts and managing vehicle seed data.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;

use dealership::cli::{
    AdminCommand, Cli, Command, ConfigCommand, SeedCommand, ServeCommand, UsersCommand,
};
use dealership::seed::{self, AdminOutcome};
use dealership::{init_logging, AppState, Config, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, serve_cmd).await,
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Admin(admin_cmd) => handle_admin(&config, admin_cmd),
        Command::Seed(seed_cmd) => handle_seed(&config, seed_cmd),
        Command::Users(users_cmd) => handle_users(&config, users_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening database {}", path.display()))
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;

    let storage = open_storage(&config)?;
    let state = AppState::new(storage, config)?;
    dealership::serve(state).await?;
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;
    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "uploads_dir": config.uploads_dir(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("dealerd status");
        println!("--------------");
        println!("Database:      {}", storage.path().display());
        println!("Uploads:       {}", config.uploads_dir().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!();
        println!("Users:         {}", stats.users);
        println!("Vehicles:      {}", stats.vehicles);
        println!("Orders:        {}", stats.orders);
        println!("Feedback:      {}", stats.feedback);
    }
    Ok(())
}

fn handle_admin(config: &Config, cmd: AdminCommand) -> anyhow::Result<()> {
    match cmd {
        AdminCommand::Create {
            email,
            password,
            name,
        } => {
            let storage = open_storage(config)?;
            match seed::create_admin(&storage, &email, &password, &name)? {
                AdminOutcome::Created(user) => {
                    println!("Admin user created successfully!");
                    println!("- Email: {}", user.email);
                }
                AdminOutcome::Existing(user) => {
                    println!("Admin user with email {} already exists.", user.email);
                }
            }
        }
    }
    Ok(())
}

fn handle_seed(config: &Config, cmd: SeedCommand) -> anyhow::Result<()> {
    match cmd {
        SeedCommand::Import { file } => {
            let mut storage = open_storage(config)?;
            let count = seed::import_vehicles_file(&mut storage, &file)
                .with_context(|| format!("importing {}", file.display()))?;
            println!("Imported {count} vehicles.");
        }
        SeedCommand::Destroy { yes } => {
            if !yes {
                bail!("this deletes every vehicle; pass --yes to confirm");
            }
            let storage = open_storage(config)?;
            let count = seed::destroy_vehicles(&storage)?;
            println!("Deleted {count} vehicles.");
        }
    }
    Ok(())
}

fn handle_users(config: &Config, cmd: UsersCommand) -> anyhow::Result<()> {
    match cmd {
        UsersCommand::List { json } => {
            let storage = open_storage(config)?;
            let users = storage.list_users()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else if users.is_empty() {
                println!("No users.");
            } else {
                println!("{:<10} {:<32} NAME", "ROLE", "EMAIL");
                for user in users {
                    println!("{:<10} {:<32} {}", user.role, user.email, user.name);
                }
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.bind_address());
                let origins = if config.server.cors_allowed_origins.is_empty() {
                    "any".to_string()
                } else {
                    config.server.cors_allowed_origins.join(", ")
                };
                println!("  CORS origins:       {origins}");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Auth]");
                println!(
                    "  JWT secret:         {}",
                    if config.auth.jwt_secret.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
                println!("  Token TTL (days):   {}", config.auth.token_ttl_days);
                println!();
                println!("[Uploads]");
                println!("  Directory:          {}", config.uploads_dir().display());
                println!("  Max bytes:          {}", config.uploads.max_bytes);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
