//! oxide-reconcile CLI
//!
//! Command-line tool for comparing two database schemas.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_reconcile::console;
use oxide_reconcile::prelude::*;

/// Compare two database schemas and generate the DDL that reconciles them.
#[derive(Parser)]
#[command(name = "oxide-reconcile")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Connection profile file.
    #[arg(short, long, env = "OXIDE_RECONCILE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a new connection profile.
    AddConnection {
        /// Profile name.
        #[arg(short, long)]
        name: String,

        /// Database engine.
        #[arg(short, long, value_enum)]
        dialect: Engine,

        /// Server host.
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Server port (engine default if not specified).
        #[arg(short, long)]
        port: Option<u16>,

        /// User name.
        #[arg(short, long)]
        user: String,

        /// Password.
        #[arg(long, env = "OXIDE_RECONCILE_PASSWORD", default_value = "", hide_env_values = true)]
        password: String,

        /// Database to compare.
        #[arg(long)]
        database: String,
    },

    /// Delete a connection profile.
    RmConnection {
        /// Profile name.
        #[arg(short, long)]
        name: String,
    },

    /// List saved connection profiles.
    ListConnections,

    /// Compare two saved connections interactively.
    Compare {
        /// Reference connection (source of truth).
        #[arg(long)]
        first: String,

        /// Connection to bring in line with the reference.
        #[arg(long)]
        second: String,

        /// Handling of REFERENCES clauses whose table is missing on the second database.
        #[arg(long, value_enum, default_value_t = ForeignKeyCheck::Trust)]
        foreign_keys: ForeignKeyCheck,
    },
}

async fn open(profile: &ConnectionProfile) -> anyhow::Result<DatabaseConnection> {
    let conn = DatabaseConnection::connect(profile)
        .await
        .with_context(|| format!("Error connecting to {}", profile.name))?;
    conn.ping()
        .await
        .with_context(|| format!("Failed to ping the \"{}\" database", profile.name))?;
    Ok(conn)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout belongs to the console.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = match cli.config {
        Some(path) => ProfileStore::new(path),
        None => ProfileStore::open_default()?,
    };

    match cli.command {
        Commands::AddConnection {
            name,
            dialect,
            host,
            port,
            user,
            password,
            database,
        } => {
            let profile = ConnectionProfile {
                name,
                engine: dialect,
                host,
                port: port.unwrap_or_else(|| dialect.default_port()),
                user,
                password,
                database,
            };
            store.add(profile.clone())?;
            info!(path = %store.path().display(), "Connection {} added.", profile.name);
        }

        Commands::RmConnection { name } => {
            store.remove(&name)?;
            info!("Connection {} removed.", name);
        }

        Commands::ListConnections => {
            let profiles = store.list()?;
            if profiles.is_empty() {
                println!("No connections stored");
            } else {
                println!(
                    "{:<16} {:<12} {:<24} {:<6} {:<12} {:<10} {}",
                    "NAME", "DIALECT", "HOST", "PORT", "USER", "PASSWORD", "DATABASE"
                );
                for p in &profiles {
                    println!(
                        "{:<16} {:<12} {:<24} {:<6} {:<12} {:<10} {}",
                        p.name, p.engine, p.host, p.port, p.user, p.password, p.database
                    );
                }
            }
        }

        Commands::Compare {
            first,
            second,
            foreign_keys,
        } => {
            let first = store.get(&first)?;
            let second = store.get(&second)?;

            let first_conn = open(&first).await?;
            let second_conn = open(&second).await?;

            let options = PatchOptions::default().foreign_keys(foreign_keys);
            let result = match Session::new(&first_conn, &second_conn, options) {
                Ok(mut session) => {
                    info!("Comparing {} with {}", first, second);
                    console::run(&mut session, io::stdin().lock(), io::stdout().lock())
                        .await
                        .map_err(anyhow::Error::from)
                }
                Err(err) => Err(err.into()),
            };

            first_conn.close().await;
            second_conn.close().await;
            result?;
        }
    }

    Ok(())
}
