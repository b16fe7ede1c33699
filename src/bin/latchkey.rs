//! Latchkey server
//!
//! # Usage
//!
//! ```bash
//! # Run the server (reads .env, then the environment)
//! latchkey serve
//!
//! # Print a fresh signing secret for JWT_SECRET
//! latchkey generate-secret --length 64
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use latchkey::observability::{self, auth_event, AuthEvent, LogConfig};
use latchkey::secret::{calculate_entropy, generate_secret, MIN_SECRET_LENGTH};
use latchkey::{build_router, create_pool, run_migrations, AppConfig, AppState, PgUserStore};

/// Cookie-session authentication server
#[derive(Parser)]
#[command(name = "latchkey")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Print a random secret suitable for JWT_SECRET
    GenerateSecret {
        /// Secret length in characters
        #[arg(short, long, default_value_t = 64)]
        length: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(),
        Commands::GenerateSecret { length } => cmd_generate_secret(length),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_generate_secret(length: usize) -> anyhow::Result<()> {
    if length < MIN_SECRET_LENGTH {
        anyhow::bail!("length must be at least {}", MIN_SECRET_LENGTH);
    }

    let secret = generate_secret(length);
    println!("{}", secret);
    eprintln!("entropy: {:.2} bits/char", calculate_entropy(&secret));
    Ok(())
}

#[tokio::main]
async fn serve() -> anyhow::Result<()> {
    // A missing .env is normal in production
    let _ = dotenvy::dotenv();

    observability::init(&LogConfig::from_env()).context("failed to initialize logging")?;

    let config = AppConfig::from_env().context("invalid configuration")?;

    auth_event!(
        AuthEvent::SystemStartup,
        version = env!("CARGO_PKG_VERSION"),
        production = config.production,
        bind_addr = %config.bind_addr,
        "Latchkey starting"
    );
    if !config.production {
        warn!("Development mode: session cookies are sent without Secure");
    }

    let pool = create_pool(&config.database_config())
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to apply migrations")?;
    auth_event!(AuthEvent::DatabaseConnected, "User store ready");

    let state = AppState::from_config(&config, Arc::new(PgUserStore::new(pool.clone())))
        .context("failed to build application state")?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
