//! WAF Console - admin client for the WAF management backend
//!
//! Every backend call goes through a single session-aware gateway, and
//! every view transition through a navigation guard, so an expired
//! session is recovered from exactly once and the user's destination
//! survives the login round-trip.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod api;
mod config;
mod console;
mod error;
mod gateway;
mod logging;
mod navigation;
mod session;

use crate::config::Config;
use crate::console::Console;
use crate::error::ConsoleError;
use crate::navigation::GuardDecision;

#[derive(Parser)]
#[command(name = "waf-console", version, about = "Admin client for the WAF management backend")]
struct Cli {
    /// Human-readable logs instead of JSON
    #[arg(long, global = true)]
    pretty_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and land on the dashboard (or the pending destination)
    Login {
        #[arg(short, long)]
        username: String,
        /// Falls back to WAF_CONSOLE_PASSWORD
        #[arg(short, long, env = "WAF_CONSOLE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Navigate to a view, e.g. `/rules?page=2`
    Open { path: String },
    /// Export attack logs to a file
    ExportLogs {
        /// Only these log ids (default: all)
        #[arg(long = "id")]
        ids: Vec<u64>,
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    let cli = Cli::parse();

    if cli.pretty_logs {
        logging::init_pretty();
    } else {
        logging::init();
    }

    tracing::debug!("Starting WAF Console v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::debug!(
        api_root = %config.backend.api_root(),
        timeout_secs = config.backend.timeout_secs,
        session_path = %config.session.path.display(),
        "Configuration loaded"
    );

    let console = Console::bootstrap(&config)?;

    if let Err(e) = run(&console, cli.command).await {
        if e
            .downcast_ref::<ConsoleError>()
            .map(ConsoleError::is_session_loss)
            .unwrap_or(false)
        {
            eprintln!("Session expired, sign in again with `waf-console login`");
        }
        return Err(e);
    }

    Ok(())
}

async fn run(console: &Console, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            let navigation = console.login(&username, &password).await?;
            println!("Signed in as {}", username);
            println!("Landed on {}", navigation.landed);
        }
        Commands::Logout => {
            console.logout().await;
            println!("Signed out");
        }
        Commands::Whoami => {
            if !console.session().is_authenticated() {
                println!("Not signed in");
                return Ok(());
            }
            let profile = console.refresh_profile().await?;
            println!(
                "{} (id {}, role {}, tenant {})",
                profile.username, profile.id, profile.role, profile.tenant_id
            );
        }
        Commands::Open { path } => {
            let navigation = console.open(&path);
            for event in console.navigator().history() {
                let from = event
                    .from
                    .map(|l| l.full_path())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:?} {} -> {}", event.kind, from, event.to);
            }
            println!("Requested {}", navigation.requested);
            println!("Landed on {}", navigation.landed);
            if let Some(title) = console.navigator().title() {
                println!("Title: {}", title);
            }
            if let GuardDecision::RedirectToLogin { pending } = &navigation.decision {
                println!("After sign-in: {}", pending);
            }
        }
        Commands::ExportLogs { ids, out } => {
            let raw = console.export_attack_logs(&ids).await?;
            if !raw.is_success() {
                anyhow::bail!(
                    "Export failed with HTTP {}: {}",
                    raw.status,
                    String::from_utf8_lossy(&raw.body)
                );
            }
            tokio::fs::write(&out, &raw.body).await?;
            println!(
                "Wrote {} bytes ({}) to {}",
                raw.body.len(),
                raw.content_type.as_deref().unwrap_or("unknown type"),
                out.display()
            );
        }
    }

    Ok(())
}
