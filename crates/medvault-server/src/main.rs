use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};

use medvault_server::bootstrap::{self, BootstrapOutcome};
use medvault_server::config::ServerConfig;
use medvault_service::LocalService;

#[derive(Parser)]
#[command(name = "medvault-server", about = "MedVault document API")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the admin account if it does not exist, then exit
    BootstrapAdmin,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;
    let db = medvault_db::open_database(&config.db_config())
        .await
        .context("open metadata store")?;

    match cli.command {
        Some(Commands::BootstrapAdmin) => {
            let creds = config.admin.credentials()?.context(
                "admin credentials required: --admin-username, --admin-email, --admin-password",
            )?;
            match bootstrap::ensure_admin(db.as_ref(), &creds).await? {
                BootstrapOutcome::Created(user) => {
                    eprintln!("Created admin {} (id: {})", user.username, user.id)
                }
                BootstrapOutcome::AlreadyExists => {
                    eprintln!("Admin {} already exists", creds.username)
                }
            }
        }
        None => {
            // Default: start server
            match config.admin.credentials() {
                Ok(Some(creds)) => {
                    bootstrap::ensure_admin(db.as_ref(), &creds).await?;
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "skipping admin bootstrap"),
            }

            let store = medvault_store::create_store(&config.store_config())
                .context("open object store")?;
            let policy = config.upload_policy();
            if policy.sniff_magic {
                info!("PDF signature check enabled");
            }
            let service = LocalService::new(db, store).with_policy(policy);

            let addr = config.socket_addr()?;
            let listener = TcpListener::bind(addr).await?;
            info!("medvault-server listening on http://{addr}");

            medvault_server::serve(listener, service).await?;
        }
    }

    Ok(())
}
