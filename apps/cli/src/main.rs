//! Tollgate CLI
//!
//! Runs the metered-tunnel node and offers a few session-store diagnostics.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use tollgate_ledger::{LedgerClient, LedgerConfig};
use tollgate_logging::LogLevel;
use tollgate_node::{Node, NodeConfig};
use tollgate_store::SessionStore;
use tollgate_tunnel::MemoryTunnel;

/// Tollgate - Metered tunnel node
#[derive(Parser)]
#[command(name = "tollgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite URL of the local session store
    #[arg(long, default_value = "sqlite://tollgate.db?mode=rwc")]
    db: String,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node jobs until the first fatal error
    Run {
        /// This node's identity key, as registered with the ledger
        #[arg(long)]
        key: String,

        /// Ledger gateway endpoint
        #[arg(long, default_value = "http://127.0.0.1:26660")]
        ledger: String,

        /// Use the in-memory mock ledger instead of a live endpoint
        #[arg(long)]
        mock_ledger: bool,
    },

    /// List local session records
    Sessions,

    /// Remove session records already retired (empty address)
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tollgate_logging::init(LogLevel::from_verbosity(cli.verbose));

    let store = SessionStore::open(&cli.db)
        .await
        .with_context(|| format!("opening session store at {}", cli.db))?;

    match cli.command {
        Commands::Run {
            key,
            ledger,
            mock_ledger,
        } => {
            let ledger = if mock_ledger {
                LedgerClient::mock()
            } else {
                LedgerClient::new(LedgerConfig::live(ledger))?
            };

            let config = NodeConfig {
                key,
                ..Default::default()
            };

            // The tunnel transport is deployment-specific; the in-memory
            // peer table stands in until one is wired up.
            let node = Node::new(config, store, ledger, MemoryTunnel::new());

            info!(key = %node.config().key, "Node starting");
            node.run().await.context("node terminated")?;
        }

        Commands::Sessions => {
            let sessions = store.all().await?;
            if sessions.is_empty() {
                println!("No local sessions");
            }
            for s in sessions {
                println!(
                    "{:>6}  key={}  address={}  up={}  down={}  available={}  created={}",
                    s.id,
                    s.key,
                    if s.address.is_empty() { "(retired)" } else { s.address.as_str() },
                    s.upload,
                    s.download,
                    s.available,
                    s.created_at,
                );
            }
        }

        Commands::Purge => {
            let removed = store.purge_deleted().await?;
            println!("Purged {removed} retired session(s)");
        }
    }

    Ok(())
}
