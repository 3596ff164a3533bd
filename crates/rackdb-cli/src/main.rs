use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commit;
mod stage;
mod tables;

#[derive(Debug, Parser)]
#[command(name = "rackdb")]
#[command(about = "Stage scraped product catalogs and reconcile them into the remote store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Register a brand or stage a parsed catalog.
    Add {
        #[command(subcommand)]
        target: AddTarget,
    },
    /// Show staged brands and catalogs.
    Show {
        #[command(subcommand)]
        target: Option<ShowTarget>,
    },
    /// Remove a brand or a staged catalog from the ledger.
    Delete {
        #[command(subcommand)]
        target: DeleteTarget,
    },
    /// Reconcile a staged catalog into the remote store.
    Commit {
        #[command(subcommand)]
        target: CommitTarget,
    },
}

#[derive(Debug, Subcommand)]
enum AddTarget {
    /// Fetch a brand's raw listings and register them under an alias.
    Store {
        brand: String,
        alias: String,
        #[arg(long)]
        comments: Option<String>,
    },
    /// Parse a registered brand's raw data into a staged catalog.
    Catalog {
        store_alias: String,
        alias: String,
        #[arg(long)]
        comments: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ShowTarget {
    Stores,
    Catalogs,
}

#[derive(Debug, Subcommand)]
enum DeleteTarget {
    Store { alias: String },
    Catalog { alias: String },
}

#[derive(Debug, Subcommand)]
enum CommitTarget {
    /// Run the reconciliation engine for one staged catalog.
    Catalog {
        alias: String,
        /// Apply pending migrations to the remote store first.
        #[arg(long)]
        migrate: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = rackdb_core::load_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let ledger = rackdb_ledger::open_ledger(&config.ledger_path).await?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Add {
            target:
                AddTarget::Store {
                    brand,
                    alias,
                    comments,
                },
        } => {
            stage::add_store(&ledger, &config, &brand, &alias, comments.as_deref()).await?;
            tables::show_stores(&ledger).await?;
        }
        Commands::Add {
            target:
                AddTarget::Catalog {
                    store_alias,
                    alias,
                    comments,
                },
        } => {
            stage::add_catalog(&ledger, &store_alias, &alias, comments.as_deref()).await?;
            tables::show_catalogs(&ledger).await?;
        }
        Commands::Show { target } => match target {
            Some(ShowTarget::Catalogs) => tables::show_catalogs(&ledger).await?,
            Some(ShowTarget::Stores) | None => tables::show_stores(&ledger).await?,
        },
        Commands::Delete {
            target: DeleteTarget::Store { alias },
        } => {
            rackdb_ledger::delete_brand(&ledger, &alias).await?;
            println!("deleted store `{alias}`");
            tables::show_stores(&ledger).await?;
        }
        Commands::Delete {
            target: DeleteTarget::Catalog { alias },
        } => {
            rackdb_ledger::delete_catalog(&ledger, &alias).await?;
            println!("deleted catalog `{alias}`");
            tables::show_catalogs(&ledger).await?;
        }
        Commands::Commit {
            target: CommitTarget::Catalog { alias, migrate },
        } => {
            // Show the table even for a failed commit; its terminal state is
            // on the catalog row either way.
            let result = commit::commit_catalog(&ledger, &config, &alias, migrate).await;
            tables::show_catalogs(&ledger).await?;
            result?;
        }
    }

    Ok(())
}
