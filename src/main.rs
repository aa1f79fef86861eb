use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use inventory_api::config::{Backend, Config};
use inventory_api::observability::{init_logging, init_metrics};
use inventory_api::server::{create_server, start_server};
use inventory_api::storage::{
    InMemoryItemRepository, ItemRepository, SqliteClient, SqliteItemRepository,
};
use inventory_api::ItemUseCase;

#[derive(Parser)]
#[command(name = "inventory_api")]
#[command(about = "Inventory item API")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Storage backend: memory, sqlite or libsql
        #[arg(long)]
        backend: Option<Backend>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the SQLite items table if it does not exist, then exit
    Migrate,
}

/// Database clients that must be released explicitly at shutdown.
enum StoreHandle {
    InMemory,
    Sqlite(SqliteClient),
    #[cfg(feature = "db")]
    Turso(inventory_api::storage::turso::TursoClient),
}

impl StoreHandle {
    fn close(self) -> anyhow::Result<()> {
        match self {
            StoreHandle::InMemory => {}
            StoreHandle::Sqlite(client) => client.close()?,
            #[cfg(feature = "db")]
            StoreHandle::Turso(client) => client.close(),
        }
        Ok(())
    }
}

async fn build_repository(config: &Config) -> anyhow::Result<(Arc<dyn ItemRepository>, StoreHandle)> {
    match config.storage.backend {
        Backend::Memory => Ok((Arc::new(InMemoryItemRepository::new()), StoreHandle::InMemory)),
        Backend::Sqlite => {
            let client = SqliteClient::open(&config.storage.sqlite_path)?;
            let repo = SqliteItemRepository::new(&client);
            Ok((Arc::new(repo), StoreHandle::Sqlite(client)))
        }
        #[cfg(feature = "db")]
        Backend::Libsql => {
            use inventory_api::storage::turso::{TursoClient, TursoItemRepository};

            let url = config
                .storage
                .libsql_url
                .as_deref()
                .context("LIBSQL_URL must be set for the libsql backend")?;
            let token = config.storage.libsql_auth_token.as_deref().unwrap_or_default();
            let client = TursoClient::connect_remote(url, token).await?;
            let repo = TursoItemRepository::new(&client);
            Ok((Arc::new(repo), StoreHandle::Turso(client)))
        }
        #[cfg(not(feature = "db"))]
        Backend::Libsql => anyhow::bail!("the libsql backend requires building with the `db` feature"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = init_logging();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Serve { backend, port } => {
            if let Some(backend) = backend {
                config.storage.backend = backend;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if config.metrics.enabled {
                init_metrics(config.metrics.port);
            }

            let (repo, store) = build_repository(&config).await?;
            info!("Using {} item storage", repo.backend_name());

            let use_case = Arc::new(ItemUseCase::new(repo));
            let app = create_server(use_case);

            let addr: SocketAddr = config
                .bind_address()
                .parse()
                .with_context(|| format!("invalid bind address '{}'", config.bind_address()))?;
            start_server(app, addr).await?;

            store.close()?;
        }
        Commands::Migrate => {
            let client = SqliteClient::open(&config.storage.sqlite_path)?;
            client.ping()?;
            info!("Items table ready at {}", config.storage.sqlite_path);
            client.close()?;
        }
    }

    Ok(())
}
