mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{ItemhubConfig, CONFIG_FILE, ITEMHUB_DIR};
use server::{create_router, state::AppState};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "itemhub")]
#[command(about = "Item management with concurrent batch processing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .itemhub/ with a default config and an empty database
    Init,
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Print item counts per status
    Status,
}

#[derive(clap::Args, Default)]
struct ServeArgs {
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(long)]
    database_url: Option<String>,

    /// Maximum number of items processed at once
    #[arg(long)]
    workers: Option<usize>,

    /// Deadline for a processing batch
    #[arg(long)]
    batch_timeout_ms: Option<u64>,
}

impl ServeArgs {
    fn apply(self, config: &mut ItemhubConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(database_url) = self.database_url {
            config.server.database_url = database_url;
        }
        if let Some(workers) = self.workers {
            config.processor.workers = Some(workers);
        }
        if let Some(timeout) = self.batch_timeout_ms {
            config.processor.batch_timeout_ms = Some(timeout);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => init_project().await,
        Some(Commands::Serve(args)) => serve(args).await,
        Some(Commands::Status) => status().await,
        None => serve(ServeArgs::default()).await,
    }
}

fn itemhub_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join(ITEMHUB_DIR))
}

async fn init_project() -> Result<()> {
    let dir = itemhub_dir()?;

    if dir.exists() {
        println!("Already initialized at {}", dir.display());
        return Ok(());
    }

    tokio::fs::create_dir_all(&dir).await?;

    let config = ItemhubConfig::default();
    config.save(&dir.join(CONFIG_FILE)).await?;

    let pool = db::create_pool(&config.server.database_url, db::DEFAULT_MAX_CONNECTIONS).await?;
    db::run_migrations(&pool).await?;

    println!("Initialized itemhub in {}", dir.display());
    println!();
    println!("Created:");
    println!("  {}/", ITEMHUB_DIR);
    println!("  ├── {}", CONFIG_FILE);
    println!("  └── items.db");
    println!();
    println!("Run 'itemhub serve' to start the server");

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let dir = itemhub_dir()?;
    let mut config = ItemhubConfig::load(&dir.join(CONFIG_FILE)).await?;
    args.apply(&mut config);

    init_tracing();

    if !dir.exists() {
        tracing::warn!("No {} directory found, using default configuration", ITEMHUB_DIR);
        tokio::fs::create_dir_all(&dir).await?;
    }

    tracing::info!(database_url = %config.server.database_url, "Opening database");

    let pool = db::create_pool(&config.server.database_url, db::DEFAULT_MAX_CONNECTIONS)
        .await
        .context("Failed to create database pool")?;
    db::run_migrations(&pool).await?;

    let state = AppState::new(pool, &config.processor.to_config())
        .context("Failed to start worker pool")?;
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.server.port)).await?;

    println!();
    println!("itemhub");
    println!("════════════════════════════════════════");
    println!();
    println!("  API Server:  http://localhost:{}", config.server.port);
    println!("  OpenAPI:     http://localhost:{}/api/openapi.json", config.server.port);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
    }
}

async fn status() -> Result<()> {
    let dir = itemhub_dir()?;

    if !dir.exists() {
        println!("Not an itemhub project.");
        println!("Run 'itemhub init' to initialize.");
        return Ok(());
    }

    let config = ItemhubConfig::load(&dir.join(CONFIG_FILE)).await?;
    let pool = db::create_pool(&config.server.database_url, 1).await?;
    db::run_migrations(&pool).await?;

    let counts = db::ItemRepository::new(pool).count_by_status().await?;
    let total: i64 = counts.iter().map(|(_, count)| count).sum();

    println!();
    println!("Database: {}", config.server.database_url);
    println!();
    println!("Items ({}):", total);
    for (status, count) in &counts {
        println!("  {:<10} {}", status.as_str(), count);
    }
    println!();

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "itemhub=info,server=info,processor=info,db=info,tower_http=info".into()
            }),
        )
        .init();
}
