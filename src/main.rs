use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use research_site::app::{build_router, AppState};
use research_site::auth::config::{hash_password, AdminCredentials};
use research_site::config::{AppConfig, Backend};
use research_site::db::memory::InMemoryDocumentStore;
use research_site::db::repository::{DocumentStore, MongoDocumentStore};
use research_site::storage::client::{S3StorageClient, StorageClient};
use research_site::storage::media::MediaUrlScheme;
use research_site::storage::memory::InMemoryStorageClient;

#[derive(Parser)]
#[command(name = "research-site", version, about = "Content API for the research consultancy website")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Print the argon2 hash of a password for `admin.password_hash`.
    HashPassword {
        #[arg(env = "SITE_ADMIN_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
            Ok(())
        }
        Command::Serve => serve().await,
    }
}

async fn serve() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_site=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting research site server...");

    let config = AppConfig::load().context("Failed to load configuration")?;

    let (store, storage): (Arc<dyn DocumentStore>, Arc<dyn StorageClient>) = match config.backend {
        Backend::Mongo => {
            let mongo_client = mongodb::Client::with_uri_str(&config.mongodb.uri)
                .await
                .context("Failed to connect to MongoDB")?;
            let mongo_db = mongo_client.database(&config.mongodb.database);
            let store = MongoDocumentStore::new(&mongo_db);
            store.ensure_indexes().await?;
            tracing::info!("Connected to MongoDB at {}", config.mongodb.uri);

            let storage = S3StorageClient::connect(
                &config.s3.bucket,
                &config.s3.region,
                config.s3.endpoint.as_deref(),
            )
            .await;
            tracing::info!("S3 storage client initialized (bucket '{}')", config.s3.bucket);

            (Arc::new(store), Arc::new(storage))
        }
        Backend::Memory => {
            tracing::warn!("Using in-memory backends; content is lost on restart");
            (
                Arc::new(InMemoryDocumentStore::new()),
                Arc::new(InMemoryStorageClient::new()),
            )
        }
    };

    let admin = AdminCredentials::new(config.admin.email.clone(), config.admin.password_hash.clone());
    if !admin.is_configured() {
        tracing::warn!("No valid admin password hash configured; admin login is disabled");
    }

    let media = MediaUrlScheme::new(&config.media_base_url())?;
    let state = AppState::new(
        store.clone(),
        storage,
        media,
        admin,
        chrono::Duration::minutes(config.session_ttl_minutes),
        config.max_upload_bytes,
    );

    if config.seed_demo_content {
        research_site::demo_seeder::seed_demo_content(store.as_ref(), &state.manager).await;
    }

    let app = build_router(state);

    tracing::info!("Listening on http://{}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
