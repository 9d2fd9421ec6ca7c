use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use deadpool_diesel::postgres::{Manager as DeadpoolManager, Runtime as DeadpoolRuntime};
use deadpool_diesel::postgres::Pool as DeadpoolPool;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use masquerade_backend::config::Config;
use masquerade_backend::llm::{RetryingAiClient, build_gemini_client, build_gemini_embedding_client};
use masquerade_backend::logging::init_subscriber;
use masquerade_backend::routes::api_router;
use masquerade_backend::services::embeddings::EmbeddingPipelineService;
use masquerade_backend::state::AppState;
use masquerade_backend::vector_db::QdrantClientService;
use masquerade_backend::PgPool;

// Define the embedded migrations macro
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_subscriber();

    tracing::info!("Starting Masquerade backend server...");

    let config = Arc::new(Config::load().context("Failed to load configuration")?);

    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL must be set")?;
    tracing::info!("Connecting to database...");
    let manager = DeadpoolManager::new(database_url, DeadpoolRuntime::Tokio1);
    let pool: PgPool = DeadpoolPool::builder(manager)
        .runtime(DeadpoolRuntime::Tokio1)
        .build()
        .context("Failed to create DB pool")?;
    tracing::info!("Database connection pool established.");

    run_migrations(&pool).await?;

    // --- AI / vector service setup ---
    let inner_ai_client = build_gemini_client().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let ai_client = Arc::new(RetryingAiClient::with_defaults(inner_ai_client));

    let embedding_client = Arc::new(
        build_gemini_embedding_client(config.clone())
            .map_err(|e| anyhow::anyhow!(e.to_string()))?,
    );

    let vector_store = Arc::new(
        QdrantClientService::new(config.clone())
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))?,
    );

    let embedding_pipeline = Arc::new(EmbeddingPipelineService::new(
        embedding_client.clone(),
        vector_store.clone(),
    ));

    let app_state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        ai_client,
        embedding_client,
        vector_store,
        embedding_pipeline,
    };

    let app = api_router(app_state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .context("Invalid address format")?;

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_migrations(pool: &PgPool) -> Result<()> {
    tracing::info!("Attempting to run database migrations...");
    let conn = pool
        .get()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to get connection for migration: {}", e))?;
    conn.interact(|conn| match conn.run_pending_migrations(MIGRATIONS) {
        Ok(versions) => {
            if versions.is_empty() {
                tracing::info!("No pending migrations found.");
            } else {
                tracing::info!("Successfully ran migrations: {:?}", versions);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {:?}", e);
            Err(anyhow::anyhow!("Migration diesel error: {:?}", e))
        }
    })
    .await
    .map_err(|e| anyhow::anyhow!("Migration interact task failed: {}", e))??;
    Ok(())
}
