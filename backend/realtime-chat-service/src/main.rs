use actix_middleware::{CallerIdentityMiddleware, CorrelationIdMiddleware};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use db_pool::{create_pool, DbConfig};
use identity_client::{IdentityDirectory, InMemoryIdentityDirectory, PgIdentityDirectory};
use realtime_chat_service::config::Config;
use realtime_chat_service::db::{InMemoryMessageStore, MessageStore, PgMessageStore};
use realtime_chat_service::{logging, routes, AppState, ConnectionRegistry, ConversationService};
use s3_utils::{DisabledObjectStore, InMemoryObjectStore, ObjectStore, S3Config, S3ObjectStore};
use std::sync::Arc;
use tracing::info;

type Backends = (
    Arc<dyn MessageStore>,
    Arc<dyn IdentityDirectory>,
    Arc<dyn ObjectStore>,
);

async fn memory_backends(config: &Config) -> Result<Backends> {
    info!("Using in-memory message store and directory");
    let directory = InMemoryIdentityDirectory::new();
    for handle in config.seed_handles() {
        let identity = directory
            .register(&handle, &handle)
            .await
            .with_context(|| format!("Failed to seed handle {handle}"))?;
        info!(handle = %identity.handle, id = %identity.id, "Seeded identity");
    }

    Ok((
        Arc::new(InMemoryMessageStore::new()),
        Arc::new(directory),
        Arc::new(InMemoryObjectStore::new()),
    ))
}

async fn postgres_backends(config: &Config) -> Result<Backends> {
    let db_config = DbConfig::from_env("realtime-chat-service").map_err(anyhow::Error::msg)?;
    db_config.log_config();
    let pool = create_pool(db_config)
        .await
        .context("Failed to connect to PostgreSQL")?;

    identity_client::run_migrations(&pool)
        .await
        .context("Failed to run identity migrations")?;
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let media: Arc<dyn ObjectStore> = if config.media_uploads_enabled {
        Arc::new(S3ObjectStore::new(S3Config::from_env()).await)
    } else {
        info!("Media uploads disabled");
        Arc::new(DisabledObjectStore)
    };

    Ok((
        Arc::new(PgMessageStore::new(pool.clone(), config.store_timeout())),
        Arc::new(PgIdentityDirectory::new(pool, config.store_timeout())),
        media,
    ))
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    logging::init_tracing();

    info!(
        "Starting Realtime Chat Service: port = {}, storage = {}",
        config.port, config.storage_backend
    );

    let (messages, directory, media) = if config.uses_memory_backend() {
        memory_backends(&config).await?
    } else {
        postgres_backends(&config).await?
    };

    let registry = ConnectionRegistry::new();
    let state = web::Data::new(AppState {
        conversations: ConversationService::new(messages, directory, media, registry.clone()),
        registry,
        ws_client_timeout: config.ws_client_timeout(),
    });

    let bind_addr = (config.app_host.clone(), config.port);
    info!("HTTP server listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(CallerIdentityMiddleware)
            .wrap(CorrelationIdMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure)
    })
    .bind(bind_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("Realtime Chat Service shut down");
    Ok(())
}
