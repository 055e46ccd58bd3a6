use actix_middleware::{CallerIdentityMiddleware, CorrelationIdMiddleware};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use content_service::config::Config;
use content_service::db::{InMemoryPostStore, PgPostStore, PostStore};
use content_service::services::{FeedAssembler, PostService};
use content_service::{handlers, logging};
use db_pool::{create_pool, DbConfig};
use graph_service::{FollowGraphStore, InMemoryFollowGraphStore, PostgresFollowGraphStore};
use identity_client::{IdentityDirectory, InMemoryIdentityDirectory, PgIdentityDirectory};
use s3_utils::{DisabledObjectStore, InMemoryObjectStore, ObjectStore, S3Config, S3ObjectStore};
use std::sync::Arc;
use tracing::info;

struct Backends {
    posts: Arc<dyn PostStore>,
    graph: Arc<dyn FollowGraphStore>,
    directory: Arc<dyn IdentityDirectory>,
    media: Arc<dyn ObjectStore>,
}

async fn memory_backends(config: &Config) -> Result<Backends> {
    info!("Using in-memory post store, follow graph and directory");
    let directory = InMemoryIdentityDirectory::new();
    for handle in config.seed_handles() {
        let identity = directory
            .register(&handle, &handle)
            .await
            .with_context(|| format!("Failed to seed handle {handle}"))?;
        info!(handle = %identity.handle, id = %identity.id, "Seeded identity");
    }

    Ok(Backends {
        posts: Arc::new(InMemoryPostStore::new()),
        graph: Arc::new(InMemoryFollowGraphStore::new()),
        directory: Arc::new(directory),
        media: Arc::new(InMemoryObjectStore::new()),
    })
}

async fn postgres_backends(config: &Config) -> Result<Backends> {
    let db_config = DbConfig::from_env("content-service").map_err(anyhow::Error::msg)?;
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

    let timeout = config.store_timeout();
    Ok(Backends {
        posts: Arc::new(PgPostStore::new(pool.clone(), timeout)),
        graph: Arc::new(PostgresFollowGraphStore::new(pool.clone(), timeout)),
        directory: Arc::new(PgIdentityDirectory::new(pool, timeout)),
        media,
    })
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    logging::init_tracing();

    info!(
        "Starting Content Service: port = {}, storage = {}, write_retry_limit = {}",
        config.port, config.storage_backend, config.write_retry_limit
    );

    let backends = if config.uses_memory_backend() {
        memory_backends(&config).await?
    } else {
        postgres_backends(&config).await?
    };

    let post_service = web::Data::new(PostService::new(
        backends.posts.clone(),
        backends.directory.clone(),
        backends.media,
        config.write_retry(),
    ));
    let feed = web::Data::new(FeedAssembler::new(
        backends.graph,
        backends.posts,
        backends.directory,
    ));

    let bind_addr = (config.app_host.clone(), config.port);
    info!("HTTP server listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .app_data(post_service.clone())
            .app_data(feed.clone())
            .wrap(CallerIdentityMiddleware)
            .wrap(CorrelationIdMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(bind_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("Content Service shut down");
    Ok(())
}
