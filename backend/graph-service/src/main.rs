use actix_middleware::{CallerIdentityMiddleware, CorrelationIdMiddleware};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use db_pool::{create_pool, DbConfig};
use graph_service::config::Config;
use graph_service::repository::{
    FollowGraphStore, InMemoryFollowGraphStore, PostgresFollowGraphStore,
};
use graph_service::{handlers, logging, FollowService};
use identity_client::{IdentityDirectory, InMemoryIdentityDirectory, PgIdentityDirectory};
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    logging::init_tracing();

    info!(
        "Starting Graph Service: port = {}, storage = {}",
        config.port, config.storage_backend
    );

    let (graph, directory): (Arc<dyn FollowGraphStore>, Arc<dyn IdentityDirectory>) =
        if config.uses_memory_backend() {
            info!("Using in-memory follow graph and directory");
            let directory = InMemoryIdentityDirectory::new();
            for handle in config.seed_handles() {
                let identity = directory
                    .register(&handle, &handle)
                    .await
                    .with_context(|| format!("Failed to seed handle {handle}"))?;
                info!(handle = %identity.handle, id = %identity.id, "Seeded identity");
            }
            (Arc::new(InMemoryFollowGraphStore::new()), Arc::new(directory))
        } else {
            let db_config = DbConfig::from_env("graph-service").map_err(anyhow::Error::msg)?;
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

            (
                Arc::new(PostgresFollowGraphStore::new(
                    pool.clone(),
                    config.store_timeout(),
                )),
                Arc::new(PgIdentityDirectory::new(pool, config.store_timeout())),
            )
        };

    let service = web::Data::new(FollowService::new(graph, directory));
    let bind_addr = (config.app_host.clone(), config.port);
    info!("HTTP server listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
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

    info!("Graph Service shut down");
    Ok(())
}
