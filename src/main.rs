use dag_mirror_service::{api, config::Config, db, state::AppState, sync, upstream::NodeClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dag-mirror-service");

    let config = Config::from_env();

    let db_pool = db::connection::establish_connection(&config.database_url).await?;
    db::migration::run_migrations(&db_pool).await?;
    db::migration::verify_app_states(&db_pool).await?;
    tracing::info!("Database ready");

    let app_state = Arc::new(AppState::new(config.clone(), db_pool));
    let client = NodeClient::new(&config)?;
    let shutdown = CancellationToken::new();

    let mut tasks = Vec::new();
    tasks.push(tokio::spawn(sync::monitor::run(
        app_state.clone(),
        client.clone(),
        shutdown.clone(),
    )));
    tasks.push(tokio::spawn(sync::ingestion::run(
        app_state.clone(),
        client.clone(),
        shutdown.clone(),
    )));
    tasks.push(tokio::spawn(sync::consensus::run(
        app_state.clone(),
        client.clone(),
        shutdown.clone(),
    )));
    tasks.push(tokio::spawn(sync::balances::run(
        app_state.clone(),
        shutdown.clone(),
    )));
    tasks.push(tokio::spawn(sync::reaper::run(
        app_state.clone(),
        shutdown.clone(),
    )));
    tracing::info!("Sync tasks started");

    let app = api::create_router(app_state);
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    for task in tasks {
        let _ = task.await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
