use crate::{
    api::error::ApiError,
    db::app_state::{self, LAST_MONITORED_TRANSACTION_INDEX},
    models::SyncStateResponse,
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sync-state", get(get_sync_state))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// GET /sync-state handler. Combines the monitor's last verdict with the
/// ingestion cursor to report how far behind the node this mirror is.
async fn get_sync_state(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let history = *state.sync_history.read().await;
    let sync_iteration_tip = state.last_iteration_index.load(Ordering::Relaxed);

    let mut conn = state.db_pool.acquire().await?;
    let last_monitored =
        app_state::get_cursor(&mut conn, LAST_MONITORED_TRANSACTION_INDEX).await?;

    let node_tip = history.last_index_main.max(history.last_index_backup);
    let sync_percentage = if node_tip > 0 {
        (last_monitored.max(0) as f64 / node_tip as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    let body = SyncStateResponse {
        node_tip_index: node_tip,
        sync_iteration_tip_index: sync_iteration_tip,
        last_monitored_index: last_monitored,
        sync_percentage,
        is_synced: history.is_synced,
    };
    Ok(Json(body).into_response())
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}
