//! GET /health - liveness plus a database round trip (no auth required).

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let database = database_ping(&state).await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if database { "ok" } else { "degraded" },
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

async fn database_ping(state: &AppState) -> bool {
    match state.db_pool.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "health check database ping failed");
            false
        }
    }
}
