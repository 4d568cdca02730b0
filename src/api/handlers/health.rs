//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse, SystemInfo};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /healthcheck`
///
/// # Response Codes
///
/// - **200 OK**: The store answers a ping
/// - **503 Service Unavailable**: The store is unreachable
///
/// A failing cache is reported but does not degrade the service, since
/// resolves fall back to the store.
///
/// # Response
///
/// ```json
/// {
///   "status": "available",
///   "system_info": { "environment": "production", "version": "0.1.0" },
///   "checks": {
///     "store": { "status": "ok", "message": "Store reachable" },
///     "cache": { "status": "ok", "message": "redis connected" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store_check = check_store(&state).await;

    let cache_check = check_cache(&state).await;

    let available = store_check.is_ok();

    let response = HealthResponse {
        status: if available { "available" } else { "degraded" }.to_string(),
        system_info: SystemInfo {
            environment: state.environment.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        checks: HealthChecks {
            store: store_check,
            cache: cache_check,
        },
    };

    if available {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_store(state: &AppState) -> CheckStatus {
    if state.shortening_service.store_healthy().await {
        CheckStatus::ok("Store reachable")
    } else {
        CheckStatus::error("Store ping failed or timed out")
    }
}

/// Checks cache connectivity via PING command.
async fn check_cache(state: &AppState) -> CheckStatus {
    let backend = state.shortening_service.cache_backend();

    if state.shortening_service.cache_healthy().await {
        CheckStatus::ok(format!("{backend} connected"))
    } else {
        CheckStatus::error(format!("{backend} connection failed"))
    }
}
