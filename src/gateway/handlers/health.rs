//! Health check handler

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResponse, ApiResult, ok};
use crate::error::LedgerError;

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp_ms: u64,
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Health check endpoint
///
/// Pings the backing store, at most once per interval so load balancer
/// checks cannot hammer the database. The response never exposes store
/// details.
///
/// - Healthy: 200 OK + success envelope with {timestamp_ms}
/// - Unhealthy: 503 Service Unavailable + failure envelope
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service healthy", body = ApiResponse<HealthResponse>),
        (status = 503, description = "Storage unreachable")
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    static LAST_PING_MS: AtomicU64 = AtomicU64::new(0);
    static STORE_OK: AtomicBool = AtomicBool::new(true);
    const PING_INTERVAL_MS: u64 = 5000;

    let now_ms = unix_millis();
    let stale = now_ms.saturating_sub(LAST_PING_MS.load(Ordering::Relaxed)) > PING_INTERVAL_MS;
    let healthy = if stale {
        LAST_PING_MS.store(now_ms, Ordering::Relaxed);
        let alive = state.store.health_check().await.is_ok();
        STORE_OK.store(alive, Ordering::Relaxed);
        alive
    } else {
        // Pinged recently; answer from the cached result
        STORE_OK.load(Ordering::Relaxed)
    };

    if !healthy {
        return Err(LedgerError::Persistence("storage unreachable".to_string()).into());
    }

    ok(
        "Service healthy",
        HealthResponse {
            timestamp_ms: now_ms,
        },
    )
}
