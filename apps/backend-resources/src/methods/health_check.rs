use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::methods::routes::SERVICE_HEALTH_PATH;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub realm: String,
}

/// Liveness only; the identity provider is not contacted
#[utoipa::path(
    get,
    path = SERVICE_HEALTH_PATH,
    tag = "service",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        realm: state.gateway.realm(),
    })
}
