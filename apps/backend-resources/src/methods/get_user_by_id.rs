use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::ApiError;
use crate::methods::entities::UserResponse;
use crate::methods::routes::USERS_BY_ID_PATH;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = USERS_BY_ID_PATH,
    tag = "users",
    security(("bearer" = [])),
    params(
        ("id" = String, Path, description = "Identity provider user id")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the required role"),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Identity provider failure", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_user_by_id(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    state.gateway.get_user_by_id(&id).await.map(Json)
}
