use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::methods::entities::{CreatedUserResponse, UserRequest};
use crate::methods::routes::USERS_PATH;
use crate::middleware::auth::Principal;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = USERS_PATH,
    tag = "users",
    request_body = UserRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User created", body = CreatedUserResponse),
        (status = 400, description = "Validation error", body = crate::error::ValidationErrorResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller lacks the required role"),
        (status = 500, description = "Identity provider failure", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(payload): ValidatedJson<UserRequest>,
) -> Result<Json<CreatedUserResponse>, ApiError> {
    tracing::debug!(principal = %principal.name, username = %payload.username, "create_user");

    let id = state.gateway.create_user(&payload).await?;
    Ok(Json(CreatedUserResponse { id }))
}
