use axum::extract::State;

use crate::methods::routes::USERS_HELLO_PATH;
use crate::middleware::auth::Principal;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = USERS_HELLO_PATH,
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Name of the authenticated caller", body = String),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn hello(State(state): State<AppState>, principal: Principal) -> String {
    state.gateway.who_am_i(&principal.name)
}
