use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::MiddlewareConfig;
use crate::error::{ErrorResponse, ValidationErrorResponse};
use crate::methods::create_user::{__path_create_user, create_user};
use crate::methods::entities::{CreatedUserResponse, UserRequest, UserResponse};
use crate::methods::get_user_by_id::{__path_get_user_by_id, get_user_by_id};
use crate::methods::health_check::{__path_health_check, health_check, HealthResponse};
use crate::methods::hello::{__path_hello, hello};
use crate::methods::routes::{
    API_PREFIX, OPENAPI_JSON_PATH, SERVICE_DOCS_PATH, SERVICE_HEALTH_PATH, USERS_BY_ID_PATH,
    USERS_HELLO_PATH, USERS_PATH,
};
use crate::middleware::auth::authenticate;
use crate::middleware::role_guard::require_roles;
use crate::state::AppState;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(paths(create_user, get_user_by_id, hello))]
struct UsersApi;

/// Users routes are documented under the same /api prefix they are served on
#[derive(OpenApi)]
#[openapi(
    nest((path = "/api", api = UsersApi)),
    paths(health_check),
    components(schemas(
        UserRequest, UserResponse, CreatedUserResponse, ErrorResponse,
        ValidationErrorResponse, HealthResponse
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "users", description = "User management backed by Keycloak"),
        (name = "service", description = "Service endpoints")
    )
)]
pub struct ApiDoc;

/// Routes with authentication and role gating, without the transport middleware
pub fn build_router(state: AppState) -> Router {
    let role_guard = from_fn_with_state(state.required_roles.clone(), require_roles);

    // /users/hello is matched ahead of /users/{id}
    let api_routes = Router::new()
        .route(USERS_PATH, post(create_user).route_layer(role_guard.clone()))
        .route(USERS_HELLO_PATH, get(hello))
        .route(USERS_BY_ID_PATH, get(get_user_by_id).route_layer(role_guard))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .nest(API_PREFIX, api_routes)
        .route(SERVICE_HEALTH_PATH, get(health_check))
        .merge(SwaggerUi::new(SERVICE_DOCS_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
        .with_state(state)
}

/// Wrap the router in the HTTP middleware stack.
///
/// Applied inner to outer: trace, request id, body limit, CORS, timeout.
/// Rate limiting needs the peer address and is added by the binary.
pub fn with_middleware(router: Router, config: &MiddlewareConfig) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            x_request_id.clone(),
        ]);
    let cors = if config.allows_any_origin() {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
}
