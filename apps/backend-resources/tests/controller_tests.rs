use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use mockall::mock;
use serde_json::{json, Value};
use tower::ServiceExt;

use backend_resources::config::MiddlewareConfig;
use backend_resources::error::ApiError;
use backend_resources::keycloak::{
    ClientMappingsRepresentation, CreatedResponse, KeycloakError, MappingsRepresentation,
    RoleRepresentation, UserRepresentation,
};
use backend_resources::middleware::auth::{Authenticator, Principal};
use backend_resources::middleware::role_guard::RequiredRoles;
use backend_resources::services::{IdentityGateway, IdentityProvider};
use backend_resources::{build_router, with_middleware, AppState};

// ==================== MOCKS ====================

mock! {
    pub Provider {}

    #[async_trait]
    impl IdentityProvider for Provider {
        fn realm(&self) -> String;
        async fn create_user(&self, user: &UserRepresentation) -> Result<CreatedResponse, KeycloakError>;
        async fn get_user(&self, user_id: &str) -> Result<UserRepresentation, KeycloakError>;
        async fn get_role_mappings(&self, user_id: &str) -> Result<MappingsRepresentation, KeycloakError>;
    }
}

const MODERATOR_TOKEN: &str = "moderator-token";
const PLAIN_USER_TOKEN: &str = "plain-user-token";
const USER_ID: &str = "903a8dd4-ebcc-49d9-9436-b8b6464d5d10";

/// Accepts two fixed tokens: a moderator named test_user and a caller without roles
struct StaticAuthenticator;

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Principal, ApiError> {
        match token {
            MODERATOR_TOKEN => Ok(Principal::new(
                "test_user",
                BTreeSet::from(["MODERATOR".to_string()]),
            )),
            PLAIN_USER_TOKEN => Ok(Principal::new("plain_user", BTreeSet::new())),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

// ==================== TEST HELPERS ====================

fn new_provider() -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_realm().returning(|| "ITM".to_string());
    provider
}

fn app(provider: MockProvider) -> Router {
    let state = AppState {
        gateway: Arc::new(IdentityGateway::new(Arc::new(provider))),
        authenticator: Arc::new(StaticAuthenticator),
        required_roles: RequiredRoles::new(["MODERATOR"]),
    };
    with_middleware(build_router(state), &MiddlewareConfig::default())
}

fn valid_user_request() -> Value {
    json!({
        "username": "test1",
        "email": "test@mail.ru",
        "password": "test1234",
        "firstName": "te",
        "lastName": "st"
    })
}

fn post_user(body: &Value, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn created_at(id: &str) -> CreatedResponse {
    CreatedResponse {
        status: 201,
        location: Some(format!("http://localhost:8080/admin/realms/ITM/users/{id}")),
        message: String::new(),
    }
}

fn stored_user() -> UserRepresentation {
    UserRepresentation {
        id: Some(USER_ID.to_string()),
        username: "test1".to_string(),
        email: Some("test@mail.ru".to_string()),
        first_name: Some("te".to_string()),
        last_name: Some("st".to_string()),
        enabled: true,
        credentials: vec![],
    }
}

fn stored_mappings() -> MappingsRepresentation {
    let mut client_mappings = HashMap::new();
    client_mappings.insert(
        "account".to_string(),
        ClientMappingsRepresentation {
            client: Some("account".to_string()),
            mappings: vec![RoleRepresentation {
                name: "view-profile".to_string(),
                client_role: true,
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    MappingsRepresentation {
        realm_mappings: vec![RoleRepresentation {
            name: "MODERATOR".to_string(),
            ..Default::default()
        }],
        client_mappings,
    }
}

// ==================== CREATE USER ====================

#[tokio::test]
async fn test_create_user_with_invalid_request() {
    let mut provider = new_provider();
    provider.expect_create_user().never();

    let invalid = json!({
        "username": "test",
        "email": "testiest",
        "password": "test1234",
        "firstName": "te",
        "lastName": "st"
    });

    let response = app(provider)
        .oneshot(post_user(&invalid, MODERATOR_TOKEN))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["errors"].get("email").is_some());
    assert!(body["errors"].get("username").is_none());
}

#[tokio::test]
async fn test_create_user_reports_every_violated_field() {
    let mut provider = new_provider();
    provider.expect_create_user().never();

    let invalid = json!({
        "username": "t",
        "email": "not-an-email",
        "password": "abc",
        "firstName": " ",
        "lastName": ""
    });

    let response = app(provider)
        .oneshot(post_user(&invalid, MODERATOR_TOKEN))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    let errors = body["errors"].as_object().unwrap();
    for field in ["username", "email", "password", "firstName", "lastName"] {
        assert!(errors.contains_key(field), "missing violation for {field}");
    }
}

#[tokio::test]
async fn test_create_user_malformed_json() {
    let mut provider = new_provider();
    provider.expect_create_user().never();

    let request = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {MODERATOR_TOKEN}"))
        .body(Body::from("{\"username\":"))
        .unwrap();

    let response = app(provider).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_user_successfully() {
    let mut provider = new_provider();
    provider
        .expect_create_user()
        .withf(|user| {
            user.username == "test1"
                && user.enabled
                && user.email.as_deref() == Some("test@mail.ru")
                && user.credentials.first().map(|c| c.value.as_str()) == Some("test1234")
        })
        .times(1)
        .returning(|_| Ok(created_at(USER_ID)));

    let response = app(provider)
        .oneshot(post_user(&valid_user_request(), MODERATOR_TOKEN))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["id"], USER_ID);
}

#[tokio::test]
async fn test_create_user_throws_exception() {
    let mut provider = new_provider();
    provider
        .expect_create_user()
        .times(1)
        .returning(|_| Err(KeycloakError::RequestFailed("test exception".to_string())));

    let response = app(provider)
        .oneshot(post_user(&valid_user_request(), MODERATOR_TOKEN))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("test exception"));
}

#[tokio::test]
async fn test_create_user_rejection_reaches_caller() {
    let mut provider = new_provider();
    provider.expect_create_user().returning(|_| {
        Ok(CreatedResponse {
            status: 400,
            location: None,
            message: "Password policy not met".to_string(),
        })
    });

    let response = app(provider)
        .oneshot(post_user(&valid_user_request(), MODERATOR_TOKEN))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], 400);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Password policy not met"));
}

#[tokio::test]
async fn test_create_user_service_account_refused() {
    let mut provider = new_provider();
    provider.expect_create_user().returning(|_| {
        Err(KeycloakError::Status {
            status: 403,
            message: "HTTP 403 Forbidden".to_string(),
        })
    });

    let response = app(provider)
        .oneshot(post_user(&valid_user_request(), MODERATOR_TOKEN))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_create_user_conflict() {
    let mut provider = new_provider();
    provider
        .expect_create_user()
        .returning(|user| Err(KeycloakError::UserAlreadyExists(user.username.clone())));

    let response = app(provider)
        .oneshot(post_user(&valid_user_request(), MODERATOR_TOKEN))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_user_requires_moderator() {
    let mut provider = new_provider();
    provider.expect_create_user().never();

    let response = app(provider)
        .oneshot(post_user(&valid_user_request(), PLAIN_USER_TOKEN))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_user_requires_token() {
    let mut provider = new_provider();
    provider.expect_create_user().never();

    let request = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(valid_user_request().to_string()))
        .unwrap();

    let response = app(provider).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ==================== GET USER BY ID ====================

#[tokio::test]
async fn test_get_user_by_id() {
    let mut provider = new_provider();
    provider
        .expect_get_user()
        .withf(|id| id == USER_ID)
        .times(1)
        .returning(|_| Ok(stored_user()));
    provider
        .expect_get_role_mappings()
        .withf(|id| id == USER_ID)
        .times(1)
        .returning(|_| Ok(stored_mappings()));

    let response = app(provider)
        .oneshot(get(&format!("/api/users/{USER_ID}"), Some(MODERATOR_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["id"], USER_ID);
    assert_eq!(body["username"], "test1");
    assert_eq!(body["email"], "test@mail.ru");
    assert_eq!(body["firstName"], "te");
    assert_eq!(body["lastName"], "st");
    assert_eq!(body["roles"], json!(["MODERATOR", "view-profile"]));
}

#[tokio::test]
async fn test_get_user_by_id_throw_exception() {
    let mut provider = new_provider();
    provider.expect_get_user().times(1).returning(|_| {
        Err(KeycloakError::Status {
            status: 500,
            message: "Error message".to_string(),
        })
    });
    provider.expect_get_role_mappings().never();

    let response = app(provider)
        .oneshot(get(&format!("/api/users/{USER_ID}"), Some(MODERATOR_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("Error message"));
}

#[tokio::test]
async fn test_get_user_by_id_not_found() {
    let mut provider = new_provider();
    provider
        .expect_get_user()
        .returning(|id| Err(KeycloakError::UserNotFound(id.to_string())));
    provider.expect_get_role_mappings().never();

    let response = app(provider)
        .oneshot(get("/api/users/unknown-id", Some(MODERATOR_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["message"].as_str().unwrap().contains("unknown-id"));
}

#[tokio::test]
async fn test_get_user_by_id_role_lookup_failure() {
    let mut provider = new_provider();
    provider.expect_get_user().returning(|_| Ok(stored_user()));
    provider
        .expect_get_role_mappings()
        .returning(|_| Err(KeycloakError::RequestFailed("connection reset".to_string())));

    let response = app(provider)
        .oneshot(get(&format!("/api/users/{USER_ID}"), Some(MODERATOR_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("connection reset"));
}

#[tokio::test]
async fn test_get_user_by_id_is_idempotent() {
    let mut provider = new_provider();
    provider
        .expect_get_user()
        .times(2)
        .returning(|_| Ok(stored_user()));
    provider
        .expect_get_role_mappings()
        .times(2)
        .returning(|_| Ok(stored_mappings()));

    let app = app(provider);
    let uri = format!("/api/users/{USER_ID}");

    let first = app
        .clone()
        .oneshot(get(&uri, Some(MODERATOR_TOKEN)))
        .await
        .unwrap();
    let second = app.oneshot(get(&uri, Some(MODERATOR_TOKEN))).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_string(first).await, body_string(second).await);
}

#[tokio::test]
async fn test_get_user_by_id_rejects_encoded_path() {
    let mut provider = new_provider();
    provider.expect_get_user().never();
    provider.expect_get_role_mappings().never();

    let response = app(provider)
        .oneshot(get(
            "/api/users/..%2F..%2Fmaster%2Fusers%2Fadmin-id",
            Some(MODERATOR_TOKEN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_user_by_id_requires_moderator() {
    let mut provider = new_provider();
    provider.expect_get_user().never();

    let response = app(provider)
        .oneshot(get(&format!("/api/users/{USER_ID}"), Some(PLAIN_USER_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ==================== HELLO ====================

#[tokio::test]
async fn test_hello() {
    let mut provider = new_provider();
    provider.expect_get_user().never();

    let response = app(provider)
        .oneshot(get("/api/users/hello", Some(MODERATOR_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("test_user"));
}

#[tokio::test]
async fn test_hello_only_needs_authentication() {
    let response = app(new_provider())
        .oneshot(get("/api/users/hello", Some(PLAIN_USER_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "plain_user");
}

#[tokio::test]
async fn test_hello_rejects_unknown_token() {
    let response = app(new_provider())
        .oneshot(get("/api/users/hello", Some("forged")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
}

// ==================== SERVICE ====================

#[tokio::test]
async fn test_health_is_public() {
    let response = app(new_provider())
        .oneshot(get("/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "UP");
    assert_eq!(body["realm"], "ITM");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = app(new_provider())
        .oneshot(get("/health", None))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
