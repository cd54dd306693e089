// API routes (nested under /api)
pub const USERS_PATH: &str = "/users";
pub const USERS_BY_ID_PATH: &str = "/users/{id}";
pub const USERS_HELLO_PATH: &str = "/users/hello";

// Root-level service routes
pub const SERVICE_HEALTH_PATH: &str = "/health";
pub const SERVICE_DOCS_PATH: &str = "/docs";
pub const OPENAPI_JSON_PATH: &str = "/api-doc/openapi.json";

pub const API_PREFIX: &str = "/api";
