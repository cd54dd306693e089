pub const SERVICE: &str = "backend-resources";
pub const ENV: &str = "ENV";

pub const LOCAL_ENV: &str = "local";

pub const BACKEND_RESOURCES_PORT: &str = "BACKEND_RESOURCES_PORT";
pub const DEFAULT_PORT: u16 = 9191;

// Keycloak configuration
pub const KEYCLOAK_URL: &str = "KEYCLOAK_URL";
pub const KEYCLOAK_REALM: &str = "KEYCLOAK_REALM";
pub const KEYCLOAK_CLIENT_ID: &str = "KEYCLOAK_CLIENT_ID";
pub const KEYCLOAK_CLIENT_SECRET: &str = "KEYCLOAK_CLIENT_SECRET";
pub const KEYCLOAK_HTTP_TIMEOUT_SECS: &str = "KEYCLOAK_HTTP_TIMEOUT_SECS";

// Authorization
pub const REQUIRED_ROLES: &str = "REQUIRED_ROLES";
pub const MODERATOR_ROLE: &str = "MODERATOR";

// Middleware configuration
pub const RATE_LIMIT_PER_MINUTE: &str = "RATE_LIMIT_PER_MINUTE";
pub const RATE_LIMIT_BURST: &str = "RATE_LIMIT_BURST";
pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
pub const MAX_BODY_SIZE_BYTES: &str = "MAX_BODY_SIZE_BYTES";
pub const SHUTDOWN_TIMEOUT_SECS: &str = "SHUTDOWN_TIMEOUT_SECS";
