use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    BACKEND_RESOURCES_PORT, CORS_ALLOWED_ORIGINS, DEFAULT_PORT, ENV, MAX_BODY_SIZE_BYTES,
    MODERATOR_ROLE, RATE_LIMIT_BURST, RATE_LIMIT_PER_MINUTE, REQUEST_TIMEOUT_SECS,
    REQUIRED_ROLES, SHUTDOWN_TIMEOUT_SECS,
};
use crate::keycloak::KeycloakConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("{0} must name at least one role")]
    NoRoles(&'static str),
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Unset falls back to MODERATOR; a set but blank list is rejected
fn parse_required_roles(value: Option<String>) -> Result<Vec<String>, ConfigError> {
    let Some(value) = value else {
        return Ok(vec![MODERATOR_ROLE.to_string()]);
    };

    let roles = split_list(&value);
    if roles.is_empty() {
        return Err(ConfigError::NoRoles(REQUIRED_ROLES));
    }
    Ok(roles)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    /// Roles allowed to create and look up users
    pub required_roles: Vec<String>,
    pub keycloak: KeycloakConfig,
    pub middleware: MiddlewareConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = std::env::var(ENV).map_err(|_| ConfigError::Missing(ENV))?;

        Ok(Self {
            env,
            port: env_or(BACKEND_RESOURCES_PORT, DEFAULT_PORT),
            required_roles: parse_required_roles(std::env::var(REQUIRED_ROLES).ok())?,
            keycloak: KeycloakConfig::from_env(),
            middleware: MiddlewareConfig::from_env(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MiddlewareConfig {
    pub rate_limit_per_minute: u32,
    pub rate_limit_burst: u32,
    pub request_timeout: Duration,
    pub max_body_size: usize,
    pub shutdown_timeout: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 100,
            rate_limit_burst: 150,
            request_timeout: Duration::from_secs(30),
            max_body_size: 64 * 1024,
            shutdown_timeout: Duration::from_secs(30),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

impl MiddlewareConfig {
    pub fn from_env() -> Self {
        let default = Self::default();

        let cors_allowed_origins = std::env::var(CORS_ALLOWED_ORIGINS)
            .ok()
            .map(|v| split_list(&v))
            .filter(|origins| !origins.is_empty())
            .unwrap_or(default.cors_allowed_origins);

        Self {
            rate_limit_per_minute: env_or(RATE_LIMIT_PER_MINUTE, default.rate_limit_per_minute)
                .max(1),
            rate_limit_burst: env_or(RATE_LIMIT_BURST, default.rate_limit_burst).max(1),
            request_timeout: Duration::from_secs(env_or(
                REQUEST_TIMEOUT_SECS,
                default.request_timeout.as_secs(),
            )),
            max_body_size: env_or(MAX_BODY_SIZE_BYTES, default.max_body_size),
            shutdown_timeout: Duration::from_secs(env_or(
                SHUTDOWN_TIMEOUT_SECS,
                default.shutdown_timeout.as_secs(),
            )),
            cors_allowed_origins,
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == "*")
    }
}
