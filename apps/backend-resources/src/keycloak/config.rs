use std::time::Duration;

use reqwest::Url;
use secrecy::{ExposeSecret, Secret};

use super::errors::KeycloakError;

use crate::constants::{
    KEYCLOAK_CLIENT_ID, KEYCLOAK_CLIENT_SECRET, KEYCLOAK_HTTP_TIMEOUT_SECS, KEYCLOAK_REALM,
    KEYCLOAK_URL,
};

const DEFAULT_KEYCLOAK_URL: &str = "http://localhost:8080";
const DEFAULT_KEYCLOAK_REALM: &str = "ITM";
const DEFAULT_KEYCLOAK_CLIENT_ID: &str = "backend-resources";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    pub base_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub http_timeout: Duration,
}

impl KeycloakConfig {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(KEYCLOAK_URL).unwrap_or_else(|_| DEFAULT_KEYCLOAK_URL.to_string());
        let realm =
            std::env::var(KEYCLOAK_REALM).unwrap_or_else(|_| DEFAULT_KEYCLOAK_REALM.to_string());
        let client_id = std::env::var(KEYCLOAK_CLIENT_ID)
            .unwrap_or_else(|_| DEFAULT_KEYCLOAK_CLIENT_ID.to_string());
        let client_secret = std::env::var(KEYCLOAK_CLIENT_SECRET).unwrap_or_default();
        let http_timeout_secs: u64 = std::env::var(KEYCLOAK_HTTP_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            realm,
            client_id,
            client_secret: Secret::new(client_secret),
            http_timeout: Duration::from_secs(http_timeout_secs),
        }
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url, self.realm
        )
    }

    pub fn introspection_url(&self) -> String {
        format!("{}/introspect", self.token_url())
    }

    pub fn admin_users_url(&self) -> Result<Url, KeycloakError> {
        self.admin_url(&[])
    }

    /// The id is pushed as one encoded segment, so it cannot leave the realm
    pub fn admin_user_url(&self, user_id: &str) -> Result<Url, KeycloakError> {
        self.admin_url(&[user_id])
    }

    pub fn admin_role_mappings_url(&self, user_id: &str) -> Result<Url, KeycloakError> {
        self.admin_url(&[user_id, "role-mappings"])
    }

    fn admin_url(&self, segments: &[&str]) -> Result<Url, KeycloakError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| KeycloakError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| KeycloakError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["admin", "realms", self.realm.as_str(), "users"])
            .extend(segments);
        Ok(url)
    }

    pub fn is_configured(&self) -> bool {
        !self.client_secret.expose_secret().is_empty()
    }
}
