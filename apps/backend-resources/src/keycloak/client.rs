use async_trait::async_trait;
use reqwest::{header::LOCATION, Client, StatusCode, Url};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::config::KeycloakConfig;
use super::errors::KeycloakError;
use super::models::{
    error_message, CreatedResponse, MappingsRepresentation, TokenResponse, UserRepresentation,
};
use crate::services::IdentityProvider;

/// Refresh the service-account token this long before it expires
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 30;

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn new(token: String, expires_in: u64) -> Self {
        let lifetime = expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS).max(1);
        Self {
            access_token: token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        }
    }

    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Admin REST client scoped to one realm, authenticated as a service account
pub struct KeycloakClient {
    config: KeycloakConfig,
    http: Client,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl KeycloakClient {
    pub fn new(config: KeycloakConfig) -> Result<Self, KeycloakError> {
        let http = Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            config,
            http,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn get_token(&self) -> Result<String, KeycloakError> {
        if !self.is_configured() {
            return Err(KeycloakError::NotConfigured);
        }

        {
            let token_guard = self.token.read().await;
            if let Some(ref cached) = *token_guard {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let fresh = self.fetch_token().await?;
        let access_token = fresh.access_token.clone();

        let mut token_guard = self.token.write().await;
        *token_guard = Some(CachedToken::new(fresh.access_token, fresh.expires_in));

        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<TokenResponse, KeycloakError> {
        tracing::debug!(realm = %self.config.realm, "requesting service account token");

        let response = self
            .http
            .post(self.config.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret().as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(KeycloakError::TokenError(format!(
                "status {}: {}",
                status, body
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| KeycloakError::InvalidResponse(e.to_string()))
    }

    async fn fetch_json<T>(&self, url: Url, user_id: &str) -> Result<T, KeycloakError>
    where
        T: serde::de::DeserializeOwned,
    {
        let token = self.get_token().await?;

        let response = self.http.get(url).bearer_auth(&token).send().await?;

        match response.status() {
            StatusCode::OK => response
                .json::<T>()
                .await
                .map_err(|e| KeycloakError::InvalidResponse(e.to_string())),
            StatusCode::NOT_FOUND => Err(KeycloakError::UserNotFound(user_id.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(KeycloakError::Status {
                    status: status.as_u16(),
                    message: error_message(&body),
                })
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for KeycloakClient {
    fn realm(&self) -> String {
        self.config.realm.clone()
    }

    async fn create_user(
        &self,
        user: &UserRepresentation,
    ) -> Result<CreatedResponse, KeycloakError> {
        let token = self.get_token().await?;

        let response = self
            .http
            .post(self.config.admin_users_url()?)
            .bearer_auth(&token)
            .json(user)
            .send()
            .await?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        if status == StatusCode::CONFLICT {
            return Err(KeycloakError::UserAlreadyExists(user.username.clone()));
        }

        let message = if status == StatusCode::CREATED {
            String::new()
        } else {
            error_message(&response.text().await.unwrap_or_default())
        };

        Ok(CreatedResponse {
            status: status.as_u16(),
            location,
            message,
        })
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRepresentation, KeycloakError> {
        self.fetch_json(self.config.admin_user_url(user_id)?, user_id)
            .await
    }

    async fn get_role_mappings(
        &self,
        user_id: &str,
    ) -> Result<MappingsRepresentation, KeycloakError> {
        self.fetch_json(self.config.admin_role_mappings_url(user_id)?, user_id)
            .await
    }
}
