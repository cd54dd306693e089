use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;

use super::config::KeycloakConfig;
use super::errors::KeycloakError;
use super::models::IntrospectionResponse;
use crate::error::ApiError;
use crate::middleware::auth::{Authenticator, Principal};

/// Resolves caller tokens through the realm's introspection endpoint
pub struct KeycloakTokenIntrospector {
    config: KeycloakConfig,
    http: Client,
}

impl KeycloakTokenIntrospector {
    pub fn new(config: KeycloakConfig) -> Result<Self, KeycloakError> {
        let http = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self { config, http })
    }

    async fn introspect(&self, token: &str) -> Result<IntrospectionResponse, KeycloakError> {
        if !self.config.is_configured() {
            return Err(KeycloakError::NotConfigured);
        }

        let response = self
            .http
            .post(self.config.introspection_url())
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("token", token)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(KeycloakError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        response
            .json::<IntrospectionResponse>()
            .await
            .map_err(|e| KeycloakError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Authenticator for KeycloakTokenIntrospector {
    async fn authenticate(&self, token: &str) -> Result<Principal, ApiError> {
        let introspection = self.introspect(token).await.map_err(|e| {
            tracing::error!(error = %e, "token introspection failed");
            ApiError::Unauthorized
        })?;

        if !introspection.active {
            return Err(ApiError::Unauthorized);
        }

        let name = introspection
            .principal_name()
            .ok_or(ApiError::Unauthorized)?
            .to_string();

        Ok(Principal::new(name, introspection.roles()))
    }
}
