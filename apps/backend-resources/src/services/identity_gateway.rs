use std::sync::Arc;

use crate::error::ApiError;
use crate::keycloak::{CredentialRepresentation, KeycloakError, UserRepresentation};
use crate::methods::entities::{UserRequest, UserResponse};
use crate::services::IdentityProvider;

/// Translates user operations into identity provider calls.
///
/// Every call is a single round trip: no retries, no caching. Provider
/// failures come back as [`ApiError`] with the provider message preserved.
#[derive(Clone)]
pub struct IdentityGateway {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub fn realm(&self) -> String {
        self.provider.realm()
    }

    /// Create the user and return the id the provider assigned
    pub async fn create_user(&self, request: &UserRequest) -> Result<String, ApiError> {
        let representation = to_representation(request);

        let created = self
            .provider
            .create_user(&representation)
            .await
            .map_err(|e| {
                tracing::error!(
                    realm = %self.realm(),
                    username = %request.username,
                    error = %e,
                    "provider rejected user creation"
                );
                ApiError::from(e)
            })?;

        if created.status != 201 {
            tracing::error!(
                realm = %self.realm(),
                username = %request.username,
                status = created.status,
                reason = %created.message,
                "unexpected status creating user"
            );
            let message = if created.message.is_empty() {
                format!("user creation failed with status {}", created.status)
            } else {
                created.message
            };
            return Err(ApiError::from(KeycloakError::Status {
                status: created.status,
                message,
            }));
        }

        let id = created.created_id().ok_or_else(|| {
            ApiError::provider("missing Location header in create response")
        })?;

        tracing::info!(realm = %self.realm(), user_id = %id, username = %request.username, "user created");
        Ok(id.to_string())
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<UserResponse, ApiError> {
        if !is_opaque_id(user_id) {
            tracing::warn!(realm = %self.realm(), user_id = %user_id, "rejected malformed user id");
            return Err(ApiError::BadRequest("invalid user id".to_string()));
        }

        let fetch = async {
            let user = self.provider.get_user(user_id).await?;
            let mappings = self.provider.get_role_mappings(user_id).await?;
            Ok::<_, KeycloakError>((user, mappings))
        };

        let (user, mappings) = fetch.await.map_err(|e| {
            tracing::error!(realm = %self.realm(), user_id = %user_id, error = %e, "user lookup failed");
            ApiError::from(e)
        })?;

        Ok(UserResponse {
            id: user.id.unwrap_or_else(|| user_id.to_string()),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            roles: mappings.role_names(),
        })
    }

    pub fn who_am_i(&self, principal_name: &str) -> String {
        principal_name.to_string()
    }
}

/// Provider ids are single path segments
fn is_opaque_id(user_id: &str) -> bool {
    !user_id.is_empty()
        && user_id != "."
        && user_id != ".."
        && !user_id.contains(['/', '\\', '?', '#'])
}

fn to_representation(request: &UserRequest) -> UserRepresentation {
    UserRepresentation {
        id: None,
        username: request.username.clone(),
        email: Some(request.email.clone()),
        first_name: Some(request.first_name.clone()),
        last_name: Some(request.last_name.clone()),
        enabled: true,
        credentials: vec![CredentialRepresentation::password(&request.password)],
    }
}
