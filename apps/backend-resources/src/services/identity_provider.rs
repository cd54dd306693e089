use async_trait::async_trait;

use crate::keycloak::{CreatedResponse, KeycloakError, MappingsRepresentation, UserRepresentation};

/// Realm-scoped slice of the identity provider admin API the service relies on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Realm every call is scoped to
    fn realm(&self) -> String;

    /// Submit a user; the response status is left for the caller to judge
    async fn create_user(&self, user: &UserRepresentation)
        -> Result<CreatedResponse, KeycloakError>;

    async fn get_user(&self, user_id: &str) -> Result<UserRepresentation, KeycloakError>;

    /// Realm and client role mappings of a user
    async fn get_role_mappings(
        &self,
        user_id: &str,
    ) -> Result<MappingsRepresentation, KeycloakError>;
}
