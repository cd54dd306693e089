use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// User representation as exchanged with the Keycloak Admin API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<CredentialRepresentation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRepresentation {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub value: String,
    pub temporary: bool,
}

impl CredentialRepresentation {
    pub fn password(value: &str) -> Self {
        Self {
            credential_type: "password".to_string(),
            value: value.to_string(),
            temporary: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRepresentation {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub client_role: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMappingsRepresentation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub mappings: Vec<RoleRepresentation>,
}

/// Role mappings of a user: realm roles plus client roles keyed by client id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingsRepresentation {
    #[serde(default)]
    pub realm_mappings: Vec<RoleRepresentation>,
    #[serde(default)]
    pub client_mappings: HashMap<String, ClientMappingsRepresentation>,
}

impl MappingsRepresentation {
    /// Flatten realm and client roles into a sorted set of names
    pub fn role_names(&self) -> BTreeSet<String> {
        let client_roles = self
            .client_mappings
            .values()
            .flat_map(|client| client.mappings.iter());

        self.realm_mappings
            .iter()
            .chain(client_roles)
            .map(|role| role.name.clone())
            .collect()
    }
}

/// Outcome of a create call, left for the caller to interpret
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatedResponse {
    pub status: u16,
    pub location: Option<String>,
    /// Keycloak's reason when the status is not 201
    pub message: String,
}

impl CreatedResponse {
    /// Last path segment of the Location header
    pub fn created_id(&self) -> Option<&str> {
        self.location
            .as_deref()
            .and_then(|location| location.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
    }
}

/// Token response from Keycloak
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Reason carried by a Keycloak error body, or the raw body when it is not JSON
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|e| e.error_message.or(e.error_description).or(e.error))
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Default, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Token introspection response (RFC 7662 plus Keycloak role claims)
#[derive(Debug, Deserialize)]
pub struct IntrospectionResponse {
    pub active: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub realm_access: Option<RealmAccess>,
    #[serde(default)]
    pub resource_access: HashMap<String, ResourceAccess>,
}

impl IntrospectionResponse {
    pub fn principal_name(&self) -> Option<&str> {
        self.preferred_username
            .as_deref()
            .or(self.username.as_deref())
    }

    pub fn roles(&self) -> BTreeSet<String> {
        let realm_roles = self
            .realm_access
            .iter()
            .flat_map(|access| access.roles.iter());
        let client_roles = self
            .resource_access
            .values()
            .flat_map(|access| access.roles.iter());

        realm_roles.chain(client_roles).cloned().collect()
    }
}
