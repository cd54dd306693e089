#[derive(Debug, thiserror::Error)]
pub enum KeycloakError {
    /// Failed to obtain a service-account access token
    #[error("token error: {0}")]
    TokenError(String),

    #[error("user not found in keycloak: {0}")]
    UserNotFound(String),

    #[error("user already exists in keycloak: {0}")]
    UserAlreadyExists(String),

    /// Keycloak answered with a status the caller did not expect
    #[error("keycloak responded with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Transport level failure or any other runtime fault
    #[error("keycloak request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from keycloak: {0}")]
    InvalidResponse(String),

    #[error("invalid keycloak url: {0}")]
    InvalidUrl(String),

    /// Keycloak credentials are missing from the configuration
    #[error("keycloak is not configured")]
    NotConfigured,
}

impl KeycloakError {
    /// Status Keycloak signalled for this failure, when it signalled one
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            KeycloakError::UserNotFound(_) => Some(404),
            KeycloakError::UserAlreadyExists(_) => Some(409),
            KeycloakError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for KeycloakError {
    fn from(err: reqwest::Error) -> Self {
        KeycloakError::RequestFailed(err.to_string())
    }
}
