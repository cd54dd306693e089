use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[validate(
        length(min = 2, max = 30, message = "username should be between 2 and 30 characters"),
        custom(function = "not_blank")
    )]
    pub username: String,
    #[validate(email(message = "email should be valid"))]
    pub email: String,
    #[validate(
        length(min = 4, message = "password should be at least 4 characters"),
        custom(function = "not_blank")
    )]
    pub password: String,
    #[validate(
        length(min = 2, max = 30, message = "first name should be between 2 and 30 characters"),
        custom(function = "not_blank")
    )]
    pub first_name: String,
    #[validate(
        length(min = 2, max = 30, message = "last name should be between 2 and 30 characters"),
        custom(function = "not_blank")
    )]
    pub last_name: String,
}

impl std::fmt::Debug for UserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Realm and client role names, sorted
    pub roles: BTreeSet<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedUserResponse {
    pub id: String,
}
