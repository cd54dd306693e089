use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::keycloak::KeycloakError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub status: u16,
    pub message: String,
    /// Violated field (camelCase) mapped to the reason
    pub errors: BTreeMap<String, String>,
}

#[derive(Debug, PartialEq)]
pub enum ApiError {
    /// Request body violates field constraints
    Validation(BTreeMap<String, String>),
    /// Request body could not be read as JSON
    BadRequest(String),
    Unauthorized,
    Forbidden(String),
    NotFound(String),
    /// Identity provider failure carrying the status to answer with
    Provider { status: StatusCode, message: String },
}

impl ApiError {
    pub fn provider(message: impl Into<String>) -> Self {
        ApiError::Provider {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Provider { status, .. } => *status,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Validation(errors) => {
                let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
                write!(f, "validation failed: {}", fields.join(", "))
            }
            ApiError::BadRequest(msg) => write!(f, "{msg}"),
            ApiError::Unauthorized => write!(f, "authentication required"),
            ApiError::Forbidden(msg) => write!(f, "{msg}"),
            ApiError::NotFound(msg) => write!(f, "{msg}"),
            ApiError::Provider { message, .. } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match self {
            ApiError::Validation(errors) => (
                status,
                Json(ValidationErrorResponse {
                    status: status.as_u16(),
                    message,
                    errors,
                }),
            )
                .into_response(),
            ApiError::Unauthorized => (
                status,
                [("WWW-Authenticate", "Bearer")],
                Json(ErrorResponse {
                    status: status.as_u16(),
                    message,
                }),
            )
                .into_response(),
            _ => (
                status,
                Json(ErrorResponse {
                    status: status.as_u16(),
                    message,
                }),
            )
                .into_response(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, violations)| {
                let reason = violations
                    .first()
                    .map(|violation| {
                        violation
                            .message
                            .as_ref()
                            .map(|msg| msg.to_string())
                            .unwrap_or_else(|| violation.code.to_string())
                    })
                    .unwrap_or_else(|| "invalid".to_string());
                (to_camel_case(&field), reason)
            })
            .collect();

        ApiError::Validation(fields)
    }
}

impl From<KeycloakError> for ApiError {
    fn from(err: KeycloakError) -> Self {
        let message = err.to_string();
        match err.provider_status() {
            Some(404) => ApiError::NotFound(message),
            // the service account was refused, not the caller
            Some(401) | Some(403) => ApiError::Provider {
                status: StatusCode::BAD_GATEWAY,
                message,
            },
            Some(status) => ApiError::Provider {
                status: StatusCode::from_u16(status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message,
            },
            None => ApiError::provider(message),
        }
    }
}

fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
