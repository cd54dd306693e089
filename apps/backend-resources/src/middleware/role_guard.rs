use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::middleware::auth::Principal;

/// Roles a caller must hold (any of them) to reach a route
#[derive(Debug, Clone)]
pub struct RequiredRoles(Arc<[String]>);

impl RequiredRoles {
    pub fn new<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    /// An empty list admits nobody
    pub fn permits(&self, principal: &Principal) -> bool {
        self.0.iter().any(|role| principal.has_role(role))
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

/// Must run after `authenticate`
pub async fn require_roles(
    State(required): State<RequiredRoles>,
    request: Request,
    next: Next,
) -> Response {
    let Some(principal) = request.extensions().get::<Principal>() else {
        return ApiError::Unauthorized.into_response();
    };

    if !required.permits(principal) {
        tracing::warn!(
            principal = %principal.name,
            required = ?required.names(),
            path = %request.uri().path(),
            "caller lacks required role"
        );
        return ApiError::Forbidden(format!(
            "missing required role (one of): {}",
            required.names().join(", ")
        ))
        .into_response();
    }

    next.run(request).await
}
