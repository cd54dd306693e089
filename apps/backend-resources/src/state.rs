use std::sync::Arc;

use crate::middleware::auth::Authenticator;
use crate::middleware::role_guard::RequiredRoles;
use crate::services::IdentityGateway;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<IdentityGateway>,
    pub authenticator: Arc<dyn Authenticator>,
    pub required_roles: RequiredRoles,
}
