pub mod identity_gateway;
pub mod identity_provider;

pub use identity_gateway::IdentityGateway;
pub use identity_provider::IdentityProvider;
