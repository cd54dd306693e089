mod client;
mod config;
mod errors;
mod introspection;
mod models;

pub use client::KeycloakClient;
pub use config::KeycloakConfig;
pub use errors::KeycloakError;
pub use introspection::KeycloakTokenIntrospector;
pub use models::{
    ClientMappingsRepresentation, CreatedResponse, CredentialRepresentation,
    MappingsRepresentation, RoleRepresentation, UserRepresentation,
};
