pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod extractors;
pub mod keycloak;
pub mod methods;
pub mod middleware;
pub mod services;
pub mod shutdown;
pub mod state;

pub use app::{build_router, with_middleware, ApiDoc};
pub use state::AppState;
