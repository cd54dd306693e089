use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use backend_resources::config::AppConfig;
use backend_resources::constants::{LOCAL_ENV, SERVICE};
use backend_resources::keycloak::{KeycloakClient, KeycloakTokenIntrospector};
use backend_resources::middleware::role_guard::RequiredRoles;
use backend_resources::services::IdentityGateway;
use backend_resources::shutdown::{drain_deadline, shutdown_signal};
use backend_resources::{build_router, with_middleware, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(env: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true);

    if env == LOCAL_ENV {
        let pretty_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .pretty();
        registry.with(json_layer).with(pretty_layer).init();
    } else {
        registry.with(json_layer).init();
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.env);

    tracing::info!(service = SERVICE, env = %config.env, "tracing initialized");
    tracing::info!(
        keycloak_url = %config.keycloak.base_url,
        realm = %config.keycloak.realm,
        client_id = %config.keycloak.client_id,
        required_roles = ?config.required_roles,
        "identity provider configuration loaded"
    );
    tracing::info!(
        rate_limit_per_minute = config.middleware.rate_limit_per_minute,
        rate_limit_burst = config.middleware.rate_limit_burst,
        request_timeout_secs = config.middleware.request_timeout.as_secs(),
        max_body_size = config.middleware.max_body_size,
        cors_origins = ?config.middleware.cors_allowed_origins,
        "middleware configuration loaded"
    );

    let keycloak = KeycloakClient::new(config.keycloak.clone())?;
    if !keycloak.is_configured() {
        tracing::warn!("KEYCLOAK_CLIENT_SECRET is empty, provider calls will fail");
    }
    let introspector = KeycloakTokenIntrospector::new(config.keycloak.clone())?;

    let state = AppState {
        gateway: Arc::new(IdentityGateway::new(Arc::new(keycloak))),
        authenticator: Arc::new(introspector),
        required_roles: RequiredRoles::new(config.required_roles.clone()),
    };

    let mut app = with_middleware(build_router(state), &config.middleware);

    // Rate limiting (outermost): replenish one request every 60000 / per_minute ms
    let replenish_interval_ms = 60_000 / u64::from(config.middleware.rate_limit_per_minute);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_interval_ms.max(1))
            .burst_size(config.middleware.rate_limit_burst)
            .finish()
            .ok_or("invalid rate limit configuration")?,
    );
    app = app.layer(GovernorLayer {
        config: governor_conf,
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(
        "{} is ready to accept requests at: http://127.0.0.1:{}",
        SERVICE,
        config.port
    );

    let drain_timeout = config.middleware.shutdown_timeout;
    let (draining_tx, draining_rx) = oneshot::channel();

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal(drain_timeout).await;
        let _ = draining_tx.send(());
    });

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|e| format!("Server error: {}", e))?;
            tracing::info!("server stopped");
        }
        _ = drain_deadline(draining_rx, drain_timeout) => {
            tracing::warn!(
                drain_timeout_secs = drain_timeout.as_secs(),
                "drain timeout elapsed, dropping in-flight requests"
            );
        }
    }

    Ok(())
}
