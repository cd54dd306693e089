use std::time::Duration;
use tokio::signal;
use tokio::sync::oneshot;

/// Resolves on Ctrl+C or SIGTERM so axum can stop accepting connections
pub async fn shutdown_signal(drain_timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal_name = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    tracing::info!(
        signal = signal_name,
        drain_timeout_secs = drain_timeout.as_secs(),
        "shutting down, draining in-flight requests"
    );
}

/// Resolves `timeout` after draining starts. Pending forever if draining never starts.
pub async fn drain_deadline(draining: oneshot::Receiver<()>, timeout: Duration) {
    if draining.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(timeout).await;
}
