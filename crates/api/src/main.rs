use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roadpay_api::config::ServerConfig;
use roadpay_api::notifications::{GatewayNotifier, Notifier, SmtpNotifier, SplitNotifier, TracingNotifier};
use roadpay_api::router::build_app_router;
use roadpay_api::background;
use roadpay_api::state::AppState;
use roadpay_core::clock::SystemClock;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roadpay_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = roadpay_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    roadpay_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    roadpay_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Notifier ---
    let notifier = build_notifier();

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        notifier,
        clock: Arc::new(SystemClock),
    };

    // --- Weekly maintenance ---
    let maintenance_cancel = tokio_util::sync::CancellationToken::new();
    let maintenance_handle = tokio::spawn(background::weekly::run(
        state.clone(),
        maintenance_cancel.clone(),
    ));
    tracing::info!("Weekly maintenance task started");

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    maintenance_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), maintenance_handle).await;
    tracing::info!("Weekly maintenance task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wire the outbound notifier from the environment.
///
/// With `SMTP_HOST` and `SMS_GATEWAY_URL` both set, real transports are
/// used; otherwise delivery is traced only (local development).
fn build_notifier() -> Arc<dyn Notifier> {
    let smtp_configured = std::env::var("SMTP_HOST").is_ok();
    let sms_configured = std::env::var("SMS_GATEWAY_URL").is_ok();

    if smtp_configured && sms_configured {
        tracing::info!("Using SMTP email and SMS gateway notifiers");
        Arc::new(SplitNotifier {
            email: Box::new(SmtpNotifier::from_env()),
            sms: Box::new(GatewayNotifier::from_env()),
        })
    } else {
        tracing::warn!("SMTP/SMS not configured; outbound messages are traced only");
        Arc::new(TracingNotifier)
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
