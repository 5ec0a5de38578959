use std::sync::Arc;

use roadpay_core::clock::SharedClock;

use crate::config::ServerConfig;
use crate::notifications::Notifier;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: roadpay_db::DbPool,
    /// Server configuration (JWT, OTP policy, timeouts, CORS).
    pub config: Arc<ServerConfig>,
    /// Outbound email/SMS delivery.
    pub notifier: Arc<dyn Notifier>,
    /// Time source. Production uses the system clock; tests freeze it.
    pub clock: SharedClock,
}
