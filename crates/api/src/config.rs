use roadpay_core::otp::OtpPolicy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// OTP challenge configuration (secret, limits).
    pub otp: OtpConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();
        let otp = OtpConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            otp,
        }
    }
}

/// OTP challenge configuration: the keyed-hash secret plus policy limits.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// HMAC key for stored code digests. Independent of the JWT secret so
    /// the two can be rotated separately.
    pub secret: String,
    /// TTL, attempt, cooldown, and length limits.
    pub policy: OtpPolicy,
}

impl OtpConfig {
    /// Load OTP configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `OTP_SECRET`               | **yes**  | --      |
    /// | `OTP_TTL_SECS`             | no       | `300`   |
    /// | `OTP_MAX_ATTEMPTS`         | no       | `5`     |
    /// | `OTP_RESEND_COOLDOWN_SECS` | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `OTP_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("OTP_SECRET").expect("OTP_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "OTP_SECRET must not be empty");

        let defaults = OtpPolicy::default();

        let ttl_secs: i64 = std::env::var("OTP_TTL_SECS")
            .unwrap_or_else(|_| defaults.ttl_secs.to_string())
            .parse()
            .expect("OTP_TTL_SECS must be a valid i64");

        let max_attempts: i32 = std::env::var("OTP_MAX_ATTEMPTS")
            .unwrap_or_else(|_| defaults.max_attempts.to_string())
            .parse()
            .expect("OTP_MAX_ATTEMPTS must be a valid i32");

        let resend_cooldown_secs: i64 = std::env::var("OTP_RESEND_COOLDOWN_SECS")
            .unwrap_or_else(|_| defaults.resend_cooldown_secs.to_string())
            .parse()
            .expect("OTP_RESEND_COOLDOWN_SECS must be a valid i64");

        Self {
            secret,
            policy: OtpPolicy {
                code_length: defaults.code_length,
                ttl_secs,
                max_attempts,
                resend_cooldown_secs,
            },
        }
    }
}
