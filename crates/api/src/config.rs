use voyago_core::booking::{
    DEFAULT_CAPACITY, EXTEND_LOCK_MINUTES, LOCK_DURATION_MINUTES, MAX_LOCK_EXTENSIONS,
};

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

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
        }
    }
}

/// Booking-engine tunables.
///
/// Defaults come from the constants in `voyago_core::booking`; each
/// can be overridden via environment for staging experiments.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hold duration for a fresh lock, in minutes.
    pub lock_duration_minutes: i64,
    /// How far each extension pushes the expiry out, in minutes.
    pub extend_lock_minutes: i64,
    /// Extensions allowed per lock.
    pub max_lock_extensions: i16,
    /// Capacity for inventory rows created lazily on first touch.
    pub default_capacity: i32,
    /// Whether extend recomputes the pricing snapshot from current
    /// factors. Off by default: the user keeps the price they saw.
    pub refresh_price_on_extend: bool,
    /// Seconds between reaper sweeps.
    pub reaper_interval_secs: u64,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default |
    /// |-----------------------------------|---------|
    /// | `ENGINE_LOCK_DURATION_MINUTES`    | `15`    |
    /// | `ENGINE_EXTEND_LOCK_MINUTES`      | `5`     |
    /// | `ENGINE_MAX_LOCK_EXTENSIONS`      | `2`     |
    /// | `ENGINE_DEFAULT_CAPACITY`         | `10`    |
    /// | `ENGINE_REFRESH_PRICE_ON_EXTEND`  | `false` |
    /// | `REAPER_INTERVAL_SECS`            | `60`    |
    pub fn from_env() -> Self {
        Self {
            lock_duration_minutes: env_parsed(
                "ENGINE_LOCK_DURATION_MINUTES",
                LOCK_DURATION_MINUTES,
            ),
            extend_lock_minutes: env_parsed("ENGINE_EXTEND_LOCK_MINUTES", EXTEND_LOCK_MINUTES),
            max_lock_extensions: env_parsed("ENGINE_MAX_LOCK_EXTENSIONS", MAX_LOCK_EXTENSIONS),
            default_capacity: env_parsed("ENGINE_DEFAULT_CAPACITY", DEFAULT_CAPACITY),
            refresh_price_on_extend: env_parsed("ENGINE_REFRESH_PRICE_ON_EXTEND", false),
            reaper_interval_secs: env_parsed("REAPER_INTERVAL_SECS", 60),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_duration_minutes: LOCK_DURATION_MINUTES,
            extend_lock_minutes: EXTEND_LOCK_MINUTES,
            max_lock_extensions: MAX_LOCK_EXTENSIONS,
            default_capacity: DEFAULT_CAPACITY,
            refresh_price_on_extend: false,
            reaper_interval_secs: 60,
        }
    }
}

/// Parse an env var, falling back to `default` when unset or invalid.
fn env_parsed<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
