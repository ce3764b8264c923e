use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "HealBuddy";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SCAN_DELAY_MS: u64 = 3000;
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "healbuddy=info,healbuddy_lib=info,tower_http=info"
}

/// Get the application data directory.
/// ~/HealBuddy/ unless overridden by `HEALBUDDY_DATA_DIR`.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Latency between a scan trigger and its placeholder completion.
    pub scan_delay: Duration,
    pub session_ttl: Duration,
    pub password_iterations: u32,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            data_dir: app_data_dir(),
            scan_delay: Duration::from_millis(DEFAULT_SCAN_DELAY_MS),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    /// Build configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (tests inject a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("HEALBUDDY_ADDR") {
            config.bind_addr = parse_var("HEALBUDDY_ADDR", &addr)?;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = parse_var("PORT", &port)?;
            config.bind_addr.set_port(port);
        }

        if let Some(dir) = lookup("HEALBUDDY_DATA_DIR") {
            if dir.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    var: "HEALBUDDY_DATA_DIR",
                    value: dir,
                });
            }
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(ms) = lookup("HEALBUDDY_SCAN_DELAY_MS") {
            config.scan_delay = Duration::from_millis(parse_var("HEALBUDDY_SCAN_DELAY_MS", &ms)?);
        }

        if let Some(secs) = lookup("HEALBUDDY_SESSION_TTL_SECS") {
            let secs: u64 = parse_var("HEALBUDDY_SESSION_TTL_SECS", &secs)?;
            if secs == 0 || secs > MAX_SESSION_TTL_SECS {
                return Err(ConfigError::InvalidValue {
                    var: "HEALBUDDY_SESSION_TTL_SECS",
                    value: secs.to_string(),
                });
            }
            config.session_ttl = Duration::from_secs(secs);
        }

        if let Some(iter) = lookup("HEALBUDDY_PASSWORD_ITERATIONS") {
            let iterations: u32 = parse_var("HEALBUDDY_PASSWORD_ITERATIONS", &iter)?;
            if iterations == 0 {
                return Err(ConfigError::InvalidValue {
                    var: "HEALBUDDY_PASSWORD_ITERATIONS",
                    value: iter,
                });
            }
            config.password_iterations = iterations;
        }

        if let Some(bytes) = lookup("HEALBUDDY_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_var("HEALBUDDY_MAX_UPLOAD_BYTES", &bytes)?;
        }

        Ok(config)
    }

    /// SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("healbuddy.db")
    }

    /// Root of the statically served upload tree (`/uploads`).
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}
