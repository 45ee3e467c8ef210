//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Business clock configuration.
    #[serde(default)]
    pub clock: ClockConfig,
    /// Periodic auto-sweep configuration.
    #[serde(default)]
    pub sweep: SweepConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
///
/// Tokens are issued elsewhere; this service only validates them.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Shared HS256 secret.
    pub secret: String,
    /// Allowed clock skew when checking `exp`.
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

fn default_leeway() -> u64 {
    30
}

/// Business clock configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClockConfig {
    /// IANA timezone used to decide "today".
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    "Asia/Jakarta".to_string()
}

impl ClockConfig {
    /// Parses the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns the unparsable name if it is not a known IANA zone.
    pub fn tz(&self) -> Result<chrono_tz::Tz, String> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| format!("unknown timezone: {}", self.timezone))
    }
}

/// Periodic auto-sweep configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Whether the server runs the sweep on a timer.
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between sweep runs.
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,
    /// Staff ID recorded as the administering staff of sweep postings.
    #[serde(default)]
    pub operator_id: Option<uuid::Uuid>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_sweep_interval(),
            operator_id: None,
        }
    }
}

fn default_sweep_interval() -> u64 {
    86_400
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KOPERASI").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
