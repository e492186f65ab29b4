mod settings;

pub use settings::{
    EnrichmentConfig, RegionId, SearchSettings, SettingsError, SourceSettings, WatchSettings,
};

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Process-level configuration sourced from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
    /// Location of the YAML watch settings (search targets, criteria, e-mail).
    pub settings_path: PathBuf,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("HOUSEWATCH_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("HOUSEWATCH_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("HOUSEWATCH_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("HOUSEWATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let data_dir = env::var("HOUSEWATCH_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let settings_path = env::var("HOUSEWATCH_CONFIG")
            .unwrap_or_else(|_| "configs/housewatch.yaml".to_string());

        let interval_secs = env::var("HOUSEWATCH_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidInterval)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig {
                data_dir: PathBuf::from(data_dir),
            },
            schedule: ScheduleConfig {
                interval: Duration::from_secs(interval_secs),
            },
            settings_path: PathBuf::from(settings_path),
        })
    }
}

/// Settings controlling the HTTP server binding used by the daemon.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the seen-set and match journal live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn seen_path(&self) -> PathBuf {
        self.data_dir.join("seen_listings.json")
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("matches.jsonl")
    }
}

/// Period between runs in daemon mode.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub interval: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "HOUSEWATCH_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "HOUSEWATCH_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidInterval => {
                write!(f, "HOUSEWATCH_INTERVAL_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort | ConfigError::InvalidInterval => None,
        }
    }
}
