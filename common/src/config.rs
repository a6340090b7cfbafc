// Configuration management with layered configuration (defaults, file, env)
// and PostgreSQL connection descriptor resolution

use crate::errors::DatabaseError;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Pool sizing and timeouts. Credentials live in [`ConnectionSettings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Read migrations from this directory at runtime instead of the embedded set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrations_dir: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Built-in defaults so partial files are enough
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(format!(
                "Database min_connections ({}) cannot exceed max_connections ({})",
                self.database.min_connections, self.database.max_connections
            ));
        }
        if self.database.connect_timeout_ms == 0 {
            return Err("Database connect_timeout_ms must be greater than 0".to_string());
        }

        if self.observability.log_level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                max_connections: 20,
                min_connections: 0,
                idle_timeout_ms: 30_000,
                connect_timeout_ms: 2_000,
                migrations_dir: None,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                log_format: LogFormat::Json,
            },
        }
    }
}

// ============================================================================
// Connection descriptor
// ============================================================================

/// Environment keys consulted by [`ConnectionSettings::from_env`]
pub const CONNECTION_ENV_KEYS: [&str; 6] = [
    "DATABASE_URL",
    "POSTGRES_USER",
    "POSTGRES_PASSWORD",
    "POSTGRES_HOST",
    "POSTGRES_PORT",
    "POSTGRES_DB",
];

fn default_user() -> String {
    "devopsuser".to_string()
}

fn default_password() -> String {
    "devopspass123".to_string()
}

fn default_host() -> String {
    "postgres-service".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_database() -> String {
    "devopsdb".to_string()
}

/// Raw view of the connection environment, one field per recognised key
#[derive(Debug, Deserialize)]
struct ConnectionEnv {
    database_url: Option<String>,
    #[serde(default = "default_user")]
    postgres_user: String,
    #[serde(default = "default_password")]
    postgres_password: String,
    #[serde(default = "default_host")]
    postgres_host: String,
    #[serde(default = "default_port")]
    postgres_port: u16,
    #[serde(default = "default_database")]
    postgres_db: String,
}

/// Where and as whom to connect.
///
/// Resolved once at startup. `DATABASE_URL` overrides the five discrete parts;
/// each part falls back to its own default independently. Empty values are
/// treated as unset.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub database_url: Option<String>,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl ConnectionSettings {
    /// Resolve from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::vars().filter(|(key, _)| CONNECTION_ENV_KEYS.contains(&key.as_str())),
        )
    }

    /// Resolve from an explicit set of key/value pairs
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let env: ConnectionEnv = Config::builder()
            .add_source(Environment::default().ignore_empty(true).source(Some(source)))
            .build()?
            .try_deserialize()?;

        Ok(Self {
            database_url: env.database_url,
            user: env.postgres_user,
            password: env.postgres_password,
            host: env.postgres_host,
            port: env.postgres_port,
            database: env.postgres_db,
        })
    }

    /// Whether the full connection string override is in effect
    pub fn uses_override(&self) -> bool {
        self.database_url.is_some()
    }

    /// Build sqlx connect options from the resolved descriptor
    pub fn connect_options(&self) -> Result<PgConnectOptions, DatabaseError> {
        match &self.database_url {
            Some(url) => PgConnectOptions::from_str(url).map_err(|e| {
                DatabaseError::InvalidConfiguration(format!("DATABASE_URL is not usable: {}", e))
            }),
            None => Ok(PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password)
                .database(&self.database)
                .ssl_mode(PgSslMode::Disable)),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            user: default_user(),
            password: default_password(),
            host: default_host(),
            port: default_port(),
            database: default_database(),
        }
    }
}

impl fmt::Display for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database_url {
            Some(raw) => match url::Url::parse(raw) {
                Ok(mut parsed) => {
                    if parsed.password().is_some() {
                        let _ = parsed.set_password(Some("***"));
                    }
                    write!(f, "{}", parsed)
                }
                Err(_) => write!(f, "<unparseable DATABASE_URL>"),
            },
            None => write!(
                f,
                "postgresql://{}:***@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
        }
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("target", &self.to_string())
            .field("uses_override", &self.uses_override())
            .finish()
    }
}
