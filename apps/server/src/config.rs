//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_DATABASE_URL: &str = "postgres://ra:ra@localhost:5432/report_analyzer";
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 5000;
    pub const DEV_DB_MAX_CONNECTIONS: u32 = 10;
    pub const DEV_DB_MIN_CONNECTIONS: u32 = 1;
    pub const DEV_MAX_ARTIFACT_SIZE: usize = 104_857_600; // 100MB per capture/keylog file

    // S3/MinIO defaults for development
    pub const DEV_S3_ENDPOINT: &str = "http://localhost:9100";
    pub const DEV_S3_BUCKET: &str = "artifacts";
    pub const DEV_S3_REGION: &str = "us-east-1";
    pub const DEV_S3_ACCESS_KEY: &str = "minioadmin";
    pub const DEV_S3_SECRET_KEY: &str = "minioadmin";
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// PostgreSQL connection string
    pub url: String,
    /// Upper bound of pooled connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
}

/// S3 artifact storage configuration.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// S3 endpoint URL (for MinIO or custom S3-compatible services)
    pub endpoint: Option<String>,
    /// S3 bucket name
    pub bucket: String,
    /// S3 region
    pub region: String,
    /// S3 access key ID
    pub access_key: String,
    /// S3 secret access key
    pub secret_key: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database connection settings
    pub database: DatabaseSettings,
    /// Largest accepted pcap/keylog upload in bytes (default: 100MB)
    pub max_artifact_size: usize,
    /// Artifact storage configuration
    pub storage: StorageSettings,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development) every variable has a default
    /// and only RUST_ENV is required. In production mode the server refuses to
    /// start with the development database URL or S3 credentials.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `RA_HOST`: Server host (default: 127.0.0.1)
    /// - `RA_PORT`: Server port (default: 5000)
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `RA_DB_MAX_CONNECTIONS` / `RA_DB_MIN_CONNECTIONS`: pool bounds (default: 10 / 1)
    /// - `RA_MAX_ARTIFACT_SIZE`: Max artifact upload size in bytes (default: 100MB)
    /// - `S3_ENDPOINT`, `S3_BUCKET`, `S3_REGION`, `S3_ACCESS_KEY`, `S3_SECRET_KEY`
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("RA_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());
        let port = parse_var(
            "RA_PORT",
            defaults::DEV_PORT,
            "RA_PORT must be a valid port number",
        )?;

        let database = DatabaseSettings {
            url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| defaults::DEV_DATABASE_URL.to_string()),
            max_connections: parse_var(
                "RA_DB_MAX_CONNECTIONS",
                defaults::DEV_DB_MAX_CONNECTIONS,
                "RA_DB_MAX_CONNECTIONS must be a valid number",
            )?,
            min_connections: parse_var(
                "RA_DB_MIN_CONNECTIONS",
                defaults::DEV_DB_MIN_CONNECTIONS,
                "RA_DB_MIN_CONNECTIONS must be a valid number",
            )?,
        };

        if database.min_connections > database.max_connections {
            return Err(ConfigError::InvalidValue(
                "RA_DB_MIN_CONNECTIONS must not exceed RA_DB_MAX_CONNECTIONS",
            ));
        }

        let max_artifact_size = parse_var(
            "RA_MAX_ARTIFACT_SIZE",
            defaults::DEV_MAX_ARTIFACT_SIZE,
            "RA_MAX_ARTIFACT_SIZE must be a valid number",
        )?;

        let storage = StorageSettings {
            endpoint: env::var("S3_ENDPOINT").ok().or_else(|| {
                if environment.is_development() {
                    Some(defaults::DEV_S3_ENDPOINT.to_string())
                } else {
                    None
                }
            }),
            bucket: env::var("S3_BUCKET").unwrap_or_else(|_| defaults::DEV_S3_BUCKET.to_string()),
            region: env::var("S3_REGION").unwrap_or_else(|_| defaults::DEV_S3_REGION.to_string()),
            access_key: env::var("S3_ACCESS_KEY")
                .unwrap_or_else(|_| defaults::DEV_S3_ACCESS_KEY.to_string()),
            secret_key: env::var("S3_SECRET_KEY")
                .unwrap_or_else(|_| defaults::DEV_S3_SECRET_KEY.to_string()),
        };

        let config = Config {
            environment,
            host,
            port,
            database,
            max_artifact_size,
            storage,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database.url == defaults::DEV_DATABASE_URL {
            errors.push(format!(
                "DATABASE_URL is using development default '{}'. Set a production PostgreSQL URL.",
                defaults::DEV_DATABASE_URL
            ));
        }

        if self.storage.access_key == defaults::DEV_S3_ACCESS_KEY
            || self.storage.secret_key == defaults::DEV_S3_SECRET_KEY
        {
            errors.push(
                "S3_ACCESS_KEY/S3_SECRET_KEY are using development defaults. Set production S3 credentials."
                    .to_string(),
            );
        }

        if self.max_artifact_size == 0 {
            errors.push("RA_MAX_ARTIFACT_SIZE must be greater than zero.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(
    name: &str,
    default: T,
    message: &'static str,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(message)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
