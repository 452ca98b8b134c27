use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Which `CityStore` implementation the server runs on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub geocoder_url: String,
    pub geocoder_timeout_secs: u64,
    pub geocoder_user_agent: String,
    pub nearest_default_limit: u64,
    pub nearest_max_limit: u64,
    pub server_host: String,
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Postgres,
            database_url: None,
            db_max_connections: 10,
            db_acquire_timeout_secs: 5,
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_timeout_secs: 10,
            geocoder_user_agent: concat!("city-locator/", env!("CARGO_PKG_VERSION")).to_string(),
            nearest_default_limit: 2,
            nearest_max_limit: 50,
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            store_backend: parse_or("CITY_STORE", defaults.store_backend)?,
            database_url: env::var("DATABASE_URL").ok(),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            db_acquire_timeout_secs: parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.db_acquire_timeout_secs,
            )?,
            geocoder_url: env::var("GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            geocoder_timeout_secs: parse_or(
                "GEOCODER_TIMEOUT_SECS",
                defaults.geocoder_timeout_secs,
            )?,
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or(defaults.geocoder_user_agent),
            nearest_default_limit: parse_or(
                "NEAREST_DEFAULT_LIMIT",
                defaults.nearest_default_limit,
            )?,
            nearest_max_limit: parse_or("NEAREST_MAX_LIMIT", defaults.nearest_max_limit)?,
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", defaults.server_port)?,
        };

        if config.store_backend == StoreBackend::Postgres && config.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if config.nearest_default_limit == 0
            || config.nearest_default_limit > config.nearest_max_limit
        {
            return Err(ConfigError::Invalid {
                name: "NEAREST_DEFAULT_LIMIT",
                value: config.nearest_default_limit.to_string(),
            });
        }

        Ok(config)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder_timeout_secs)
    }

    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
