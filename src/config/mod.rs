use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub stats: StatsConfig,
    pub tasks: TasksConfig,
    pub stores: StoresConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Which datastore implementation backs the model layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatastoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatastoreBackend,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    pub enabled: bool,
    /// Base URL of the InfluxDB HTTP API, e.g. http://localhost:8086
    pub influx_url: Option<String>,
    pub influx_database: String,
    pub group_stats_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    pub notification_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoresConfig {
    pub name_min_length: usize,
    pub description_max_length: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_BACKEND") {
            self.database.backend = match v.as_str() {
                "memory" => DatastoreBackend::Memory,
                "postgres" | "pg" => DatastoreBackend::Postgres,
                _ => self.database.backend,
            };
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Stats overrides
        if let Ok(v) = env::var("STATS_ENABLED") {
            self.stats.enabled = v.parse().unwrap_or(self.stats.enabled);
        }
        if let Ok(v) = env::var("INFLUXDB_URL") {
            self.stats.influx_url = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("INFLUXDB_DATABASE") {
            self.stats.influx_database = v;
        }
        if let Ok(v) = env::var("STATS_GROUP_INTERVAL_SECS") {
            self.stats.group_stats_interval_secs = v.parse().unwrap_or(self.stats.group_stats_interval_secs);
        }

        // Task overrides
        if let Ok(v) = env::var("TASKS_NOTIFICATION_DELAY_SECS") {
            self.tasks.notification_delay_secs = v.parse().unwrap_or(self.tasks.notification_delay_secs);
        }

        // Store overrides
        if let Ok(v) = env::var("NAME_MIN_LENGTH") {
            self.stores.name_min_length = v.parse().unwrap_or(self.stores.name_min_length);
        }
        if let Ok(v) = env::var("DESCRIPTION_MAX_LENGTH") {
            self.stores.description_max_length = v.parse().unwrap_or(self.stores.description_max_length);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                backend: DatastoreBackend::Memory,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 8000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: "development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            stats: StatsConfig {
                enabled: false,
                influx_url: None,
                influx_database: "karrot".to_string(),
                group_stats_interval_secs: 60 * 60,
            },
            tasks: TasksConfig {
                notification_delay_secs: 5 * 60,
            },
            stores: StoresConfig {
                name_min_length: 3,
                description_max_length: 100_000,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                backend: DatastoreBackend::Postgres,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 8000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            stats: StatsConfig {
                enabled: true,
                influx_url: None,
                influx_database: "karrot".to_string(),
                group_stats_interval_secs: 60 * 60,
            },
            tasks: TasksConfig {
                notification_delay_secs: 5 * 60,
            },
            stores: StoresConfig {
                name_min_length: 3,
                description_max_length: 100_000,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                backend: DatastoreBackend::Postgres,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 8000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: false,
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
            stats: StatsConfig {
                enabled: true,
                influx_url: None,
                influx_database: "karrot".to_string(),
                group_stats_interval_secs: 60 * 60,
            },
            tasks: TasksConfig {
                notification_delay_secs: 5 * 60,
            },
            stores: StoresConfig {
                name_min_length: 3,
                description_max_length: 100_000,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.backend, DatastoreBackend::Memory);
        assert_eq!(config.tasks.notification_delay_secs, 300);
        assert!(!config.stats.enabled);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.backend, DatastoreBackend::Postgres);
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.stats.enabled);
        assert_eq!(config.stores.description_max_length, 100_000);
        assert_eq!(config.stores.name_min_length, 3);
    }
}
