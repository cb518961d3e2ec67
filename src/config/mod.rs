use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
    /// Connect and server-selection timeout, seconds
    pub connection_timeout: u64,
    /// Per-operation timeout, seconds
    pub operation_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub project_id: String,
    pub jwks_url: String,
    pub jwks_cache_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// `*` allows any origin
    pub cors_origins: Vec<String>,
}

impl Environment {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

impl AppConfig {
    /// Preset for `APP_ENV`, then individual variable overrides, then required values
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match Environment::parse(lookup("APP_ENV").as_deref()) {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };
        config.with_overrides(&lookup)?;
        Ok(config)
    }

    fn with_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PORT") {
            self.port = v.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{:?} is not a port number", v),
            })?;
        }

        // Database
        self.database.uri = lookup("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?;
        self.database.name = lookup("MONGODB_NAME").ok_or(ConfigError::Missing("MONGODB_NAME"))?;
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_OPERATION_TIMEOUT") {
            self.database.operation_timeout = v.parse().unwrap_or(self.database.operation_timeout);
        }

        // Auth
        self.auth.project_id = match lookup("FIREBASE_PROJECT_ID").filter(|v| !v.is_empty()) {
            Some(id) => id,
            None => match lookup("FIREBASE_CONFIG") {
                Some(raw) => project_id_from_service_account(&raw)?,
                None => return Err(ConfigError::Missing("FIREBASE_PROJECT_ID")),
            },
        };
        if let Some(v) = lookup("AUTH_JWKS_URL") {
            self.auth.jwks_url = v;
        }
        if let Some(v) = lookup("AUTH_JWKS_CACHE_SECS") {
            self.auth.jwks_cache_secs = v.parse().unwrap_or(self.auth.jwks_cache_secs);
        }

        // API
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            port: 8080,
            database: DatabaseConfig {
                uri: String::new(),
                name: String::new(),
                connection_timeout: 30,
                operation_timeout: 30,
            },
            auth: AuthConfig {
                project_id: String::new(),
                jwks_url: DEFAULT_JWKS_URL.to_string(),
                jwks_cache_secs: 3600,
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            port: 8080,
            database: DatabaseConfig {
                uri: String::new(),
                name: String::new(),
                connection_timeout: 10,
                operation_timeout: 10,
            },
            auth: AuthConfig {
                project_id: String::new(),
                jwks_url: DEFAULT_JWKS_URL.to_string(),
                jwks_cache_secs: 3600,
            },
            api: ApiConfig {
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            port: 8080,
            database: DatabaseConfig {
                uri: String::new(),
                name: String::new(),
                connection_timeout: 5,
                operation_timeout: 10,
            },
            auth: AuthConfig {
                project_id: String::new(),
                jwks_url: DEFAULT_JWKS_URL.to_string(),
                jwks_cache_secs: 3600,
            },
            api: ApiConfig {
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

#[derive(Deserialize)]
struct ServiceAccount {
    project_id: Option<String>,
}

fn project_id_from_service_account(raw: &str) -> Result<String, ConfigError> {
    let account: ServiceAccount = serde_json::from_str(raw).map_err(|e| ConfigError::Invalid {
        name: "FIREBASE_CONFIG",
        reason: e.to_string(),
    })?;
    account
        .project_id
        .filter(|id| !id.is_empty())
        .ok_or(ConfigError::Invalid {
            name: "FIREBASE_CONFIG",
            reason: "project_id is missing".to_string(),
        })
}

/// Loads `.env`, plus `app.env` outside production. Existing variables win.
pub fn load_env_files() {
    let _ = dotenvy::dotenv();
    if Environment::parse(env::var("APP_ENV").ok().as_deref()) != Environment::Production {
        let _ = dotenvy::from_filename("app.env");
    }
}
