// config.rs
use std::env;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub betsapi_token: String,
    pub betsapi_base_url: String,
    pub betsapi_sport_id: String,
    pub betsapi_timeout_secs: u64,
    pub admin_web_path: String,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub host: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::configuration(format!("{} must be set", key)))
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::configuration(format!("PORT must be a number, got '{}'", raw)))?,
            None => 4011,
        };

        let betsapi_timeout_secs = match lookup("BETSAPI_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| {
                AppError::configuration(format!("BETSAPI_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?,
            None => 30,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            database_name: lookup("DATABASE_NAME").unwrap_or_else(|| "matchnow".to_string()),
            betsapi_token: required("BETSAPI_TOKEN")?,
            betsapi_base_url: lookup("BETSAPI_BASE_URL")
                .unwrap_or_else(|| "https://api.b365api.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            betsapi_sport_id: lookup("BETSAPI_SPORT_ID").unwrap_or_else(|| "1".to_string()),
            betsapi_timeout_secs,
            admin_web_path: lookup("ADMIN_WEB_PATH")
                .unwrap_or_else(|| "../matchnow-admin-web/src".to_string()),
            cors_origins,
            port,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
        })
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "database_name": self.database_name,
            "betsapi_base_url": self.betsapi_base_url,
            "betsapi_sport_id": self.betsapi_sport_id,
            "betsapi_token_set": !self.betsapi_token.is_empty(),
            "betsapi_timeout_secs": self.betsapi_timeout_secs,
            "admin_web_path": self.admin_web_path,
            "cors_origins": self.cors_origins,
            "port": self.port,
            "host": self.host,
        })
    }
}
