/// Configuration management for the emergency notifier
///
/// Loads configuration from environment variables with sensible defaults.
/// Fan-out tuning lives under the `NOTIFIER_` prefix.
use serde::Deserialize;
use std::time::Duration;

use crate::models::RadiusBand;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub fcm: FcmConfig,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Push credentials. Both unset means pushes are recorded as failed.
#[derive(Debug, Clone, Deserialize)]
pub struct FcmConfig {
    pub project_id: Option<String>,
    pub credentials_path: Option<String>,
}

/// When the ellipsis marker is appended to the notification body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EllipsisPolicy {
    /// Always append, even when nothing was cut
    #[default]
    Always,
    /// Append only when the description was shortened
    WhenTruncated,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "default_min_radius_km")]
    pub min_radius_km: f64,
    #[serde(default = "default_max_radius_km")]
    pub max_radius_km: f64,
    #[serde(default = "default_description_truncate_len")]
    pub description_truncate_len: usize,
    #[serde(default)]
    pub ellipsis_policy: EllipsisPolicy,
    #[serde(default = "default_invocation_timeout_secs")]
    pub invocation_timeout_secs: u64,
}

fn default_min_radius_km() -> f64 {
    0.05
}

fn default_max_radius_km() -> f64 {
    5.0
}

fn default_description_truncate_len() -> usize {
    100
}

fn default_invocation_timeout_secs() -> u64 {
    30
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            min_radius_km: default_min_radius_km(),
            max_radius_km: default_max_radius_km(),
            description_truncate_len: default_description_truncate_len(),
            ellipsis_policy: EllipsisPolicy::default(),
            invocation_timeout_secs: default_invocation_timeout_secs(),
        }
    }
}

impl NotifierConfig {
    /// Read `NOTIFIER_*` variables, falling back to defaults
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("NOTIFIER_").from_env::<NotifierConfig>()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.min_radius_km.is_finite() || self.min_radius_km < 0.0 {
            return Err(format!(
                "min_radius_km must be a non-negative number, got {}",
                self.min_radius_km
            ));
        }
        if !self.max_radius_km.is_finite() || self.max_radius_km <= 0.0 {
            return Err(format!(
                "max_radius_km must be positive, got {}",
                self.max_radius_km
            ));
        }
        if self.min_radius_km >= self.max_radius_km {
            return Err(format!(
                "min_radius_km ({}) must be smaller than max_radius_km ({})",
                self.min_radius_km, self.max_radius_km
            ));
        }
        if self.description_truncate_len == 0 {
            return Err("description_truncate_len must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn radius_band(&self) -> RadiusBand {
        RadiusBand::new(self.min_radius_km, self.max_radius_km)
    }

    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_secs(self.invocation_timeout_secs)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let notifier = NotifierConfig::from_env()?;
        notifier.validate()?;

        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("APP_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            fcm: FcmConfig {
                project_id: std::env::var("FCM_PROJECT_ID").ok(),
                credentials_path: std::env::var("FCM_CREDENTIALS_PATH").ok(),
            },
            notifier,
        })
    }
}
