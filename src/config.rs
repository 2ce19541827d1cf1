/// Configuration management for Chalkline
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub email: Option<EmailConfig>,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
    /// Explicit operating mode, injected at construction rather than toggled
    /// through ambient process state.
    pub operating_mode: OperatingMode,
}

/// Operating mode for outbound mail dispatch
///
/// In `Degraded` mode the bulk notifier fails every send fast and records the
/// outcome instead of touching the SMTP transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    Normal,
    Degraded,
}

impl OperatingMode {
    pub fn from_str(s: &str) -> ApiResult<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(OperatingMode::Normal),
            "degraded" => Ok(OperatingMode::Degraded),
            _ => Err(ApiError::Validation(format!("Invalid operating mode: {}", s))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Session token lifetime in hours
    pub session_lifetime_hours: i64,
    /// Password reset token lifetime in minutes
    pub reset_token_lifetime_minutes: i64,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
    /// Per-message send timeout in seconds
    pub send_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("CHALKLINE_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("CHALKLINE_PORT")
            .unwrap_or_else(|_| "4100".to_string())
            .parse()
            .map_err(|_| ApiError::Validation("Invalid port number".to_string()))?;
        let version = env::var("CHALKLINE_VERSION").unwrap_or_else(|_| "0.1.0".to_string());

        let operating_mode = OperatingMode::from_str(
            &env::var("CHALKLINE_OPERATING_MODE").unwrap_or_else(|_| "normal".to_string()),
        )?;

        let data_directory: PathBuf = env::var("CHALKLINE_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("CHALKLINE_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("chalkline.sqlite"));

        let jwt_secret = env::var("CHALKLINE_JWT_SECRET")
            .map_err(|_| ApiError::Validation("JWT secret required".to_string()))?;
        let session_lifetime_hours = env::var("CHALKLINE_SESSION_LIFETIME_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);
        let reset_token_lifetime_minutes = env::var("CHALKLINE_RESET_TOKEN_LIFETIME_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        let email = if let Ok(smtp_url) = env::var("CHALKLINE_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("CHALKLINE_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
                send_timeout_secs: env::var("CHALKLINE_EMAIL_SEND_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            })
        } else {
            None
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
                operating_mode,
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            authentication: AuthConfig {
                jwt_secret,
                session_lifetime_hours,
                reset_token_lifetime_minutes,
            },
            email,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(ApiError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.session_lifetime_hours <= 0 {
            return Err(ApiError::Validation(
                "Session lifetime must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
