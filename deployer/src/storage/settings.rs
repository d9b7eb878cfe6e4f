//! Settings file management

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DeployerError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Environment variable that overrides the configured API token
pub const TOKEN_ENV: &str = "STACKDEPLOY_TOKEN";

/// Deployer settings
#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON logs
    #[serde(default)]
    pub json_logs: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Identifier of the environment stacks are deployed to
    #[serde(default = "default_endpoint_id")]
    pub endpoint_id: u64,

    /// Refuse to submit while the stack file has a YAML validation error
    #[serde(default)]
    pub block_on_yaml_errors: bool,
}

fn default_endpoint_id() -> u64 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            backend: BackendSettings::default(),
            endpoint_id: default_endpoint_id(),
            block_on_yaml_errors: false,
        }
    }
}

impl Settings {
    /// Load settings from `file`, falling back to defaults when it does not exist
    pub async fn load(file: &File) -> Result<Self, DeployerError> {
        let mut settings = if file.exists().await {
            file.read_json::<Settings>().await.map_err(|e| {
                DeployerError::ConfigError(format!(
                    "Unable to read {}: {}",
                    file.path().display(),
                    e
                ))
            })?
        } else {
            debug!("No settings file at {}, using defaults", file.path().display());
            Settings::default()
        };

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                settings.backend.api_token = Some(SecretString::from(token));
            }
        }

        Ok(settings)
    }

    /// Write the settings (without the token) to `file`
    pub async fn save(&self, file: &File) -> Result<(), DeployerError> {
        file.write_json(self).await?;
        file.set_permissions_600().await
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), DeployerError> {
        url::Url::parse(&self.backend.base_url).map_err(|e| {
            DeployerError::ConfigError(format!(
                "Invalid backend URL '{}': {}",
                self.backend.base_url, e
            ))
        })?;

        if self.backend.timeout_secs == 0 {
            return Err(DeployerError::ConfigError(
                "backend.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// The API token, if one is configured
    pub fn api_token(&self) -> Option<&str> {
        self.backend
            .api_token
            .as_ref()
            .map(|token| token.expose_secret())
    }
}

/// Backend API settings
#[derive(Debug, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the management API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token (JWT) used to authenticate
    #[serde(default, skip_serializing)]
    pub api_token: Option<SecretString>,
}

fn default_backend_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
            api_token: None,
        }
    }
}
