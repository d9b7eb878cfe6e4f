//! Stack models

use std::borrow::Cow;
use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::errors::DeployerError;
use crate::filesys::file::File;
use crate::models::access_control::ResourceControl;
use crate::models::environment::{EnvironmentMode, Provider, Role};

/// Default compose file looked up inside a Git repository
pub const DEFAULT_COMPOSE_FILE_PATH: &str = "docker-compose.yml";

/// Orchestration engine a stack is deployed with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StackEngine {
    Swarm,
    #[default]
    Compose,
}

impl StackEngine {
    /// Swarm on a manager node in swarm mode, Compose everywhere else
    pub fn from_mode(mode: &EnvironmentMode) -> Self {
        if mode.provider == Provider::DockerSwarmMode && mode.role == Role::Manager {
            StackEngine::Swarm
        } else {
            StackEngine::Compose
        }
    }

    /// Numeric stack type used by the API
    pub fn api_type(self) -> u8 {
        match self {
            StackEngine::Swarm => 1,
            StackEngine::Compose => 2,
        }
    }
}

impl fmt::Display for StackEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackEngine::Swarm => write!(f, "swarm"),
            StackEngine::Compose => write!(f, "compose"),
        }
    }
}

/// Where the stack file comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeploymentMethod {
    #[default]
    Editor,
    Upload,
    Repository,
    Template,
}

impl std::str::FromStr for DeploymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "editor" | "web" => Ok(DeploymentMethod::Editor),
            "upload" | "file" => Ok(DeploymentMethod::Upload),
            "repository" | "git" => Ok(DeploymentMethod::Repository),
            "template" => Ok(DeploymentMethod::Template),
            _ => Err(format!("Invalid deployment method: {}", s)),
        }
    }
}

impl fmt::Display for DeploymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentMethod::Editor => "editor",
            DeploymentMethod::Upload => "upload",
            DeploymentMethod::Repository => "repository",
            DeploymentMethod::Template => "template",
        };
        f.write_str(name)
    }
}

/// Environment variable passed to the stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse a `NAME=VALUE` pair. The value may itself contain `=`.
    pub fn parse(pair: &str) -> Result<Self, DeployerError> {
        match pair.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok(Self::new(name, value)),
            _ => Err(DeployerError::ValidationError(format!(
                "Invalid environment variable '{}', expected NAME=VALUE",
                pair
            ))),
        }
    }
}

/// Git repository the stack file is read from
#[derive(Debug)]
pub struct RepositoryOptions {
    pub repository_url: String,
    pub repository_reference_name: String,
    pub compose_file_path_in_repository: String,
    pub repository_authentication: bool,
    pub repository_username: String,
    pub repository_password: SecretString,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            repository_url: String::new(),
            repository_reference_name: String::new(),
            compose_file_path_in_repository: DEFAULT_COMPOSE_FILE_PATH.to_string(),
            repository_authentication: false,
            repository_username: String::new(),
            repository_password: SecretString::from(String::new()),
        }
    }
}

/// A stack file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a stack file from disk
    pub async fn from_path(file: &File) -> Result<Self, DeployerError> {
        let content = file.read_bytes().await?;
        Ok(Self::new(file.file_name(), content))
    }

    /// File contents decoded as text
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// Raw payload returned by a stack creation call.
///
/// Some responses wrap the stack one level deep under `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct StackPayload(pub serde_json::Value);

impl StackPayload {
    /// The stack object, unwrapped from a `data` envelope when present
    pub fn into_inner(self) -> serde_json::Value {
        match self.0 {
            serde_json::Value::Object(mut map) if is_truthy(map.get("data")) => {
                map.remove("data").unwrap_or(serde_json::Value::Null)
            }
            other => other,
        }
    }

    /// Resource control attached to the created stack. A malformed record is
    /// an error, not a missing one.
    pub fn resource_control(self) -> Result<Option<ResourceControl>, DeployerError> {
        match self.into_inner().get_mut("ResourceControl").map(serde_json::Value::take) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(control) => Ok(Some(serde_json::from_value(control)?)),
        }
    }
}

fn is_truthy(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => false,
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(_) => true,
    }
}

/// A deployed stack as listed by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stack {
    pub id: u64,
    pub name: String,
    #[serde(rename = "Type")]
    pub stack_type: u8,
    #[serde(rename = "EndpointId", default)]
    pub endpoint_id: u64,
    #[serde(default)]
    pub status: u8,
}
