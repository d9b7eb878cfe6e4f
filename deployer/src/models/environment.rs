//! Environment (deployment target) models

use serde::{Deserialize, Serialize};

use crate::utils::normalize_container_name;

/// Container engine flavour of an environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provider {
    #[default]
    DockerStandalone,
    DockerSwarmMode,
}

/// Role of the node the API talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Manager,
    Worker,
}

/// Mode of the active environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentMode {
    pub provider: Provider,
    pub role: Role,
}

/// Swarm section of the engine `info` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SwarmInfo {
    #[serde(rename = "NodeID", default)]
    pub node_id: String,
    #[serde(default)]
    pub control_available: bool,
}

impl EnvironmentMode {
    /// Derive the mode from the engine's swarm info
    pub fn from_swarm_info(swarm: &SwarmInfo) -> Self {
        if swarm.node_id.is_empty() {
            return Self {
                provider: Provider::DockerStandalone,
                role: Role::Manager,
            };
        }
        Self {
            provider: Provider::DockerSwarmMode,
            role: if swarm.control_available {
                Role::Manager
            } else {
                Role::Worker
            },
        }
    }
}

/// The active deployment target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Highest compose file format the target accepts, e.g. "3.9"
    #[serde(default)]
    pub compose_syntax_max_version: String,
}

/// A container running in the environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Container {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub names: Vec<String>,
}

/// Flattened, normalized names of every container
pub fn container_names(containers: &[Container]) -> Vec<String> {
    containers
        .iter()
        .flat_map(|container| container.names.iter())
        .map(|name| normalize_container_name(name))
        .collect()
}
