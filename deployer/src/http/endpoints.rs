//! Environment (endpoint) API client

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::DeployerError;
use crate::http::client::{HttpClient, NO_QUERY};
use crate::models::environment::{Container, Environment, EnvironmentMode, SwarmInfo};
use crate::services::EnvironmentService;

/// Subset of the engine `info` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineInfo {
    #[serde(rename = "Swarm", default)]
    pub swarm: SwarmInfo,
}

impl HttpClient {
    /// Get an environment's metadata
    pub async fn get_environment(&self, endpoint_id: u64) -> Result<Environment, DeployerError> {
        let path = format!("/api/endpoints/{}", endpoint_id);
        self.get(&path, NO_QUERY).await
    }

    /// Get the engine info of an environment
    pub async fn get_engine_info(&self, endpoint_id: u64) -> Result<EngineInfo, DeployerError> {
        let path = format!("/api/endpoints/{}/docker/info", endpoint_id);
        self.get(&path, NO_QUERY).await
    }

    /// List every container of an environment, stopped ones included
    pub async fn get_containers(&self, endpoint_id: u64) -> Result<Vec<Container>, DeployerError> {
        let path = format!("/api/endpoints/{}/docker/containers/json", endpoint_id);
        self.get(&path, &[("all", 1)]).await
    }
}

#[async_trait]
impl EnvironmentService for HttpClient {
    async fn environment_mode(&self, endpoint_id: u64) -> Result<EnvironmentMode, DeployerError> {
        let info = self.get_engine_info(endpoint_id).await?;
        Ok(EnvironmentMode::from_swarm_info(&info.swarm))
    }

    async fn current_environment(&self, endpoint_id: u64) -> Result<Environment, DeployerError> {
        self.get_environment(endpoint_id).await
    }

    async fn containers(&self, endpoint_id: u64) -> Result<Vec<Container>, DeployerError> {
        self.get_containers(endpoint_id).await
    }
}
