//! Stack API client

use async_trait::async_trait;
use reqwest::multipart;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::DeployerError;
use crate::http::client::{HttpClient, NO_QUERY};
use crate::models::stack::{EnvVar, RepositoryOptions, Stack, StackEngine, StackPayload, UploadedFile};
use crate::services::StackService;

/// Swarm cluster description
#[derive(Debug, Clone, Deserialize)]
pub struct Swarm {
    #[serde(rename = "ID")]
    pub id: String,
}

/// Body for a stack created from inline content
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct FileContentPayload<'a> {
    name: &'a str,
    #[serde(rename = "SwarmID", skip_serializing_if = "Option::is_none")]
    swarm_id: Option<String>,
    stack_file_content: &'a str,
    env: &'a [EnvVar],
}

/// Body for a stack created from a Git repository
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RepositoryPayload<'a> {
    name: &'a str,
    #[serde(rename = "SwarmID", skip_serializing_if = "Option::is_none")]
    swarm_id: Option<String>,
    #[serde(rename = "RepositoryURL")]
    repository_url: &'a str,
    repository_reference_name: &'a str,
    compose_file_path_in_repository: &'a str,
    repository_authentication: bool,
    repository_username: &'a str,
    repository_password: &'a str,
    env: &'a [EnvVar],
}

fn create_query(engine: StackEngine, method: &str, endpoint_id: u64) -> Vec<(&'static str, String)> {
    vec![
        ("type", engine.api_type().to_string()),
        ("method", method.to_string()),
        ("endpointId", endpoint_id.to_string()),
    ]
}

impl HttpClient {
    /// Get the swarm cluster behind an environment
    pub async fn get_swarm(&self, endpoint_id: u64) -> Result<Swarm, DeployerError> {
        let path = format!("/api/endpoints/{}/docker/swarm", endpoint_id);
        self.get(&path, NO_QUERY).await
    }

    /// Swarm stacks must name the cluster they belong to
    async fn swarm_id_for(&self, engine: StackEngine, endpoint_id: u64) -> Result<Option<String>, DeployerError> {
        match engine {
            StackEngine::Swarm => {
                let swarm = self.get_swarm(endpoint_id).await?;
                debug!("Using swarm {} for environment {}", swarm.id, endpoint_id);
                Ok(Some(swarm.id))
            }
            StackEngine::Compose => Ok(None),
        }
    }

    /// Create a stack from inline stack file content
    pub async fn create_stack_from_file_content(
        &self,
        engine: StackEngine,
        name: &str,
        content: &str,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError> {
        info!("Creating {} stack '{}' from file content", engine, name);

        let payload = FileContentPayload {
            name,
            swarm_id: self.swarm_id_for(engine, endpoint_id).await?,
            stack_file_content: content,
            env,
        };
        let query = create_query(engine, "string", endpoint_id);
        let body: serde_json::Value = self.post("/api/stacks", &query, &payload).await?;
        Ok(StackPayload(body))
    }

    /// Create a stack from an uploaded stack file
    pub async fn create_stack_from_file_upload(
        &self,
        engine: StackEngine,
        name: &str,
        file: &UploadedFile,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError> {
        info!("Creating {} stack '{}' from uploaded file {}", engine, name, file.name);

        let mut form = multipart::Form::new()
            .text("Name", name.to_string())
            .text("Env", serde_json::to_string(env)?);
        if let Some(swarm_id) = self.swarm_id_for(engine, endpoint_id).await? {
            form = form.text("SwarmID", swarm_id);
        }
        let part = multipart::Part::bytes(file.content.clone()).file_name(file.name.clone());
        form = form.part("file", part);

        let query = create_query(engine, "file", endpoint_id);
        let body: serde_json::Value = self.post_multipart("/api/stacks", &query, form).await?;
        Ok(StackPayload(body))
    }

    /// Create a stack from a compose file inside a Git repository
    pub async fn create_stack_from_git_repository(
        &self,
        engine: StackEngine,
        name: &str,
        options: &RepositoryOptions,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError> {
        info!(
            "Creating {} stack '{}' from repository {}",
            engine, name, options.repository_url
        );

        let payload = RepositoryPayload {
            name,
            swarm_id: self.swarm_id_for(engine, endpoint_id).await?,
            repository_url: &options.repository_url,
            repository_reference_name: &options.repository_reference_name,
            compose_file_path_in_repository: &options.compose_file_path_in_repository,
            repository_authentication: options.repository_authentication,
            repository_username: &options.repository_username,
            repository_password: options.repository_password.expose_secret(),
            env,
        };
        let query = create_query(engine, "repository", endpoint_id);
        let body: serde_json::Value = self.post("/api/stacks", &query, &payload).await?;
        Ok(StackPayload(body))
    }

    /// List the stacks of an environment
    pub async fn get_stacks(&self, endpoint_id: u64) -> Result<Vec<Stack>, DeployerError> {
        let filters = serde_json::json!({ "EndpointID": endpoint_id }).to_string();
        self.get("/api/stacks", &[("filters", filters)]).await
    }
}

#[async_trait]
impl StackService for HttpClient {
    async fn create_swarm_stack_from_file_content(
        &self,
        name: &str,
        content: &str,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError> {
        self.create_stack_from_file_content(StackEngine::Swarm, name, content, env, endpoint_id)
            .await
    }

    async fn create_swarm_stack_from_file_upload(
        &self,
        name: &str,
        file: &UploadedFile,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError> {
        self.create_stack_from_file_upload(StackEngine::Swarm, name, file, env, endpoint_id)
            .await
    }

    async fn create_swarm_stack_from_git_repository(
        &self,
        name: &str,
        options: &RepositoryOptions,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError> {
        self.create_stack_from_git_repository(StackEngine::Swarm, name, options, env, endpoint_id)
            .await
    }

    async fn create_compose_stack_from_file_content(
        &self,
        name: &str,
        content: &str,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError> {
        self.create_stack_from_file_content(StackEngine::Compose, name, content, env, endpoint_id)
            .await
    }

    async fn create_compose_stack_from_file_upload(
        &self,
        name: &str,
        file: &UploadedFile,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError> {
        self.create_stack_from_file_upload(StackEngine::Compose, name, file, env, endpoint_id)
            .await
    }

    async fn create_compose_stack_from_git_repository(
        &self,
        name: &str,
        options: &RepositoryOptions,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError> {
        self.create_stack_from_git_repository(StackEngine::Compose, name, options, env, endpoint_id)
            .await
    }

    async fn stacks(&self, endpoint_id: u64) -> Result<Vec<Stack>, DeployerError> {
        self.get_stacks(endpoint_id).await
    }
}
