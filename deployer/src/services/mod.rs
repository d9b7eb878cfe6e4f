//! Collaborators the deployment workflow depends on
//!
//! Each trait is a seam: the HTTP client implements the backend ones, the
//! terminal implements notification and navigation, and tests swap in fakes.

pub mod notifier;

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::DeployerError;
use crate::models::access_control::{AccessControlData, ResourceControl};
use crate::models::environment::{Container, Environment, EnvironmentMode};
use crate::models::stack::{EnvVar, RepositoryOptions, Stack, StackEngine, StackPayload, UploadedFile};
use crate::models::template::CustomTemplate;

/// Stack creation, one call per (engine, source) pair
#[async_trait]
pub trait StackService: Send + Sync {
    async fn create_swarm_stack_from_file_content(
        &self,
        name: &str,
        content: &str,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError>;

    async fn create_swarm_stack_from_file_upload(
        &self,
        name: &str,
        file: &UploadedFile,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError>;

    async fn create_swarm_stack_from_git_repository(
        &self,
        name: &str,
        options: &RepositoryOptions,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError>;

    async fn create_compose_stack_from_file_content(
        &self,
        name: &str,
        content: &str,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError>;

    async fn create_compose_stack_from_file_upload(
        &self,
        name: &str,
        file: &UploadedFile,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError>;

    async fn create_compose_stack_from_git_repository(
        &self,
        name: &str,
        options: &RepositoryOptions,
        env: &[EnvVar],
        endpoint_id: u64,
    ) -> Result<StackPayload, DeployerError>;

    /// Stacks deployed to an environment
    async fn stacks(&self, endpoint_id: u64) -> Result<Vec<Stack>, DeployerError>;
}

/// Ownership metadata for deployed resources
#[async_trait]
pub trait ResourceControlService: Send + Sync {
    /// Apply the form's ownership to `resource_control`. Nothing to do when
    /// the backend created none.
    async fn apply_resource_control(
        &self,
        user_id: u64,
        data: &AccessControlData,
        resource_control: Option<&ResourceControl>,
    ) -> Result<(), DeployerError>;
}

/// Custom template storage
#[async_trait]
pub trait TemplateService: Send + Sync {
    async fn custom_templates(&self, engine: StackEngine) -> Result<Vec<CustomTemplate>, DeployerError>;

    async fn custom_template_file(&self, template_id: u64) -> Result<String, DeployerError>;
}

/// Information about the deployment target
#[async_trait]
pub trait EnvironmentService: Send + Sync {
    async fn environment_mode(&self, endpoint_id: u64) -> Result<EnvironmentMode, DeployerError>;

    async fn current_environment(&self, endpoint_id: u64) -> Result<Environment, DeployerError>;

    async fn containers(&self, endpoint_id: u64) -> Result<Vec<Container>, DeployerError>;
}

/// User-facing notifications
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, title: &str, err: &DeployerError, context: &str);
}

/// Views the workflow can move to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Stack list of an environment
    Stacks { endpoint_id: u64 },
}

/// Moves the user to another view
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn go(&self, route: Route) -> Result<(), DeployerError>;
}

/// Bundle of every collaborator
#[derive(Clone)]
pub struct Services {
    pub stacks: Arc<dyn StackService>,
    pub resource_controls: Arc<dyn ResourceControlService>,
    pub templates: Arc<dyn TemplateService>,
    pub environment: Arc<dyn EnvironmentService>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

impl Services {
    /// Use one backend for every remote collaborator
    pub fn with_backend<B>(
        backend: Arc<B>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self
    where
        B: StackService + ResourceControlService + TemplateService + EnvironmentService + 'static,
    {
        Self {
            stacks: backend.clone(),
            resource_controls: backend.clone(),
            templates: backend.clone(),
            environment: backend,
            notifier,
            navigator,
        }
    }
}
