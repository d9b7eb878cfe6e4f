//! Engine x method dispatch table

use crate::errors::DeployerError;
use crate::models::stack::{
    DeploymentMethod, EnvVar, RepositoryOptions, StackEngine, StackPayload, UploadedFile,
};
use crate::services::StackService;

/// Stack definition read from the form for one deployment method
#[derive(Debug, Clone, Copy)]
pub enum StackSource<'a> {
    FileContent(&'a str),
    FileUpload(&'a UploadedFile),
    GitRepository(&'a RepositoryOptions),
}

impl<'a> StackSource<'a> {
    /// Pick the form field `method` reads. Editor and template both submit
    /// the editor content.
    pub fn for_method(
        method: DeploymentMethod,
        content: &'a str,
        file: Option<&'a UploadedFile>,
        repository: &'a RepositoryOptions,
    ) -> Result<Self, DeployerError> {
        match method {
            DeploymentMethod::Editor | DeploymentMethod::Template => Ok(StackSource::FileContent(content)),
            DeploymentMethod::Upload => file
                .map(StackSource::FileUpload)
                .ok_or_else(|| DeployerError::DeployError("No stack file selected for upload".to_string())),
            DeploymentMethod::Repository => Ok(StackSource::GitRepository(repository)),
        }
    }
}

/// Call the creation function matching `engine` and `source`
pub async fn create_stack(
    stacks: &dyn StackService,
    engine: StackEngine,
    name: &str,
    source: StackSource<'_>,
    env: &[EnvVar],
    endpoint_id: u64,
) -> Result<StackPayload, DeployerError> {
    match (engine, source) {
        (StackEngine::Swarm, StackSource::FileContent(content)) => {
            stacks.create_swarm_stack_from_file_content(name, content, env, endpoint_id).await
        }
        (StackEngine::Swarm, StackSource::FileUpload(file)) => {
            stacks.create_swarm_stack_from_file_upload(name, file, env, endpoint_id).await
        }
        (StackEngine::Swarm, StackSource::GitRepository(options)) => {
            stacks.create_swarm_stack_from_git_repository(name, options, env, endpoint_id).await
        }
        (StackEngine::Compose, StackSource::FileContent(content)) => {
            stacks.create_compose_stack_from_file_content(name, content, env, endpoint_id).await
        }
        (StackEngine::Compose, StackSource::FileUpload(file)) => {
            stacks.create_compose_stack_from_file_upload(name, file, env, endpoint_id).await
        }
        (StackEngine::Compose, StackSource::GitRepository(options)) => {
            stacks.create_compose_stack_from_git_repository(name, options, env, endpoint_id).await
        }
    }
}
