//! Custom template API client

use async_trait::async_trait;

use crate::errors::DeployerError;
use crate::http::client::{HttpClient, NO_QUERY};
use crate::models::stack::StackEngine;
use crate::models::template::{CustomTemplate, TemplateFile};
use crate::services::TemplateService;

impl HttpClient {
    /// Custom templates usable with `engine`
    pub async fn get_custom_templates(
        &self,
        engine: StackEngine,
    ) -> Result<Vec<CustomTemplate>, DeployerError> {
        self.get("/api/custom_templates", &[("type", engine.api_type())])
            .await
    }

    /// Stack file content of a custom template
    pub async fn get_custom_template_file(&self, template_id: u64) -> Result<String, DeployerError> {
        let path = format!("/api/custom_templates/{}/file", template_id);
        let file: TemplateFile = self.get(&path, NO_QUERY).await?;
        Ok(file.file_content)
    }
}

#[async_trait]
impl TemplateService for HttpClient {
    async fn custom_templates(&self, engine: StackEngine) -> Result<Vec<CustomTemplate>, DeployerError> {
        self.get_custom_templates(engine).await
    }

    async fn custom_template_file(&self, template_id: u64) -> Result<String, DeployerError> {
        self.get_custom_template_file(template_id).await
    }
}
