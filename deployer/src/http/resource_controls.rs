//! Resource control API client

use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::DeployerError;
use crate::http::client::HttpClient;
use crate::models::access_control::{AccessControlData, ResourceControl, ResourceControlUpdate};
use crate::services::ResourceControlService;

impl HttpClient {
    /// Replace the ownership of an existing resource control
    pub async fn update_resource_control(
        &self,
        resource_control_id: u64,
        update: &ResourceControlUpdate,
    ) -> Result<(), DeployerError> {
        let path = format!("/api/resource_controls/{}", resource_control_id);
        let _: serde_json::Value = self.put(&path, update).await?;
        Ok(())
    }
}

#[async_trait]
impl ResourceControlService for HttpClient {
    async fn apply_resource_control(
        &self,
        user_id: u64,
        data: &AccessControlData,
        resource_control: Option<&ResourceControl>,
    ) -> Result<(), DeployerError> {
        let Some(resource_control) = resource_control else {
            debug!("No resource control returned, nothing to apply");
            return Ok(());
        };

        let update = ResourceControlUpdate::from_form(user_id, data);
        info!(
            "Applying {} ownership to resource control {}",
            data.ownership, resource_control.id
        );
        self.update_resource_control(resource_control.id, &update).await
    }
}
