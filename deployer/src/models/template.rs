//! Custom template models

use serde::{Deserialize, Serialize};

/// A reusable stack definition stored on the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomTemplate {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "Type", default)]
    pub template_type: u8,
    #[serde(default)]
    pub note: String,
}

/// Template decorated with the label shown in the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOption {
    pub template: CustomTemplate,
    pub label: String,
}

impl From<CustomTemplate> for TemplateOption {
    fn from(template: CustomTemplate) -> Self {
        let label = format!("{} - {}", template.title, template.description);
        Self { template, label }
    }
}

/// Body of the template file endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateFile {
    #[serde(rename = "FileContent")]
    pub file_content: String,
}
