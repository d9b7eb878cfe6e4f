//! Form validation rules

use serde_yaml::Value;
use thiserror::Error;

use crate::models::access_control::{AccessControlData, Ownership};
use crate::models::stack::EnvVar;

/// Shown when the editor is empty on submit
pub const EMPTY_CONTENT_ERROR: &str = "Stack file content must not be empty";

/// Problems found in a stack file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum YamlValidationError {
    #[error("There is an error in the yaml syntax")]
    Syntax,

    #[error("This container name is already used by another container running in this environment: {0}.")]
    DuplicateContainer(String),

    #[error("These container names are already used by another containers running in this environment: {}.", .0.join(", "))]
    DuplicateContainers(Vec<String>),
}

/// Check that `yaml` parses and declares no container name already in use.
///
/// `existing_names` must already be normalized (no leading `/`).
pub fn validate_yaml(yaml: &str, existing_names: &[String]) -> Result<(), YamlValidationError> {
    let document: Value =
        serde_yaml::from_str(yaml).map_err(|_| YamlValidationError::Syntax)?;

    let mut duplicates = container_name_duplicates(&document, existing_names);
    match duplicates.len() {
        0 => Ok(()),
        1 => Err(YamlValidationError::DuplicateContainer(duplicates.remove(0))),
        _ => Err(YamlValidationError::DuplicateContainers(duplicates)),
    }
}

/// `container_name` values declared by the document's services that are also
/// in `existing_names`, each listed once, in service order
pub fn container_name_duplicates(document: &Value, existing_names: &[String]) -> Vec<String> {
    let Some(services) = document.get("services").and_then(Value::as_mapping) else {
        return Vec::new();
    };

    let mut duplicates: Vec<String> = Vec::new();
    let declared = services
        .values()
        .filter_map(|service| service.get("container_name").and_then(Value::as_str));
    for name in declared {
        let running = existing_names.iter().any(|existing| existing == name);
        if running && !duplicates.iter().any(|seen| seen == name) {
            duplicates.push(name.to_string());
        }
    }
    duplicates
}

/// Reason the access control settings cannot be submitted, if any
pub fn validate_access_control(data: &AccessControlData, is_admin: bool) -> Option<String> {
    if !data.access_control_enabled || data.ownership != Ownership::Restricted {
        return None;
    }

    if is_admin && data.authorized_users.is_empty() && data.authorized_teams.is_empty() {
        return Some("You must specify at least one team or user.".to_string());
    }

    if !is_admin && data.authorized_teams.is_empty() {
        return Some("You must specify at least a team.".to_string());
    }

    None
}

/// Drop variables missing a name or a value
pub fn sanitize_env(env: &[EnvVar]) -> Vec<EnvVar> {
    env.iter()
        .filter(|var| !var.name.is_empty() && !var.value.is_empty())
        .cloned()
        .collect()
}
