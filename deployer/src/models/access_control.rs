//! Access control models

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who may view and manage a deployed resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    #[default]
    Administrators,
    Private,
    Restricted,
    Public,
}

impl std::str::FromStr for Ownership {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "administrators" | "admin" => Ok(Ownership::Administrators),
            "private" => Ok(Ownership::Private),
            "restricted" => Ok(Ownership::Restricted),
            "public" => Ok(Ownership::Public),
            _ => Err(format!("Invalid ownership: {}", s)),
        }
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ownership::Administrators => "administrators",
            Ownership::Private => "private",
            Ownership::Restricted => "restricted",
            Ownership::Public => "public",
        };
        f.write_str(name)
    }
}

/// Access control section of the deployment form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControlData {
    pub access_control_enabled: bool,
    pub ownership: Ownership,
    pub authorized_users: Vec<u64>,
    pub authorized_teams: Vec<u64>,
}

impl Default for AccessControlData {
    fn default() -> Self {
        Self {
            access_control_enabled: true,
            ownership: Ownership::Administrators,
            authorized_users: Vec::new(),
            authorized_teams: Vec::new(),
        }
    }
}

/// Ownership record the backend attaches to a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceControl {
    pub id: u64,
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub administrators_only: bool,
    #[serde(default)]
    pub system: bool,
}

/// Body of a resource control update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceControlUpdate {
    pub public: bool,
    pub administrators_only: bool,
    pub users: Vec<u64>,
    pub teams: Vec<u64>,
}

impl ResourceControlUpdate {
    /// Translate the form's ownership choice for `user_id`
    pub fn from_form(user_id: u64, data: &AccessControlData) -> Self {
        let ownership = if data.access_control_enabled {
            data.ownership
        } else {
            Ownership::Public
        };

        let mut update = Self::default();
        match ownership {
            Ownership::Public => update.public = true,
            Ownership::Administrators => update.administrators_only = true,
            Ownership::Private => update.users = vec![user_id],
            Ownership::Restricted => {
                update.users = data.authorized_users.clone();
                update.teams = data.authorized_teams.clone();
            }
        }
        update
    }
}
