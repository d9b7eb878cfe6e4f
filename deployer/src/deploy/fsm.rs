//! Finite State Machine for stack submission

use serde::{Deserialize, Serialize};

use crate::errors::DeployerError;

/// Submission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    /// Form is editable, nothing in flight
    Idle,

    /// Local guards are being checked
    Validating,

    /// Creation and access control calls are in flight
    Submitting,

    /// Stack deployed and ownership applied
    Succeeded,

    /// A remote call failed
    Failed,
}

impl DeploymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentState::Succeeded | DeploymentState::Failed)
    }
}

/// Submission event
#[derive(Debug, Clone)]
pub enum DeploymentEvent {
    /// User pressed deploy
    Submit,

    /// A local guard refused the form
    Reject(String),

    /// Every guard passed
    Accept,

    /// Creation and access control both succeeded
    Succeed,

    /// A remote call failed
    Fail(String),

    /// Outcome seen, back to the form
    Acknowledge,
}

/// Submission FSM
#[derive(Debug, Clone)]
pub struct DeploymentFsm {
    state: DeploymentState,
    error: Option<String>,
}

impl DeploymentFsm {
    /// Create a new FSM in idle state
    pub fn new() -> Self {
        Self {
            state: DeploymentState::Idle,
            error: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> DeploymentState {
        self.state
    }

    /// Message of the last rejection or failure
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DeploymentEvent) -> Result<(), DeployerError> {
        let new_state = match (self.state, &event) {
            (DeploymentState::Idle, DeploymentEvent::Submit) => {
                self.error = None;
                DeploymentState::Validating
            }

            (DeploymentState::Validating, DeploymentEvent::Reject(reason)) => {
                self.error = Some(reason.clone());
                DeploymentState::Idle
            }
            (DeploymentState::Validating, DeploymentEvent::Accept) => DeploymentState::Submitting,

            (DeploymentState::Submitting, DeploymentEvent::Succeed) => DeploymentState::Succeeded,
            (DeploymentState::Submitting, DeploymentEvent::Fail(err)) => {
                self.error = Some(err.clone());
                DeploymentState::Failed
            }

            (DeploymentState::Succeeded | DeploymentState::Failed, DeploymentEvent::Acknowledge) => {
                DeploymentState::Idle
            }

            (state, event) => {
                return Err(DeployerError::Internal(format!(
                    "Invalid transition: {:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for DeploymentFsm {
    fn default() -> Self {
        Self::new()
    }
}
