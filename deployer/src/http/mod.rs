//! HTTP implementation of the backend collaborators

pub mod client;
pub mod endpoints;
pub mod resource_controls;
pub mod stacks;
pub mod templates;
