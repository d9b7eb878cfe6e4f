//! Stack deployer library
//!
//! Deploys Swarm and Compose stacks to a container management API: form
//! state, validation, engine/method dispatch and ownership assignment.

pub mod authn;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;
