//! Data models

pub mod access_control;
pub mod environment;
pub mod stack;
pub mod template;
