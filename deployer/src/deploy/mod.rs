//! Stack deployment workflow

pub mod dispatch;
pub mod fsm;
pub mod guard;
pub mod validation;
pub mod workflow;
