//! Command implementations for the agentrun CLI

pub mod functions;
pub mod run;
