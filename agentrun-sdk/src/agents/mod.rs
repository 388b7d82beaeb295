pub mod builder;
pub mod client;

pub use builder::AgentBuilder;
pub use client::{AgentsClient, DEFAULT_API_VERSION};
