//! # agentrun SDK
//!
//! Client for hosted agent services: create an agent that declares local
//! functions, start a run, and let the [`dispatcher::RunDispatcher`] poll it,
//! executing the functions the run asks for and submitting their outputs.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agentrun_sdk::{
//!     agents::AgentsClient,
//!     client::AgentsService,
//!     credential::DefaultCredential,
//!     dispatcher::RunDispatcher,
//!     tools::FunctionRegistry,
//!     types::Role,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credential = Arc::new(DefaultCredential::from_env()?);
//!     let client = AgentsClient::from_connection_string(
//!         &std::env::var("PROJECT_CONNECTION_STRING")?,
//!         credential,
//!     )?;
//!     let registry = FunctionRegistry::new();
//!
//!     let agent = client
//!         .agent_builder()
//!         .model("gpt-4o-mini")
//!         .instructions("You are a helpful agent")
//!         .functions(&registry)
//!         .create()
//!         .await?;
//!     let thread = client.create_thread().await?;
//!     client.create_message(&thread.id, Role::User, "Hello!").await?;
//!     let run = client.create_run(&thread.id, &agent.id).await?;
//!
//!     let outcome = RunDispatcher::new(&client, &registry)
//!         .run_to_completion(run)
//!         .await?;
//!     println!("Run finished: {}", outcome.status());
//!
//!     client.delete_agent(&agent.id).await?;
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod client;
pub mod connection;
pub mod credential;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod tools;
pub mod types;

pub use error::{AgentsError, ToolError};
