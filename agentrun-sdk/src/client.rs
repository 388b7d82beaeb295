use crate::{
    error::AgentsError,
    types::{
        Agent, CreateAgentRequest, DeletionStatus, Message, MessageList, Role, Run, Thread,
        ToolOutput,
    },
};
use async_trait::async_trait;

/// Operations of a hosted agent service
///
/// Implemented over HTTP by [`crate::agents::AgentsClient`] and in memory by
/// [`crate::mock::MockAgentsService`].
#[async_trait]
pub trait AgentsService: Send + Sync {
    /// Create an agent with a model, instructions and declared tools
    async fn create_agent(&self, request: CreateAgentRequest) -> Result<Agent, AgentsError>;

    /// Create an empty conversation thread
    async fn create_thread(&self) -> Result<Thread, AgentsError>;

    /// Append a message to a thread
    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message, AgentsError>;

    /// Start a run of the agent against the thread
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run, AgentsError>;

    /// Fetch the current state of a run
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AgentsError>;

    /// Resume a run waiting on tool outputs
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        tool_outputs: Vec<ToolOutput>,
    ) -> Result<Run, AgentsError>;

    /// Ask the service to cancel a run
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AgentsError>;

    async fn delete_agent(&self, agent_id: &str) -> Result<DeletionStatus, AgentsError>;

    /// Messages of a thread, in the order the service returns them
    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, AgentsError>;

    /// Name used in logs (e.g. "azure-ai-projects", "mock")
    fn service_name(&self) -> &str;
}
