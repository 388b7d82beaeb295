//! One end-to-end conversation with a hosted agent.
//!
//! Creates an agent advertising the registry's functions, posts a single user
//! message, drives the run to a terminal state and collects the thread's
//! messages. The agent is always deleted before returning.

use std::time::Duration;

use agentrun_sdk::{
    agents::AgentBuilder,
    client::AgentsService,
    dispatcher::{RunDispatcher, RunOutcome},
    tools::FunctionRegistry,
    types::{Message, Role},
    AgentsError,
};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub model: String,
    pub name: String,
    pub instructions: String,
    pub message: String,
    pub poll_interval: Duration,
    pub max_polls: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub agent_id: String,
    pub thread_id: String,
    pub outcome: RunOutcome,
    /// Thread messages in the order the service lists them (newest first)
    pub messages: Vec<Message>,
}

pub async fn run_session(
    service: &dyn AgentsService,
    registry: &FunctionRegistry,
    options: &SessionOptions,
) -> Result<SessionReport, AgentsError> {
    let agent = AgentBuilder::new(service)
        .model(options.model.as_str())
        .name(options.name.as_str())
        .instructions(options.instructions.as_str())
        .functions(registry)
        .create()
        .await?;
    info!("Created agent, ID: {}", agent.id);

    let converse = converse(service, registry, &agent.id, options).await;
    let deleted = service.delete_agent(&agent.id).await;

    let (thread_id, outcome) = match (converse, deleted) {
        (Ok(done), Ok(_)) => {
            info!("Deleted agent");
            done
        }
        (Ok(_), Err(e)) => return Err(e),
        (Err(e), deleted) => {
            if let Err(delete_err) = deleted {
                warn!("Failed to delete agent {}: {}", agent.id, delete_err);
            }
            return Err(e);
        }
    };

    let messages = service.list_messages(&thread_id).await?.data;
    info!("Fetched {} messages", messages.len());

    Ok(SessionReport {
        agent_id: agent.id,
        thread_id,
        outcome,
        messages,
    })
}

async fn converse(
    service: &dyn AgentsService,
    registry: &FunctionRegistry,
    agent_id: &str,
    options: &SessionOptions,
) -> Result<(String, RunOutcome), AgentsError> {
    let thread = service.create_thread().await?;
    info!("Created thread, ID: {}", thread.id);

    let message = service
        .create_message(&thread.id, Role::User, &options.message)
        .await?;
    info!("Created message, ID: {}", message.id);

    let run = service.create_run(&thread.id, agent_id).await?;
    info!("Created run, ID: {}", run.id);

    let outcome = RunDispatcher::new(service, registry)
        .with_poll_interval(options.poll_interval)
        .with_max_polls(options.max_polls)
        .run_to_completion(run)
        .await?;
    info!("Run finished with status: {}", outcome.status());

    Ok((thread.id, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrun_sdk::{
        mock::{MockAgentsService, RunStep},
        types::{RequiredToolCall, RunError, RunStatus},
    };

    fn options() -> SessionOptions {
        SessionOptions {
            model: "gpt-4o-mini".to_string(),
            name: "my-agent".to_string(),
            instructions: "You are a helpful agent".to_string(),
            message: "What's the weather in New York?".to_string(),
            poll_interval: Duration::ZERO,
            max_polls: None,
        }
    }

    #[tokio::test]
    async fn test_session_dispatches_and_cleans_up() {
        let service = MockAgentsService::new()
            .with_steps([
                RunStep::ToolCalls(vec![RequiredToolCall::function(
                    "call_1",
                    "fetch_weather",
                    r#"{"location":"New York"}"#,
                )]),
                RunStep::Status(RunStatus::Completed),
            ])
            .with_reply("It is sunny in New York.");
        let registry = agentrun_tools::user_functions();

        let report = run_session(&service, &registry, &options()).await.unwrap();

        assert_eq!(report.outcome.status(), RunStatus::Completed);
        assert_eq!(report.outcome.submitted_outputs, 1);
        assert_eq!(service.deleted_agents(), vec![report.agent_id.clone()]);
        assert!(service.agents().is_empty());

        let submissions = service.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].tool_outputs[0].tool_call_id, "call_1");
        assert_eq!(
            submissions[0].tool_outputs[0].output,
            r#"{"weather":"Sunny, 25°C"}"#
        );

        let texts: Vec<String> = report.messages.iter().map(|m| m.text_content()).collect();
        assert_eq!(
            texts,
            vec!["It is sunny in New York.", "What's the weather in New York?"]
        );
        assert_eq!(report.messages[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_session_with_finished_run_skips_polling() {
        let service = MockAgentsService::new().with_initial_run_status(RunStatus::Completed);
        let registry = agentrun_tools::user_functions();

        let report = run_session(&service, &registry, &options()).await.unwrap();

        assert_eq!(report.outcome.polls, 0);
        assert_eq!(service.get_run_calls(), 0);
        assert_eq!(report.messages.len(), 1);
        assert_eq!(report.messages[0].role, Role::User);
        assert!(service.agents().is_empty());
    }

    #[tokio::test]
    async fn test_session_reports_failed_run() {
        let service = MockAgentsService::new().with_steps([RunStep::Failed(RunError {
            code: "server_error".to_string(),
            message: "model overloaded".to_string(),
        })]);
        let registry = agentrun_tools::user_functions();

        let report = run_session(&service, &registry, &options()).await.unwrap();

        assert_eq!(report.outcome.status(), RunStatus::Failed);
        let last_error = report.outcome.run.last_error.unwrap();
        assert_eq!(last_error.message, "model overloaded");
        assert_eq!(service.deleted_agents().len(), 1);
    }

    #[tokio::test]
    async fn test_session_deletes_agent_when_dispatch_fails() {
        let service = MockAgentsService::new().with_steps([RunStep::Status(RunStatus::InProgress)]);
        let registry = agentrun_tools::user_functions();
        let mut options = options();
        options.max_polls = Some(2);

        let err = run_session(&service, &registry, &options).await.unwrap_err();

        assert!(matches!(err, AgentsError::PollLimitExceeded { polls: 2, .. }));
        assert_eq!(service.deleted_agents().len(), 1);
        assert!(service.agents().is_empty());
    }

    #[tokio::test]
    async fn test_session_rejects_empty_model() {
        let service = MockAgentsService::new();
        let registry = FunctionRegistry::new();
        let mut options = options();
        options.model = String::new();

        let err = run_session(&service, &registry, &options).await.unwrap_err();

        assert!(matches!(err, AgentsError::InvalidRequest { .. }));
        assert!(service.deleted_agents().is_empty());
    }
}
