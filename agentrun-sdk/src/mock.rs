//! In-memory agent service.
//!
//! Plays back a scripted sequence of run states from `get_run` and records
//! everything the caller sends, so the dispatch loop can be exercised without a
//! network. Also backs the CLI's dry-run mode.

use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use crate::{
    client::AgentsService,
    error::AgentsError,
    types::{
        Agent, CreateAgentRequest, DeletionStatus, Message, MessageList, RequiredAction,
        RequiredToolCall, Role, Run, RunError, RunStatus, Thread, ToolOutput,
    },
};

/// One state change applied to the current run by a `get_run` call
#[derive(Debug, Clone)]
pub enum RunStep {
    Status(RunStatus),
    ToolCalls(Vec<RequiredToolCall>),
    /// `requires_action` with an arbitrary action
    Action(RequiredAction),
    Failed(RunError),
}

/// Tool outputs received by `submit_tool_outputs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub thread_id: String,
    pub run_id: String,
    pub tool_outputs: Vec<ToolOutput>,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u32,
    agents: Vec<Agent>,
    threads: Vec<Thread>,
    messages: Vec<Message>,
    run: Option<Run>,
    steps: VecDeque<RunStep>,
    initial_status: Option<RunStatus>,
    reply: Option<String>,
    get_run_calls: u32,
    submissions: Vec<Submission>,
    cancelled_runs: Vec<String>,
    deleted_agents: Vec<String>,
}

impl MockState {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }

    fn run_mut(&mut self, thread_id: &str, run_id: &str) -> Result<&mut Run, AgentsError> {
        self.run
            .as_mut()
            .filter(|run| run.id == run_id && run.thread_id == thread_id)
            .ok_or_else(|| AgentsError::not_found(format!("No run found with id '{run_id}'")))
    }
}

/// Scripted [`AgentsService`] kept entirely in memory
#[derive(Debug, Default)]
pub struct MockAgentsService {
    state: Mutex<MockState>,
}

impl MockAgentsService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps applied, one per `get_run`, to the run created by `create_run`.
    /// Once exhausted the run is returned unchanged.
    pub fn with_steps(self, steps: impl IntoIterator<Item = RunStep>) -> Self {
        self.state().steps.extend(steps);
        self
    }

    /// Status of the run returned by `create_run` (default `queued`)
    pub fn with_initial_run_status(self, status: RunStatus) -> Self {
        self.state().initial_status = Some(status);
        self
    }

    /// Assistant message appended to the thread when the run completes
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.state().reply = Some(reply.into());
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_run_calls(&self) -> u32 {
        self.state().get_run_calls
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state().submissions.clone()
    }

    pub fn cancelled_runs(&self) -> Vec<String> {
        self.state().cancelled_runs.clone()
    }

    pub fn deleted_agents(&self) -> Vec<String> {
        self.state().deleted_agents.clone()
    }

    pub fn agents(&self) -> Vec<Agent> {
        self.state().agents.clone()
    }
}

#[async_trait]
impl AgentsService for MockAgentsService {
    async fn create_agent(&self, request: CreateAgentRequest) -> Result<Agent, AgentsError> {
        let mut state = self.state();
        let agent = Agent {
            id: state.id("asst"),
            name: request.name,
            model: request.model,
            instructions: request.instructions,
            tools: request.tools,
            created_at: None,
        };
        state.agents.push(agent.clone());
        Ok(agent)
    }

    async fn create_thread(&self) -> Result<Thread, AgentsError> {
        let mut state = self.state();
        let thread = Thread {
            id: state.id("thread"),
            created_at: None,
        };
        state.threads.push(thread.clone());
        Ok(thread)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message, AgentsError> {
        let mut state = self.state();
        if !state.threads.iter().any(|t| t.id == thread_id) {
            return Err(AgentsError::not_found(format!(
                "No thread found with id '{thread_id}'"
            )));
        }
        let message = Message::text(state.id("msg"), thread_id, role, content);
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run, AgentsError> {
        let mut state = self.state();
        let status = state.initial_status.unwrap_or(RunStatus::Queued);
        let run = Run::new(state.id("run"), thread_id, agent_id, status);
        state.run = Some(run.clone());
        Ok(run)
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AgentsError> {
        let mut state = self.state();
        state.get_run_calls += 1;
        let step = state.steps.pop_front();
        let reply = state.reply.clone();
        let next_id = step
            .as_ref()
            .filter(|s| matches!(s, RunStep::Status(RunStatus::Completed)))
            .and(reply.as_ref())
            .map(|_| state.id("msg"));

        let run = state.run_mut(thread_id, run_id)?;
        match step {
            Some(RunStep::Status(status)) => {
                run.status = status;
                run.required_action = None;
            }
            Some(RunStep::ToolCalls(calls)) => {
                *run = run.clone().with_tool_calls(calls);
            }
            Some(RunStep::Action(action)) => {
                run.status = RunStatus::RequiresAction;
                run.required_action = Some(action);
            }
            Some(RunStep::Failed(error)) => {
                run.status = RunStatus::Failed;
                run.required_action = None;
                run.last_error = Some(error);
            }
            None => {}
        }
        let run = run.clone();

        if let (Some(id), Some(reply)) = (next_id, reply) {
            let mut message = Message::text(id, thread_id, Role::Assistant, reply);
            message.assistant_id = Some(run.assistant_id.clone());
            message.run_id = Some(run.id.clone());
            state.messages.push(message);
        }
        Ok(run)
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        tool_outputs: Vec<ToolOutput>,
    ) -> Result<Run, AgentsError> {
        let mut state = self.state();
        let run = state.run_mut(thread_id, run_id)?;
        if run.status != RunStatus::RequiresAction {
            return Err(AgentsError::invalid_request(format!(
                "Run {run_id} is {} and does not accept tool outputs",
                run.status
            )));
        }
        run.status = RunStatus::InProgress;
        run.required_action = None;
        let run = run.clone();

        state.submissions.push(Submission {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
            tool_outputs,
        });
        Ok(run)
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AgentsError> {
        let mut state = self.state();
        let run = state.run_mut(thread_id, run_id)?;
        run.status = RunStatus::Cancelling;
        run.required_action = None;
        let run = run.clone();
        state.cancelled_runs.push(run_id.to_string());
        Ok(run)
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<DeletionStatus, AgentsError> {
        let mut state = self.state();
        let before = state.agents.len();
        state.agents.retain(|a| a.id != agent_id);
        let deleted = state.agents.len() < before;
        if deleted {
            state.deleted_agents.push(agent_id.to_string());
        }
        Ok(DeletionStatus {
            id: agent_id.to_string(),
            deleted,
        })
    }

    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, AgentsError> {
        let state = self.state();
        // Newest first, like the service's default ordering
        let data: Vec<Message> = state
            .messages
            .iter()
            .rev()
            .filter(|m| m.thread_id == thread_id)
            .cloned()
            .collect();
        Ok(MessageList {
            first_id: data.first().map(|m| m.id.clone()),
            last_id: data.last().map(|m| m.id.clone()),
            has_more: false,
            data,
        })
    }

    fn service_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_run_plays_back_steps() {
        let service = MockAgentsService::new().with_steps([
            RunStep::Status(RunStatus::InProgress),
            RunStep::ToolCalls(vec![RequiredToolCall::function("t1", "f", "{}")]),
        ]);
        let thread = service.create_thread().await.unwrap();
        let run = service.create_run(&thread.id, "asst_x").await.unwrap();
        assert_eq!(run.status, RunStatus::Queued);

        let run = service.get_run(&thread.id, &run.id).await.unwrap();
        assert_eq!(run.status, RunStatus::InProgress);

        let run = service.get_run(&thread.id, &run.id).await.unwrap();
        assert_eq!(run.required_tool_calls().unwrap().len(), 1);

        // Script exhausted: state is unchanged
        let run = service.get_run(&thread.id, &run.id).await.unwrap();
        assert_eq!(run.status, RunStatus::RequiresAction);
        assert_eq!(service.get_run_calls(), 3);
    }

    #[tokio::test]
    async fn test_submit_requires_pending_action() {
        let service = MockAgentsService::new();
        let thread = service.create_thread().await.unwrap();
        let run = service.create_run(&thread.id, "asst_x").await.unwrap();

        let err = service
            .submit_tool_outputs(&thread.id, &run.id, vec![ToolOutput::new("t1", "out")])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentsError::InvalidRequest { .. }));
        assert!(service.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_completion_appends_reply() {
        let service = MockAgentsService::new()
            .with_steps([RunStep::Status(RunStatus::Completed)])
            .with_reply("All done");
        let thread = service.create_thread().await.unwrap();
        service
            .create_message(&thread.id, Role::User, "Hi")
            .await
            .unwrap();
        let run = service.create_run(&thread.id, "asst_x").await.unwrap();
        service.get_run(&thread.id, &run.id).await.unwrap();

        let messages = service.list_messages(&thread.id).await.unwrap();
        assert_eq!(messages.data.len(), 2);
        assert_eq!(messages.data[0].role, Role::Assistant);
        assert_eq!(messages.data[0].text_content(), "All done");
        assert_eq!(messages.data[1].text_content(), "Hi");
    }

    #[tokio::test]
    async fn test_unknown_run_is_not_found() {
        let service = MockAgentsService::new();
        let err = service.get_run("thread_1", "run_9").await.unwrap_err();
        assert!(matches!(err, AgentsError::NotFound { .. }));
    }
}
