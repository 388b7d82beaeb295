//! Poll-and-dispatch loop driving a run to a terminal status.
//!
//! Each iteration sleeps for the poll interval, fetches the run and, when the run
//! requires tool outputs, executes the requested functions one at a time in the
//! order received and submits whatever succeeded. A failing function only loses
//! its own output. An empty tool-call list cancels the run.

use std::time::Duration;

use crate::{
    client::AgentsService,
    error::AgentsError,
    tools::FunctionRegistry,
    types::{RequiredToolCall, Run, RunStatus, ToolOutput},
};

/// Delay between two polls of the same run
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How a dispatch loop ended
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Last run state seen
    pub run: Run,
    /// Number of get-run calls
    pub polls: u32,
    /// Number of requires-action iterations that executed tool calls
    pub dispatches: u32,
    /// Total tool outputs submitted
    pub submitted_outputs: usize,
    /// Whether the loop cancelled the run itself
    pub cancelled: bool,
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        self.run.status
    }
}

/// Drives one run to completion against a service and a function registry
pub struct RunDispatcher<'a, S: AgentsService + ?Sized> {
    service: &'a S,
    registry: &'a FunctionRegistry,
    poll_interval: Duration,
    max_polls: Option<u32>,
}

impl<'a, S: AgentsService + ?Sized> RunDispatcher<'a, S> {
    pub fn new(service: &'a S, registry: &'a FunctionRegistry) -> Self {
        Self {
            service,
            registry,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Give up with [`AgentsError::PollLimitExceeded`] after this many polls.
    /// Without a limit the loop waits for as long as the service keeps the run pollable.
    pub fn with_max_polls(mut self, max_polls: Option<u32>) -> Self {
        self.max_polls = max_polls;
        self
    }

    /// Poll `run` until its status leaves {queued, in_progress, requires_action}
    pub async fn run_to_completion(&self, run: Run) -> Result<RunOutcome, AgentsError> {
        let mut run = run;
        let mut polls = 0u32;
        let mut dispatches = 0u32;
        let mut submitted_outputs = 0usize;
        let mut cancelled = false;

        while run.status.is_pollable() {
            if let Some(max_polls) = self.max_polls {
                if polls >= max_polls {
                    return Err(AgentsError::PollLimitExceeded {
                        run_id: run.id,
                        status: run.status.to_string(),
                        polls,
                    });
                }
            }

            tokio::time::sleep(self.poll_interval).await;
            run = self.service.get_run(&run.thread_id, &run.id).await?;
            polls += 1;

            if let Some(tool_calls) = run.required_tool_calls().map(<[_]>::to_vec) {
                if tool_calls.is_empty() {
                    tracing::warn!("No tool calls provided - cancelling run {}", run.id);
                    run = self.service.cancel_run(&run.thread_id, &run.id).await?;
                    cancelled = true;
                    break;
                }

                dispatches += 1;
                let tool_outputs = dispatch_tool_calls(self.registry, &tool_calls).await;
                tracing::info!("Tool outputs: {:?}", tool_outputs);

                if !tool_outputs.is_empty() {
                    submitted_outputs += tool_outputs.len();
                    self.service
                        .submit_tool_outputs(&run.thread_id, &run.id, tool_outputs)
                        .await?;
                }
            }

            tracing::info!("Current run status: {}", run.status);
        }

        match &run.last_error {
            Some(error) => tracing::warn!(
                "Run {} ended with status {}: {} ({})",
                run.id,
                run.status,
                error.message,
                error.code
            ),
            None => tracing::info!("Run completed with status: {}", run.status),
        }

        Ok(RunOutcome {
            run,
            polls,
            dispatches,
            submitted_outputs,
            cancelled,
        })
    }
}

/// Execute function tool calls in order, returning one output per successful call.
///
/// Failed calls are logged and left out; non-function tool calls are skipped.
pub async fn dispatch_tool_calls(
    registry: &FunctionRegistry,
    tool_calls: &[RequiredToolCall],
) -> Vec<ToolOutput> {
    let mut tool_outputs = Vec::new();

    for tool_call in tool_calls {
        let Some(function) = tool_call.as_function() else {
            tracing::debug!(
                "Skipping tool_call {} of kind {:?}",
                tool_call.id,
                tool_call.kind
            );
            continue;
        };

        tracing::debug!("Executing {} for tool_call {}", function.name, tool_call.id);
        match registry.execute(function).await {
            Ok(output) => tool_outputs.push(ToolOutput::new(&tool_call.id, output)),
            Err(e) => tracing::error!("Error executing tool_call {}: {}", tool_call.id, e),
        }
    }

    tool_outputs
}
