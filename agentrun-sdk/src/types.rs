use serde::{Deserialize, Serialize};

use crate::tools::FunctionDefinition;

/// Role of a message author in a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message posted by the caller
    User,
    /// Message produced by the agent
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Status of a run, advanced only by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the dispatcher keeps polling a run in this status.
    ///
    /// Only `queued`, `in_progress` and `requires_action` are pollable; every
    /// other value (including `cancelling` and unknown statuses) ends the loop.
    pub fn is_pollable(&self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::RequiresAction
        )
    }

    /// Inverse of [`RunStatus::is_pollable`]
    pub fn is_terminal(&self) -> bool {
        !self.is_pollable()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool declared on an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDefinition {
    /// A callable local function
    Function { function: FunctionDefinition },
    /// Built-in service tools (code interpreter, file search, ...)
    #[serde(other)]
    Other,
}

impl From<FunctionDefinition> for ToolDefinition {
    fn from(function: FunctionDefinition) -> Self {
        ToolDefinition::Function { function }
    }
}

/// Agent (assistant) as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub model: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Body of a create-agent request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAgentRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// Conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Body of a create-message request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub role: Role,
    pub content: String,
}

/// Text payload of a message content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageText {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<serde_json::Value>,
}

/// Content block of a thread message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: MessageText },
    /// Image files and other non-text blocks
    #[serde(other)]
    Other,
}

/// Message appended to a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl Message {
    /// Create a text message
    pub fn text(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        role: Role,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            role,
            content: vec![MessageContent::Text {
                text: MessageText {
                    value: text.into(),
                    annotations: Vec::new(),
                },
            }],
            assistant_id: None,
            run_id: None,
            created_at: None,
        }
    }

    /// All text blocks joined with newlines
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                MessageContent::Text { text } => Some(text.value.as_str()),
                MessageContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Page of messages returned by list-messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageList {
    pub data: Vec<Message>,
    #[serde(default)]
    pub first_id: Option<String>,
    #[serde(default)]
    pub last_id: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Body of a create-run request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,
}

/// Error reported on a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub code: String,
    pub message: String,
}

/// Kind of a tool call requested by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallKind {
    Function,
    #[serde(other)]
    Other,
}

/// Function name and JSON-encoded arguments of a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Tool call the run is waiting on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ToolCallKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCall>,
}

impl RequiredToolCall {
    /// Create a function tool call
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ToolCallKind::Function,
            function: Some(FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            }),
        }
    }

    /// The function payload, if this is a function call
    pub fn as_function(&self) -> Option<&FunctionCall> {
        match self.kind {
            ToolCallKind::Function => self.function.as_ref(),
            ToolCallKind::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitToolOutputsDetails {
    #[serde(default)]
    pub tool_calls: Vec<RequiredToolCall>,
}

/// Action a run needs from the caller before it can continue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequiredAction {
    SubmitToolOutputs {
        submit_tool_outputs: SubmitToolOutputsDetails,
    },
    #[serde(other)]
    Other,
}

/// One execution attempt of an agent against a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub assistant_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub last_error: Option<RunError>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl Run {
    pub fn new(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        assistant_id: impl Into<String>,
        status: RunStatus,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            assistant_id: assistant_id.into(),
            status,
            required_action: None,
            last_error: None,
            model: None,
            created_at: None,
        }
    }

    /// Put the run into `requires_action` with the given tool calls
    pub fn with_tool_calls(mut self, tool_calls: Vec<RequiredToolCall>) -> Self {
        self.status = RunStatus::RequiresAction;
        self.required_action = Some(RequiredAction::SubmitToolOutputs {
            submit_tool_outputs: SubmitToolOutputsDetails { tool_calls },
        });
        self
    }

    /// Tool calls to execute, when the run requires a submit-tool-outputs action
    pub fn required_tool_calls(&self) -> Option<&[RequiredToolCall]> {
        if self.status != RunStatus::RequiresAction {
            return None;
        }
        match self.required_action.as_ref()? {
            RequiredAction::SubmitToolOutputs {
                submit_tool_outputs,
            } => Some(&submit_tool_outputs.tool_calls),
            RequiredAction::Other => None,
        }
    }
}

/// Output of one tool call, submitted back to the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

impl ToolOutput {
    pub fn new(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            output: output.into(),
        }
    }
}

/// Body of a submit-tool-outputs request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitToolOutputsRequest {
    pub tool_outputs: Vec<ToolOutput>,
}

/// Response to a delete request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionStatus {
    pub id: String,
    pub deleted: bool,
}
