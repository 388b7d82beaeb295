use thiserror::Error;

/// Error types for agent service operations
#[derive(Error, Debug)]
pub enum AgentsError {
    /// Authentication failed (HTTP 401/403)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Invalid request parameters (HTTP 400/413)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Referenced agent, thread or run does not exist (HTTP 404)
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// API error with status code (HTTP 4xx/5xx except above)
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Network or connection error
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// JSON parsing or serialization error
    #[error("Parse error: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    /// Connection string is not `<host>;<subscription>;<resource group>;<project>`
    #[error("Invalid connection string: {message}")]
    InvalidConnectionString { message: String },

    /// Could not obtain an access token
    #[error("Credential error: {message}")]
    Credential { message: String },

    /// The run was still pollable after the configured number of polls
    #[error("Run {run_id} still {status} after {polls} polls")]
    PollLimitExceeded {
        run_id: String,
        status: String,
        polls: u32,
    },

    /// Generic error for unexpected cases
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AgentsError {
    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an API error
    pub fn api_error(status: u16, message: String) -> Self {
        Self::Api { status, message }
    }

    /// Create an invalid connection string error
    pub fn invalid_connection_string<S: Into<String>>(message: S) -> Self {
        Self::InvalidConnectionString {
            message: message.into(),
        }
    }

    /// Create a credential error
    pub fn credential<S: Into<String>>(message: S) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Errors raised while executing a local function on behalf of a run
#[derive(Error, Debug)]
pub enum ToolError {
    /// No function with this name is registered
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    /// Arguments were not valid JSON or did not match the parameter type
    #[error("Failed to parse arguments for {function}: {source}")]
    InvalidArguments {
        function: String,
        source: serde_json::Error,
    },

    /// The function ran and reported a failure
    #[error("{function} failed: {message}")]
    Execution { function: String, message: String },
}

impl ToolError {
    /// Create an execution error
    pub fn execution(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            function: function.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_limit_message() {
        let err = AgentsError::PollLimitExceeded {
            run_id: "run_1".to_string(),
            status: "in_progress".to_string(),
            polls: 3,
        };
        assert_eq!(err.to_string(), "Run run_1 still in_progress after 3 polls");
    }

    #[test]
    fn test_tool_error_messages() {
        let err = ToolError::UnknownFunction {
            name: "get_stock".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown function: get_stock");

        let err = ToolError::execution("send_email", "smtp unavailable");
        assert_eq!(err.to_string(), "send_email failed: smtp unavailable");
    }
}
