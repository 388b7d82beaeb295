use std::fmt;

use agentrun_sdk::AgentsError;

/// Main error type for the agentrun CLI
#[derive(Debug)]
pub enum CliError {
    /// Configuration-related errors
    Config(String),
    /// Failures talking to the agent service
    Service(AgentsError),
    /// The run did not finish successfully
    Dispatch(String),
    /// File I/O errors
    Io(std::io::Error),
    /// Generic errors from anyhow
    Other(anyhow::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {msg}"),
            CliError::Service(err) => write!(f, "Service error: {err}"),
            CliError::Dispatch(msg) => write!(f, "Run error: {msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Other(err) => write!(f, "Error: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Service(err) => Some(err),
            CliError::Io(err) => Some(err),
            CliError::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl CliError {
    /// Get the exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Service(_) => 3,
            CliError::Dispatch(_) => 4,
            CliError::Io(_) => 5,
            CliError::Other(_) => 1,
        }
    }
}

impl From<AgentsError> for CliError {
    fn from(err: AgentsError) -> Self {
        match err {
            AgentsError::InvalidConnectionString { .. } => CliError::Config(err.to_string()),
            AgentsError::PollLimitExceeded { .. } => CliError::Dispatch(err.to_string()),
            other => CliError::Service(other),
        }
    }
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Other(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agents_error_mapping() {
        let err: CliError = AgentsError::invalid_connection_string("bad").into();
        assert_eq!(err.exit_code(), 2);

        let err: CliError = AgentsError::PollLimitExceeded {
            run_id: "run_1".to_string(),
            status: "queued".to_string(),
            polls: 10,
        }
        .into();
        assert_eq!(err.exit_code(), 4);

        let err: CliError = AgentsError::authentication("expired token").into();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.to_string(),
            "Service error: Authentication failed: expired token"
        );
    }
}
