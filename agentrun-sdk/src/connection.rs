use std::{fmt, str::FromStr};

use crate::error::AgentsError;

/// Project coordinates parsed from `<HostName>;<SubscriptionId>;<ResourceGroup>;<ProjectName>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub host: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub project_name: String,
}

impl ConnectionString {
    pub fn parse(value: &str) -> Result<Self, AgentsError> {
        let parts: Vec<&str> = value.trim().split(';').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(AgentsError::invalid_connection_string(format!(
                "expected 4 ';'-separated parts, found {}",
                parts.len()
            )));
        }

        let labels = ["host name", "subscription id", "resource group", "project name"];
        if let Some((label, _)) = labels.iter().zip(&parts).find(|(_, part)| part.is_empty()) {
            return Err(AgentsError::invalid_connection_string(format!(
                "{label} is empty"
            )));
        }

        // Host names are sometimes pasted with a scheme
        let host = parts[0]
            .trim_start_matches("https://")
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host,
            subscription_id: parts[1].to_string(),
            resource_group: parts[2].to_string(),
            project_name: parts[3].to_string(),
        })
    }

    /// Root URL of the project's agents endpoint
    pub fn endpoint(&self) -> String {
        format!(
            "https://{}/agents/v1.0/subscriptions/{}/resourceGroups/{}/providers/Microsoft.MachineLearningServices/workspaces/{}",
            self.host, self.subscription_id, self.resource_group, self.project_name
        )
    }
}

impl FromStr for ConnectionString {
    type Err = AgentsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            self.host, self.subscription_id, self.resource_group, self.project_name
        )
    }
}
