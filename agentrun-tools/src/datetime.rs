use std::fmt::Write;

use agentrun_sdk::{tools::TypedFunction, ToolError};
use async_trait::async_trait;
use chrono::{
    format::{Item, StrftimeItems},
    DateTime, Local, TimeZone,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FetchCurrentDatetimeRequest {
    /// Format string for the datetime (strftime syntax). Defaults to '%Y-%m-%d %H:%M:%S'.
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchCurrentDatetimeResponse {
    pub current_time: String,
}

/// Render `time` with a strftime pattern, rejecting invalid patterns instead of panicking
pub fn format_datetime<Tz>(time: &DateTime<Tz>, pattern: &str) -> Result<String, String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid format string '{pattern}'"));
    }

    let mut rendered = String::new();
    write!(rendered, "{}", time.format_with_items(items.into_iter()))
        .map_err(|_| format!("cannot render format string '{pattern}'"))?;
    Ok(rendered)
}

pub struct FetchCurrentDatetime;

#[async_trait]
impl TypedFunction for FetchCurrentDatetime {
    type Args = FetchCurrentDatetimeRequest;

    fn name(&self) -> &str {
        "fetch_current_datetime"
    }

    fn description(&self) -> &str {
        "Get the current time as a JSON string, optionally formatted."
    }

    async fn invoke(&self, args: FetchCurrentDatetimeRequest) -> Result<String, ToolError> {
        let pattern = args
            .format
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FORMAT);

        let current_time = format_datetime(&Local::now(), pattern)
            .map_err(|message| ToolError::execution(self.name(), message))?;

        serde_json::to_string(&FetchCurrentDatetimeResponse { current_time })
            .map_err(|e| ToolError::execution(self.name(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 5, 9, 30, 15).unwrap()
    }

    #[test]
    fn test_format_default_pattern() {
        assert_eq!(
            format_datetime(&fixed(), DEFAULT_FORMAT).unwrap(),
            "2024-11-05 09:30:15"
        );
    }

    #[test]
    fn test_format_custom_pattern() {
        assert_eq!(format_datetime(&fixed(), "%d/%m/%Y").unwrap(), "05/11/2024");
    }

    #[test]
    fn test_format_rejects_invalid_pattern() {
        assert!(format_datetime(&fixed(), "%Q").is_err());
    }

    #[tokio::test]
    async fn test_invoke_uses_default_format() {
        let output = FetchCurrentDatetime
            .invoke(FetchCurrentDatetimeRequest::default())
            .await
            .unwrap();
        let response: FetchCurrentDatetimeResponse = serde_json::from_str(&output).unwrap();
        // "YYYY-MM-DD HH:MM:SS"
        assert_eq!(response.current_time.len(), 19);
    }

    #[tokio::test]
    async fn test_invoke_invalid_format_is_execution_error() {
        let err = FetchCurrentDatetime
            .invoke(FetchCurrentDatetimeRequest {
                format: Some("%Q".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
    }
}
