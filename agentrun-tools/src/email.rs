use agentrun_sdk::{tools::TypedFunction, ToolError};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SendEmailRequest {
    /// Email address of the recipient
    pub recipient: String,
    /// Subject of the email
    pub subject: String,
    /// Body content of the email
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub message: String,
}

/// Simulated email delivery: the message is only logged
pub struct SendEmail;

#[async_trait]
impl TypedFunction for SendEmail {
    type Args = SendEmailRequest;

    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Sends an email with the specified subject and body to the recipient."
    }

    async fn invoke(&self, args: SendEmailRequest) -> Result<String, ToolError> {
        if args.recipient.trim().is_empty() {
            return Err(ToolError::execution(self.name(), "recipient is empty"));
        }

        tracing::info!(
            recipient = %args.recipient,
            subject = %args.subject,
            "Sending email"
        );
        tracing::debug!("Email body: {}", args.body);

        let response = SendEmailResponse {
            message: format!("Email successfully sent to {}.", args.recipient),
        };
        serde_json::to_string(&response).map_err(|e| ToolError::execution(self.name(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(recipient: &str) -> SendEmailRequest {
        SendEmailRequest {
            recipient: recipient.to_string(),
            subject: "Weather".to_string(),
            body: "Sunny, 25°C".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_email_confirms_recipient() {
        let output = SendEmail.invoke(request("jane@example.com")).await.unwrap();
        let response: SendEmailResponse = serde_json::from_str(&output).unwrap();
        assert_eq!(response.message, "Email successfully sent to jane@example.com.");
    }

    #[tokio::test]
    async fn test_send_email_rejects_empty_recipient() {
        let err = SendEmail.invoke(request("  ")).await.unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
    }
}
