use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    client::AgentsService,
    connection::ConnectionString,
    credential::{TokenCredential, DEFAULT_SCOPE},
    error::AgentsError,
    types::{
        Agent, CreateAgentRequest, CreateMessageRequest, CreateRunRequest, DeletionStatus,
        Message, MessageList, Role, Run, SubmitToolOutputsRequest, Thread, ToolOutput,
    },
};

/// API version sent with every request unless overridden
pub const DEFAULT_API_VERSION: &str = "2024-12-01-preview";

const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";

/// Error body returned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorResponse {
    pub error: ServiceError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// HTTP client for a project's agents endpoint
pub struct AgentsClient {
    endpoint: String,
    api_version: String,
    scope: String,
    credential: Arc<dyn TokenCredential>,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for AgentsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentsClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl AgentsClient {
    /// Create a client for an explicit endpoint URL
    pub fn new(
        endpoint: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, AgentsError> {
        let endpoint = endpoint.into();
        if endpoint.is_empty() {
            return Err(AgentsError::invalid_request("Endpoint cannot be empty"));
        }

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 minute timeout
            .build()
            .map_err(|e| AgentsError::Network { source: e })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            credential,
            http_client,
        })
    }

    /// Create a client from `<HostName>;<SubscriptionId>;<ResourceGroup>;<ProjectName>`
    pub fn from_connection_string(
        connection_string: &str,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, AgentsError> {
        let connection = ConnectionString::parse(connection_string)?;
        Self::new(connection.endpoint(), credential)
    }

    /// Override the `api-version` query parameter
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Override the token scope
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn headers(&self) -> Result<HeaderMap, AgentsError> {
        let token = self.credential.get_token(&self.scope).await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.token))
                .map_err(|_| AgentsError::authentication("Invalid access token format"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let request_id = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(CLIENT_REQUEST_ID, value);
        }
        Ok(headers)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AgentsError> {
        let response = request
            .headers(self.headers().await?)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await
            .map_err(|e| AgentsError::Network { source: e })?;

        let status = response.status();

        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| AgentsError::Network { source: e })?;
            let body: T = serde_json::from_str(&text)?;
            Ok(body)
        } else {
            // Extract retry-after header before consuming the response
            let retry_after = if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                response
                    .headers()
                    .get("retry-after")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
            } else {
                None
            };

            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            Err(error_from_status(status, &error_text, retry_after))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AgentsError> {
        tracing::debug!("GET {}", path);
        self.send(self.http_client.get(self.url(path))).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AgentsError> {
        tracing::debug!("POST {}", path);
        self.send(self.http_client.post(self.url(path)).json(body))
            .await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, AgentsError> {
        tracing::debug!("DELETE {}", path);
        self.send(self.http_client.delete(self.url(path))).await
    }
}

/// Map a non-success response to an error, unwrapping `{"error": {...}}` bodies
fn error_from_status(
    status: reqwest::StatusCode,
    error_text: &str,
    retry_after: Option<u64>,
) -> AgentsError {
    let message = serde_json::from_str::<ServiceErrorResponse>(error_text)
        .map(|response| response.error.message)
        .unwrap_or_else(|_| error_text.to_string());

    match status {
        reqwest::StatusCode::BAD_REQUEST => AgentsError::invalid_request(message),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            AgentsError::authentication(message)
        }
        reqwest::StatusCode::NOT_FOUND => AgentsError::not_found(message),
        reqwest::StatusCode::PAYLOAD_TOO_LARGE => {
            AgentsError::invalid_request("Request too large")
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => AgentsError::rate_limit(message, retry_after),
        _ => AgentsError::api_error(status.as_u16(), message),
    }
}

#[async_trait]
impl AgentsService for AgentsClient {
    async fn create_agent(&self, request: CreateAgentRequest) -> Result<Agent, AgentsError> {
        self.post("/assistants", &request).await
    }

    async fn create_thread(&self) -> Result<Thread, AgentsError> {
        self.post("/threads", &serde_json::json!({})).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<Message, AgentsError> {
        let request = CreateMessageRequest {
            role,
            content: content.to_string(),
        };
        self.post(&format!("/threads/{thread_id}/messages"), &request)
            .await
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run, AgentsError> {
        let request = CreateRunRequest {
            assistant_id: agent_id.to_string(),
        };
        self.post(&format!("/threads/{thread_id}/runs"), &request)
            .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AgentsError> {
        self.get(&format!("/threads/{thread_id}/runs/{run_id}"))
            .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        tool_outputs: Vec<ToolOutput>,
    ) -> Result<Run, AgentsError> {
        let request = SubmitToolOutputsRequest { tool_outputs };
        self.post(
            &format!("/threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
            &request,
        )
        .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AgentsError> {
        self.post(
            &format!("/threads/{thread_id}/runs/{run_id}/cancel"),
            &serde_json::json!({}),
        )
        .await
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<DeletionStatus, AgentsError> {
        self.delete(&format!("/assistants/{agent_id}")).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, AgentsError> {
        self.get(&format!("/threads/{thread_id}/messages")).await
    }

    fn service_name(&self) -> &str {
        "azure-ai-projects"
    }
}
