//! Bearer token sources for the agents endpoint.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, TimeZone};
use serde::Deserialize;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::Mutex;

use crate::error::AgentsError;

/// Scope requested for project agent endpoints
pub const DEFAULT_SCOPE: &str = "https://management.azure.com/.default";

/// Environment variable read by [`DefaultCredential::from_env`]
pub const ACCESS_TOKEN_ENV: &str = "AGENTRUN_ACCESS_TOKEN";

/// Tokens are refreshed this many seconds before they expire
const EXPIRY_MARGIN_SECS: i64 = 120;

#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    /// Unix timestamp, when known
    pub expires_on: Option<i64>,
}

impl AccessToken {
    /// Safe to reuse from a cache. A token with unknown expiry never is.
    fn is_fresh(&self) -> bool {
        match self.expires_on {
            Some(expires_on) => unix_now() + EXPIRY_MARGIN_SECS < expires_on,
            None => false,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Source of bearer tokens
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AgentsError>;
}

/// A fixed token, e.g. from configuration
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Result<Self, AgentsError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AgentsError::authentication("Access token cannot be empty"));
        }
        Ok(Self { token })
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken, AgentsError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CliTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(default)]
    expires_on: Option<i64>,
    /// Local time, e.g. "2025-01-01 10:00:00.000000"; older az releases only send this
    #[serde(rename = "expiresOn", default)]
    expires_on_local: Option<String>,
}

impl CliTokenResponse {
    fn expires_on(&self) -> Option<i64> {
        self.expires_on.or_else(|| {
            let local = self.expires_on_local.as_deref()?;
            let naive = NaiveDateTime::parse_from_str(local.trim(), "%Y-%m-%d %H:%M:%S%.f").ok()?;
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|time| time.timestamp())
        })
    }
}

/// Tokens from the signed-in Azure CLI (`az login`), cached until shortly before expiry
#[derive(Default)]
pub struct AzureCliCredential {
    cached: Mutex<Option<AccessToken>>,
}

impl AzureCliCredential {
    pub fn new() -> Self {
        Self::default()
    }

    async fn request_token(&self, scope: &str) -> Result<AccessToken, AgentsError> {
        let resource = scope.trim_end_matches("/.default");
        tracing::debug!("Requesting access token from Azure CLI for {}", resource);

        let output = tokio::process::Command::new("az")
            .args([
                "account",
                "get-access-token",
                "--resource",
                resource,
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| AgentsError::credential(format!("Failed to run az: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgentsError::credential(format!(
                "az account get-access-token failed: {}",
                stderr.trim()
            )));
        }

        let response: CliTokenResponse = serde_json::from_slice(&output.stdout)?;
        let expires_on = response.expires_on();
        if expires_on.is_none() {
            tracing::warn!("Azure CLI token has no readable expiry; it will not be cached");
        }
        Ok(AccessToken {
            token: response.access_token,
            expires_on,
        })
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AgentsError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.clone());
        }

        let token = self.request_token(scope).await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

/// Static token when one is configured, Azure CLI otherwise
pub struct DefaultCredential {
    inner: Arc<dyn TokenCredential>,
}

impl DefaultCredential {
    pub fn new(access_token: Option<String>) -> Result<Self, AgentsError> {
        let inner: Arc<dyn TokenCredential> = match access_token {
            Some(token) => {
                tracing::debug!("Using configured access token");
                Arc::new(StaticTokenCredential::new(token)?)
            }
            None => {
                tracing::debug!("Using Azure CLI credential");
                Arc::new(AzureCliCredential::new())
            }
        };
        Ok(Self { inner })
    }

    /// Use `AGENTRUN_ACCESS_TOKEN` when set
    pub fn from_env() -> Result<Self, AgentsError> {
        let token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self::new(token)
    }
}

#[async_trait]
impl TokenCredential for DefaultCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AgentsError> {
        self.inner.get_token(scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credential() {
        let credential = StaticTokenCredential::new("token-123").unwrap();
        let token = credential.get_token(DEFAULT_SCOPE).await.unwrap();
        assert_eq!(token.token, "token-123");
    }

    #[test]
    fn test_static_credential_rejects_empty() {
        assert!(StaticTokenCredential::new("  ").is_err());
    }

    #[test]
    fn test_token_freshness() {
        let expired = AccessToken {
            token: "t".to_string(),
            expires_on: Some(unix_now() + 30),
        };
        assert!(!expired.is_fresh());

        let fresh = AccessToken {
            token: "t".to_string(),
            expires_on: Some(unix_now() + 3600),
        };
        assert!(fresh.is_fresh());

        let unknown = AccessToken {
            token: "t".to_string(),
            expires_on: None,
        };
        assert!(!unknown.is_fresh());
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken {
            token: "secret".to_string(),
            expires_on: None,
        };
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn test_cli_response_parsing() {
        let response: CliTokenResponse = serde_json::from_str(
            r#"{"accessToken":"abc","expiresOn":"2025-01-01 10:00:00.000000","expires_on":1735725600,"tokenType":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(response.access_token, "abc");
        assert_eq!(response.expires_on(), Some(1735725600));
    }

    #[test]
    fn test_cli_response_local_expiry_fallback() {
        let response: CliTokenResponse = serde_json::from_str(
            r#"{"accessToken":"abc","expiresOn":"2025-01-01 10:00:00.000000","tokenType":"Bearer"}"#,
        )
        .unwrap();
        let expected = Local
            .with_ymd_and_hms(2025, 1, 1, 10, 0, 0)
            .earliest()
            .map(|time| time.timestamp());
        assert!(expected.is_some());
        assert_eq!(response.expires_on(), expected);

        let response: CliTokenResponse =
            serde_json::from_str(r#"{"accessToken":"abc","expiresOn":"soon"}"#).unwrap();
        assert_eq!(response.expires_on(), None);
    }

    #[tokio::test]
    async fn test_default_credential_prefers_configured_token() {
        let credential = DefaultCredential::new(Some("configured".to_string())).unwrap();
        let token = credential.get_token(DEFAULT_SCOPE).await.unwrap();
        assert_eq!(token.token, "configured");
    }
}
