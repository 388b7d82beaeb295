use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONNECTION_STRING_ENV: &str = "PROJECT_CONNECTION_STRING";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AGENT_NAME: &str = "my-agent";
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful agent";
pub const DEFAULT_MESSAGE: &str =
    "Hello, send an email with the datetime and weather information in New York?";

const DEFAULT_CONFIG: &str = r#"# agentrun configuration
# Environment variables override this file, e.g. AGENTRUN_AGENT__MODEL=gpt-4o.
# PROJECT_CONNECTION_STRING overrides project.connection_string.

[project]
# connection_string = "<HostName>;<SubscriptionId>;<ResourceGroup>;<ProjectName>"
api_version = "2024-12-01-preview"

[agent]
model = "gpt-4o-mini"
name = "my-agent"
instructions = "You are a helpful agent"

[run]
poll_interval_ms = 1000
# max_polls = 600

[auth]
# Leave unset to use `az account get-access-token`
# access_token = "..."
"#;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub project: ProjectConfig,
    pub agent: AgentConfig,
    pub run: RunConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    #[serde(default)]
    pub connection_string: Option<String>,
    pub api_version: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub model: String,
    pub name: String,
    pub instructions: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub max_polls: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project: ProjectConfig {
                connection_string: None,
                api_version: agentrun_sdk::agents::DEFAULT_API_VERSION.to_string(),
            },
            agent: AgentConfig {
                model: DEFAULT_MODEL.to_string(),
                name: DEFAULT_AGENT_NAME.to_string(),
                instructions: DEFAULT_INSTRUCTIONS.to_string(),
            },
            run: RunConfig {
                poll_interval_ms: 1000,
                max_polls: None,
            },
            auth: AuthConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location (written with defaults
    /// on first use), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = get_config_path();
                write_default_config(&path)?;
                path
            }
        };

        let config = Self::build(&config_path, true)?;
        Ok((config, config_path))
    }

    /// Load a single file with no environment overrides
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(path, false)
    }

    fn build(path: &Path, with_env: bool) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        let mut builder = Config::builder()
            .set_default("project.api_version", defaults.project.api_version)?
            .set_default("agent.model", defaults.agent.model)?
            .set_default("agent.name", defaults.agent.name)?
            .set_default("agent.instructions", defaults.agent.instructions)?
            .set_default("run.poll_interval_ms", defaults.run.poll_interval_ms as i64)?
            .add_source(File::from(path.to_path_buf()).format(FileFormat::Toml));

        if with_env {
            builder = builder
                .add_source(
                    Environment::with_prefix("AGENTRUN")
                        .prefix_separator("_")
                        .separator("__"),
                )
                .set_override_option(
                    "project.connection_string",
                    std::env::var(CONNECTION_STRING_ENV)
                        .ok()
                        .filter(|v| !v.trim().is_empty()),
                )?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.model.trim().is_empty() {
            return Err(ConfigError::Message("agent.model cannot be empty".to_string()));
        }
        if self.run.max_polls == Some(0) {
            return Err(ConfigError::Message(
                "run.max_polls must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The project connection string, or a config error naming where to set it
    pub fn connection_string(&self) -> Result<&str, ConfigError> {
        self.project
            .connection_string
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "No connection string configured; set {CONNECTION_STRING_ENV} or project.connection_string"
                ))
            })
    }
}

fn write_default_config(config_path: &Path) -> Result<(), ConfigError> {
    if config_path.exists() {
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::Message(format!("Failed to create config directory: {e}"))
        })?;
    }

    std::fs::write(config_path, DEFAULT_CONFIG)
        .map_err(|e| ConfigError::Message(format!("Failed to write default config: {e}")))?;
    tracing::info!("Wrote default configuration to {}", config_path.display());
    Ok(())
}

pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agentrun")
        .join("agentrun.toml")
}
