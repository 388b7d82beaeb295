use std::{path::Path, sync::Arc, time::Duration};

use agentrun_sdk::{
    agents::AgentsClient,
    client::AgentsService,
    credential::{DefaultCredential, ACCESS_TOKEN_ENV},
    dispatcher::RunOutcome,
    mock::{MockAgentsService, RunStep},
    types::{RequiredToolCall, RunStatus},
};
use tracing::{debug, info};

use crate::{
    cli::RunArgs,
    config::{AppConfig, DEFAULT_MESSAGE},
    error::CliError,
    session::{run_session, SessionOptions, SessionReport},
};

const DRY_RUN_REPLY: &str =
    "I sent an email to the team with the current date, time and New York weather.";

pub async fn run_agent(config_path: Option<&Path>, args: &RunArgs) -> Result<(), CliError> {
    let (config, path) = AppConfig::load(config_path)?;
    debug!("Loaded configuration from {}", path.display());

    let options = session_options(&config, args);
    let registry = agentrun_tools::user_functions();

    let service: Box<dyn AgentsService> = if args.dry_run {
        info!("Dry run: using the in-memory agent service");
        Box::new(dry_run_service())
    } else {
        Box::new(connect(&config)?)
    };
    info!("Using agent service: {}", service.service_name());

    let report = run_session(service.as_ref(), &registry, &options).await?;
    print_report(&report);
    ensure_completed(&report.outcome)
}

/// Merge command-line flags over the loaded configuration
pub fn session_options(config: &AppConfig, args: &RunArgs) -> SessionOptions {
    SessionOptions {
        model: args.model.clone().unwrap_or_else(|| config.agent.model.clone()),
        name: args.name.clone().unwrap_or_else(|| config.agent.name.clone()),
        instructions: args
            .instructions
            .clone()
            .unwrap_or_else(|| config.agent.instructions.clone()),
        message: args
            .message
            .clone()
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        poll_interval: Duration::from_millis(
            args.poll_interval_ms.unwrap_or(config.run.poll_interval_ms),
        ),
        max_polls: args.max_polls.or(config.run.max_polls),
    }
}

fn connect(config: &AppConfig) -> Result<AgentsClient, CliError> {
    let connection_string = config.connection_string()?;

    let access_token = config.auth.access_token.clone().or_else(|| {
        std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
    });
    let credential = DefaultCredential::new(access_token)?;

    let client = AgentsClient::from_connection_string(connection_string, Arc::new(credential))?
        .with_api_version(config.project.api_version.as_str());
    info!("Connecting to {}", client.endpoint());
    Ok(client)
}

/// In-memory service whose run asks for every example function once
pub fn dry_run_service() -> MockAgentsService {
    MockAgentsService::new()
        .with_steps([
            RunStep::Status(RunStatus::InProgress),
            RunStep::ToolCalls(vec![
                RequiredToolCall::function("call_datetime", "fetch_current_datetime", "{}"),
                RequiredToolCall::function(
                    "call_weather",
                    "fetch_weather",
                    r#"{"location":"New York"}"#,
                ),
            ]),
            RunStep::Status(RunStatus::InProgress),
            RunStep::ToolCalls(vec![RequiredToolCall::function(
                "call_email",
                "send_email",
                r#"{"recipient":"team@example.com","subject":"New York update","body":"Sunny, 25°C"}"#,
            )]),
            RunStep::Status(RunStatus::Completed),
        ])
        .with_reply(DRY_RUN_REPLY)
}

fn print_report(report: &SessionReport) {
    println!("Run status: {}", report.outcome.status());
    if let Some(error) = &report.outcome.run.last_error {
        println!("Run failed: {} ({})", error.message, error.code);
    }
    println!();

    // Oldest first reads like a conversation
    for message in report.messages.iter().rev() {
        println!("{}: {}", message.role, message.text_content());
    }
}

fn ensure_completed(outcome: &RunOutcome) -> Result<(), CliError> {
    match outcome.status() {
        RunStatus::Completed => Ok(()),
        status => Err(CliError::Dispatch(format!(
            "Run {} ended with status {}",
            outcome.run.id, status
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrun_sdk::types::Run;

    #[test]
    fn test_flags_override_config() {
        let mut config = AppConfig::default();
        config.run.max_polls = Some(50);

        let args = RunArgs {
            model: Some("gpt-4o".to_string()),
            poll_interval_ms: Some(10),
            ..Default::default()
        };
        let options = session_options(&config, &args);

        assert_eq!(options.model, "gpt-4o");
        assert_eq!(options.name, config.agent.name);
        assert_eq!(options.message, DEFAULT_MESSAGE);
        assert_eq!(options.poll_interval, Duration::from_millis(10));
        assert_eq!(options.max_polls, Some(50));
    }

    #[test]
    fn test_connect_requires_connection_string() {
        let err = connect(&AppConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_calls_every_function() {
        let service = dry_run_service();
        let registry = agentrun_tools::user_functions();
        let args = RunArgs {
            poll_interval_ms: Some(0),
            ..Default::default()
        };
        let options = session_options(&AppConfig::default(), &args);

        let report = run_session(&service, &registry, &options).await.unwrap();

        assert!(ensure_completed(&report.outcome).is_ok());
        assert_eq!(report.outcome.dispatches, 2);
        assert_eq!(report.outcome.submitted_outputs, 3);

        let submissions = service.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(
            submissions[1].tool_outputs[0].output,
            r#"{"message":"Email successfully sent to team@example.com."}"#
        );
        assert_eq!(report.messages[0].text_content(), DRY_RUN_REPLY);
    }

    #[test]
    fn test_unfinished_run_is_dispatch_error() {
        let outcome = RunOutcome {
            run: Run::new("run_1", "thread_1", "asst_1", RunStatus::Cancelling),
            polls: 1,
            dispatches: 0,
            submitted_outputs: 0,
            cancelled: true,
        };
        let err = ensure_completed(&outcome).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
