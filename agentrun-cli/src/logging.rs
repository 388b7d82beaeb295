use crate::error::CliError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter: our crates at `level`, everything else (HTTP stack) at warn
fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("warn,agentrun={level},agentrun_sdk={level},agentrun_tools={level}")
}

/// Initialize logging to stderr. `RUST_LOG` overrides the default filter.
pub fn init_logging(verbose: bool) -> Result<(), CliError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(verbose)))
        .map_err(|e| CliError::Config(format!("Failed to create log filter: {}", e)))?;

    // stdout carries command output (messages, function definitions)
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| CliError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for verbose in [false, true] {
            let directives = default_directives(verbose);
            assert!(EnvFilter::try_new(&directives).is_ok(), "{directives}");
        }
        assert!(default_directives(true).contains("agentrun_sdk=debug"));
        assert!(default_directives(false).contains("agentrun_sdk=info"));
    }
}
