use anyhow::Context;

use crate::error::CliError;

/// Print the registered function definitions as pretty JSON
pub fn print_functions() -> Result<(), CliError> {
    let registry = agentrun_tools::user_functions();
    let definitions = serde_json::to_string_pretty(&registry.definitions())
        .context("Failed to serialize function definitions")?;
    println!("{definitions}");
    Ok(())
}
