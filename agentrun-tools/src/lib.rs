//! Local functions an agent can call during a run.
//!
//! Each function returns a small JSON document as its output string.

pub mod datetime;
pub mod email;
pub mod weather;

use agentrun_sdk::tools::FunctionRegistry;

pub use datetime::FetchCurrentDatetime;
pub use email::SendEmail;
pub use weather::FetchWeather;

/// Registry with every function in this crate
pub fn user_functions() -> FunctionRegistry {
    FunctionRegistry::new()
        .with_typed(FetchCurrentDatetime)
        .with_typed(FetchWeather)
        .with_typed(SendEmail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrun_sdk::types::FunctionCall;

    #[test]
    fn test_user_functions_registered_in_order() {
        let registry = user_functions();
        assert_eq!(
            registry.names(),
            vec!["fetch_current_datetime", "fetch_weather", "send_email"]
        );
    }

    #[test]
    fn test_definitions_carry_schemas() {
        let definitions = user_functions().definitions();
        let email = definitions
            .iter()
            .find(|d| d.name == "send_email")
            .unwrap();

        assert_eq!(email.parameters["type"], "object");
        let required = email.parameters["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
        assert!(!email.description.is_empty());
    }

    #[tokio::test]
    async fn test_execute_through_registry() {
        let registry = user_functions();
        let output = registry
            .execute(&FunctionCall {
                name: "fetch_weather".to_string(),
                arguments: r#"{"location":"London"}"#.to_string(),
            })
            .await
            .unwrap();
        assert_eq!(output, r#"{"weather":"Cloudy, 18°C"}"#);
    }
}
