use agentrun_sdk::{tools::TypedFunction, ToolError};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const NO_DATA: &str = "Weather data not available for this location.";

/// Canned conditions; there is no live weather backend
const MOCK_WEATHER: &[(&str, &str)] = &[
    ("New York", "Sunny, 25°C"),
    ("London", "Cloudy, 18°C"),
    ("Tokyo", "Rainy, 22°C"),
];

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchWeatherRequest {
    /// The location to fetch weather for (e.g., "New York", "London", "Tokyo")
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchWeatherResponse {
    pub weather: String,
}

/// Look up the weather for a city
pub fn lookup(location: &str) -> &'static str {
    MOCK_WEATHER
        .iter()
        .find(|(city, _)| *city == location)
        .map(|(_, weather)| *weather)
        .unwrap_or(NO_DATA)
}

pub struct FetchWeather;

#[async_trait]
impl TypedFunction for FetchWeather {
    type Args = FetchWeatherRequest;

    fn name(&self) -> &str {
        "fetch_weather"
    }

    fn description(&self) -> &str {
        "Fetches the weather information for the specified location."
    }

    async fn invoke(&self, args: FetchWeatherRequest) -> Result<String, ToolError> {
        let response = FetchWeatherResponse {
            weather: lookup(&args.location).to_string(),
        };
        tracing::debug!("Weather for {}: {}", args.location, response.weather);
        serde_json::to_string(&response).map_err(|e| ToolError::execution(self.name(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        assert_eq!(lookup("New York"), "Sunny, 25°C");
        assert_eq!(lookup("Tokyo"), "Rainy, 22°C");
        assert_eq!(lookup("new york"), NO_DATA);
    }

    #[tokio::test]
    async fn test_invoke_returns_json() {
        let output = FetchWeather
            .invoke(FetchWeatherRequest {
                location: "New York".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(output, r#"{"weather":"Sunny, 25°C"}"#);
    }
}
