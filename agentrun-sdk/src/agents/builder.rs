use crate::{
    client::AgentsService,
    error::AgentsError,
    tools::{FunctionDefinition, FunctionRegistry},
    types::{Agent, CreateAgentRequest, ToolDefinition},
};

/// Builder for create-agent requests
pub struct AgentBuilder<'a> {
    service: &'a dyn AgentsService,
    model: Option<String>,
    name: Option<String>,
    instructions: Option<String>,
    tools: Vec<ToolDefinition>,
}

impl<'a> AgentBuilder<'a> {
    pub fn new(service: &'a dyn AgentsService) -> Self {
        Self {
            service,
            model: None,
            name: None,
            instructions: None,
            tools: Vec::new(),
        }
    }

    /// Set the model deployment name
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the system instructions
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Declare a single function
    pub fn function(mut self, definition: FunctionDefinition) -> Self {
        self.tools.push(definition.into());
        self
    }

    /// Declare every function in the registry
    pub fn functions(mut self, registry: &FunctionRegistry) -> Self {
        self.tools
            .extend(registry.definitions().into_iter().map(ToolDefinition::from));
        self
    }

    /// Build the request without sending it
    pub fn build(self) -> Result<CreateAgentRequest, AgentsError> {
        Ok(CreateAgentRequest {
            model: self
                .model
                .filter(|model| !model.trim().is_empty())
                .ok_or_else(|| AgentsError::invalid_request("Model must be specified"))?,
            name: self.name,
            instructions: self.instructions,
            tools: self.tools,
        })
    }

    /// Send the request and return the created agent
    pub async fn create(self) -> Result<Agent, AgentsError> {
        let service = self.service;
        let request = self.build()?;
        service.create_agent(request).await
    }
}

impl crate::agents::AgentsClient {
    /// Start building a create-agent request
    pub fn agent_builder(&self) -> AgentBuilder<'_> {
        AgentBuilder::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAgentsService;
    use serde_json::json;

    #[test]
    fn test_build_requires_model() {
        let service = MockAgentsService::new();
        let err = AgentBuilder::new(&service).name("my-agent").build().unwrap_err();
        assert!(matches!(err, AgentsError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_create_declares_functions() {
        let service = MockAgentsService::new();
        let agent = AgentBuilder::new(&service)
            .model("gpt-4o-mini")
            .name("my-agent")
            .instructions("You are a helpful agent")
            .function(FunctionDefinition::new(
                "fetch_weather",
                "Weather lookup",
                json!({ "type": "object" }),
            ))
            .create()
            .await
            .unwrap();

        assert_eq!(agent.model, "gpt-4o-mini");
        assert_eq!(agent.name.as_deref(), Some("my-agent"));
        assert_eq!(agent.tools.len(), 1);
        assert!(matches!(
            &agent.tools[0],
            ToolDefinition::Function { function } if function.name == "fetch_weather"
        ));
    }
}
