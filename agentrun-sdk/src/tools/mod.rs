use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{error::ToolError, types::FunctionCall};

/// Declaration of a callable function, sent to the service when an agent is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the arguments object
    #[serde(default = "empty_parameters")]
    pub parameters: Value,
}

fn empty_parameters() -> Value {
    json!({ "type": "object", "properties": {} })
}

impl FunctionDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Create a definition whose parameters are derived from `T`'s JSON Schema
    pub fn from_type<T: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, parameters_schema::<T>())
    }
}

/// JSON Schema for an argument type, with subschemas inlined.
///
/// `$ref`/`allOf` are not accepted by every deployment, and the root `$schema`
/// and `title` keys are dropped.
pub fn parameters_schema<T: JsonSchema>() -> Value {
    use schemars::gen::SchemaSettings;

    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();

    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| empty_parameters());
    if let Value::Object(map) = &mut value {
        map.remove("$schema");
        map.remove("title");
    }
    value
}

/// A local function a run can ask us to execute
#[async_trait]
pub trait ToolFunction: Send + Sync {
    /// Name, description and parameter schema
    fn definition(&self) -> FunctionDefinition;

    /// Execute with already-decoded JSON arguments
    async fn call(&self, arguments: Value) -> Result<String, ToolError>;
}

/// A function with a strongly typed argument struct.
///
/// Register it with [`FunctionRegistry::register_typed`]; arguments are decoded
/// into `Args` before `invoke` runs and the schema is derived from `Args`.
#[async_trait]
pub trait TypedFunction: Send + Sync + 'static {
    type Args: DeserializeOwned + JsonSchema + Send;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn invoke(&self, args: Self::Args) -> Result<String, ToolError>;
}

/// Adapter from [`TypedFunction`] to [`ToolFunction`]
pub struct Typed<F>(pub F);

#[async_trait]
impl<F: TypedFunction> ToolFunction for Typed<F> {
    fn definition(&self) -> FunctionDefinition {
        FunctionDefinition::from_type::<F::Args>(self.0.name(), self.0.description())
    }

    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        let args: F::Args =
            serde_json::from_value(arguments).map_err(|source| ToolError::InvalidArguments {
                function: self.0.name().to_string(),
                source,
            })?;
        self.0.invoke(args).await
    }
}

/// Name-indexed set of local functions, kept in registration order
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<(String, Arc<dyn ToolFunction>)>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under its definition name, replacing any previous one
    pub fn register(&mut self, function: Arc<dyn ToolFunction>) -> &mut Self {
        let name = function.definition().name;
        if let Some(slot) = self.functions.iter_mut().find(|(n, _)| *n == name) {
            tracing::debug!("Replacing registered function '{}'", name);
            slot.1 = function;
        } else {
            self.functions.push((name, function));
        }
        self
    }

    pub fn register_typed<F: TypedFunction>(&mut self, function: F) -> &mut Self {
        self.register(Arc::new(Typed(function)))
    }

    /// Builder-style variant of [`FunctionRegistry::register_typed`]
    pub fn with_typed<F: TypedFunction>(mut self, function: F) -> Self {
        self.register_typed(function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolFunction>> {
        self.functions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, function)| function)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Definitions to declare on the agent
    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        self.functions.iter().map(|(_, f)| f.definition()).collect()
    }

    /// Look up the named function and run it with the call's arguments
    pub async fn execute(&self, call: &FunctionCall) -> Result<String, ToolError> {
        let function = self
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownFunction {
                name: call.name.clone(),
            })?;
        let arguments = parse_arguments(&call.name, &call.arguments)?;
        function.call(arguments).await
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

/// Decode the serialized arguments of a call. An empty string means no arguments.
fn parse_arguments(function: &str, arguments: &str) -> Result<Value, ToolError> {
    if arguments.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(arguments).map_err(|source| ToolError::InvalidArguments {
        function: function.to_string(),
        source,
    })
}
