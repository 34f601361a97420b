//! Function-calling helpers
//!
//! Tools are declared up front, embedded into a system prompt the model
//! can act on, and dispatched from validated replies. Handler failures
//! are captured into the report instead of propagated, so one bad call
//! never takes down the rest of the exchange.

use recast_schemas::{FieldSpec, FieldType, ResponseSchema, ValidatedResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Runs one tool call against its JSON arguments
pub type ToolHandler = Box<dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync>;

/// One declared tool argument
#[derive(Debug, Clone, PartialEq)]
pub struct ToolParameter {
    /// Argument name
    pub name: String,
    /// Argument type as exposed to the model
    pub kind: FieldType,
    /// Human description embedded in the tool listing
    pub description: String,
    /// Whether the model must supply this argument
    pub required: bool,
}

impl ToolParameter {
    /// A required parameter with no description
    pub fn new<S: Into<String>>(name: S, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            required: true,
        }
    }

    /// Attach a description
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the parameter optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A callable tool as presented to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    /// Name the model calls the tool by
    pub name: String,
    /// What the tool does
    pub description: String,
    /// Declared arguments
    pub parameters: Vec<ToolParameter>,
}

impl ToolDefinition {
    /// A tool with no parameters
    pub fn new<N: Into<String>, D: Into<String>>(name: N, description: D) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Declare a parameter
    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    fn to_json(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for parameter in &self.parameters {
            properties.insert(
                parameter.name.clone(),
                json!({
                    "type": parameter.kind.name(),
                    "description": parameter.description,
                }),
            );
            if parameter.required {
                required.push(Value::String(parameter.name.clone()));
            }
        }
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": properties,
                "required": required,
            }
        })
    }
}

/// One tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Which tool to run
    pub function_name: String,
    /// Arguments for the handler
    pub function_args: Map<String, Value>,
}

/// The outcome of one dispatched call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallReport {
    /// The call as requested
    pub call: ToolCallRequest,
    /// Handler result, or `{"error": ...}` when the handler failed
    pub outcome: Value,
}

/// Named tools with their handlers, iterated in name order
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, (ToolDefinition, ToolHandler)>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; a later registration under the same name wins
    pub fn register(&mut self, definition: ToolDefinition, handler: ToolHandler) {
        self.tools
            .insert(definition.name.clone(), (definition, handler));
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether any tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// JSON array describing every tool, for prompt embedding
    pub fn definitions_json(&self) -> Value {
        Value::Array(
            self.tools
                .values()
                .map(|(definition, _)| definition.to_json())
                .collect(),
        )
    }

    /// The schema a tool-calling reply must match
    pub fn call_schema(&self) -> ResponseSchema {
        ResponseSchema::new("tool_calls")
            .describe("One or more tool invocations")
            .with_field(FieldSpec::new(
                "tool_calls",
                FieldType::array(FieldType::object(vec![
                    FieldSpec::new("function_name", FieldType::String),
                    FieldSpec::new("function_args", FieldType::Map),
                ])),
            ))
    }

    /// The tool-calling instruction block with no prior invocations
    pub fn system_prompt(&self) -> String {
        self.system_prompt_with_history(&[])
    }

    /// The tool-calling instruction block, with prior invocations rendered
    /// so the model can build on earlier results
    pub fn system_prompt_with_history(&self, history: &[ToolCallReport]) -> String {
        let definitions = self.definitions_json().to_string();
        let invocations = if history.is_empty() {
            String::new()
        } else {
            serde_json::to_string(history).unwrap_or_default()
        };
        format!(
            "[TOOLS]{definitions}[/TOOLS]\n\
             \n\
             To call a tool use the following format:\n\
             \n\
             ```\n\
             {{\n\
             \x20   \"tool_calls\": [\n\
             \x20       {{\n\
             \x20           \"function_name\": <function name>,\n\
             \x20           \"function_args\": <object with function arguments>\n\
             \x20       }}\n\
             \x20   ]\n\
             }}\n\
             ```\n\
             \n\
             Previous tool invocations are rendered in the TOOL_INVOCATIONS section of the system prompt.\n\
             [TOOL_INVOCATIONS]{invocations}[/TOOL_INVOCATIONS]"
        )
    }

    /// Run one call, capturing any handler failure into the report
    pub fn dispatch(&self, call: &ToolCallRequest) -> ToolCallReport {
        debug!(tool = %call.function_name, "Dispatching tool call");
        let args = Value::Object(call.function_args.clone());
        let outcome = match self.tools.get(&call.function_name) {
            Some((_, handler)) => match handler(&args) {
                Ok(value) => value,
                Err(error) => json!({ "error": error.to_string() }),
            },
            None => json!({ "error": format!("unknown tool: {}", call.function_name) }),
        };
        ToolCallReport {
            call: call.clone(),
            outcome,
        }
    }

    /// Dispatch every call in a validated tool-calling reply, in order
    pub fn dispatch_all(&self, response: &ValidatedResponse) -> Vec<ToolCallReport> {
        let calls = match response.get("tool_calls").and_then(Value::as_array) {
            Some(calls) => calls.clone(),
            None => return Vec::new(),
        };
        calls
            .into_iter()
            .filter_map(|value| serde_json::from_value::<ToolCallRequest>(value).ok())
            .map(|call| self.dispatch(&call))
            .collect()
    }
}
