//! End-to-end pipeline behavior over scripted in-memory endpoints
//!
//! These tests drive full invocations (primary request, validation,
//! repair loop) without a live server, asserting both terminal outcomes
//! and the exact traffic each endpoint saw.

use async_trait::async_trait;
use recast_core::endpoint::{EndpointError, GenerateRequest, ModelEndpoint};
use recast_core::{
    Agent, AgentRunner, Error, Pipeline, PipelineConfig, PromptRequest, ToolDefinition,
    ToolParameter, ToolRegistry,
};
use recast_schemas::{CompiledSchema, FieldType, ResponseSchema, ValidatedResponse};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Script {
    Queue(Mutex<VecDeque<Result<String, EndpointError>>>),
    Echo(fn(&GenerateRequest) -> String),
}

/// Test double that records every request it answers
struct ScriptedEndpoint {
    label: &'static str,
    script: Script,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedEndpoint {
    fn queued(label: &'static str, replies: Vec<Result<String, EndpointError>>) -> Arc<Self> {
        Arc::new(Self {
            label,
            script: Script::Queue(Mutex::new(replies.into_iter().collect())),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn echo(label: &'static str, transform: fn(&GenerateRequest) -> String) -> Arc<Self> {
        Arc::new(Self {
            label,
            script: Script::Echo(transform),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelEndpoint for ScriptedEndpoint {
    fn name(&self) -> &str {
        self.label
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, EndpointError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .unwrap()
                .pop_front()
                .expect("endpoint called more times than scripted"),
            Script::Echo(transform) => Ok(transform(request)),
        }
    }
}

fn weather_schema() -> CompiledSchema {
    CompiledSchema::compile(
        ResponseSchema::new("weather_report")
            .describe("Current conditions for one city")
            .field("city", FieldType::String)
            .field("temp_f", FieldType::Number)
            .optional_field("conditions", FieldType::String, json!("unknown")),
    )
    .expect("valid schema")
}

fn pipeline(
    primary: &Arc<ScriptedEndpoint>,
    repair: &Arc<ScriptedEndpoint>,
    attempts: u32,
) -> Pipeline {
    let config = PipelineConfig::default()
        .with_model("primary-model")
        .with_repair_model("repair-model")
        .with_max_repair_attempts(attempts);
    let primary: Arc<dyn ModelEndpoint> = Arc::clone(primary) as _;
    let repair: Arc<dyn ModelEndpoint> = Arc::clone(repair) as _;
    Pipeline::new(primary, repair, config).expect("valid config")
}

#[tokio::test]
async fn valid_reply_returns_without_repair_traffic() {
    let primary = ScriptedEndpoint::queued(
        "primary",
        vec![Ok(r#"{"city": "Portland", "temp_f": 54.2}"#.to_string())],
    );
    let repair = ScriptedEndpoint::queued("repair", vec![]);
    let pipeline = pipeline(&primary, &repair, 3);

    let response = pipeline
        .run(&PromptRequest::new("Weather in Portland?"), &weather_schema())
        .await
        .expect("well formed reply");

    assert_eq!(response.get("city"), Some(&json!("Portland")));
    assert_eq!(response.get("conditions"), Some(&json!("unknown")));
    assert_eq!(primary.calls(), 1);
    assert_eq!(repair.calls(), 0);

    let sent = primary.requests().remove(0);
    assert_eq!(sent.model, "primary-model");
    assert_eq!(sent.system, None);
    assert_eq!(sent.keep_alive, Some(Duration::from_secs(300)));
}

#[tokio::test]
async fn malformed_reply_is_repaired_once() {
    let primary = ScriptedEndpoint::queued(
        "primary",
        vec![Ok(r#"{"city": "Portland", "temp_f": 54."#.to_string())],
    );
    let repair = ScriptedEndpoint::queued(
        "repair",
        vec![Ok(r#"{"city": "Portland", "temp_f": 54.2}"#.to_string())],
    );
    let pipeline = pipeline(&primary, &repair, 3);

    let response = pipeline
        .run(&PromptRequest::new("Weather in Portland?"), &weather_schema())
        .await
        .expect("repaired on the first attempt");

    assert_eq!(response.get("temp_f"), Some(&json!(54.2)));
    assert_eq!(primary.calls(), 1);
    assert_eq!(repair.calls(), 1);

    let sent = repair.requests().remove(0);
    assert_eq!(sent.model, "repair-model");
    assert_eq!(sent.prompt, r#"{"city": "Portland", "temp_f": 54."#);
    let system = sent.system.expect("repair requests carry instructions");
    assert!(system.contains("fix poorly formatted json"));
    assert!(system.contains("weather_report"));
}

#[tokio::test]
async fn budget_exhaustion_reports_the_last_round() {
    let primary = ScriptedEndpoint::queued("primary", vec![Ok("not even json".to_string())]);
    let repair = ScriptedEndpoint::queued(
        "repair",
        vec![
            Ok("still nothing".to_string()),
            Ok(r#"{"city": "Portland"}"#.to_string()),
            Ok(r#"{"city": 12, "temp_f": 3}"#.to_string()),
        ],
    );
    let pipeline = pipeline(&primary, &repair, 3);

    let err = pipeline
        .run(&PromptRequest::new("Weather?"), &weather_schema())
        .await
        .expect_err("every round is malformed");

    match err {
        Error::Unparsable {
            attempts,
            payload,
            failure,
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(payload, r#"{"city": 12, "temp_f": 3}"#);
            assert_eq!(failure.path, "$.city");
        }
        other => panic!("expected Unparsable, got {other:?}"),
    }
    assert_eq!(primary.calls(), 1);
    assert_eq!(repair.calls(), 3);
}

#[tokio::test]
async fn primary_timeout_propagates_without_repair() {
    let primary = ScriptedEndpoint::queued(
        "primary",
        vec![Err(EndpointError::Timeout {
            endpoint: "primary".to_string(),
        })],
    );
    let repair = ScriptedEndpoint::queued("repair", vec![]);
    let pipeline = pipeline(&primary, &repair, 3);

    let err = pipeline
        .run(&PromptRequest::new("Weather?"), &weather_schema())
        .await
        .expect_err("endpoint timed out");

    assert!(matches!(err, Error::Connectivity { .. }));
    assert!(err.to_string().contains("timed out"));
    assert_eq!(primary.calls(), 1);
    assert_eq!(repair.calls(), 0);
}

#[tokio::test]
async fn budget_zero_disables_repair() {
    let primary = ScriptedEndpoint::queued("primary", vec![Ok("{broken".to_string())]);
    let repair = ScriptedEndpoint::queued("repair", vec![]);
    let pipeline = pipeline(&primary, &repair, 0);

    let err = pipeline
        .run(&PromptRequest::new("Weather?"), &weather_schema())
        .await
        .expect_err("nothing to spend on repair");

    match err {
        Error::Unparsable {
            attempts, payload, ..
        } => {
            assert_eq!(attempts, 0);
            assert_eq!(payload, "{broken");
        }
        other => panic!("expected Unparsable, got {other:?}"),
    }
    assert_eq!(repair.calls(), 0);
}

#[tokio::test]
async fn cancellation_mid_repair_surfaces_as_connectivity() {
    let primary = ScriptedEndpoint::queued("primary", vec![Ok("{broken".to_string())]);
    let repair = ScriptedEndpoint::queued(
        "repair",
        vec![Err(EndpointError::Cancelled {
            endpoint: "repair".to_string(),
        })],
    );
    let pipeline = pipeline(&primary, &repair, 3);

    let err = pipeline
        .run(&PromptRequest::new("Weather?"), &weather_schema())
        .await
        .expect_err("invocation was cancelled");

    assert!(matches!(err, Error::Connectivity { .. }));
    assert!(err.to_string().contains("cancelled"));
    assert_eq!(repair.calls(), 1);
}

#[tokio::test]
async fn repair_rounds_chain_each_previous_output() {
    let primary = ScriptedEndpoint::queued("primary", vec![Ok("{broken".to_string())]);
    let repair = ScriptedEndpoint::echo("repair", |request| format!("{} again", request.prompt));
    let pipeline = pipeline(&primary, &repair, 2);

    let err = pipeline
        .run(&PromptRequest::new("Weather?"), &weather_schema())
        .await
        .expect_err("echo never produces valid JSON");

    match err {
        Error::Unparsable { payload, .. } => assert_eq!(payload, "{broken again again"),
        other => panic!("expected Unparsable, got {other:?}"),
    }
    let prompts: Vec<String> = repair
        .requests()
        .into_iter()
        .map(|request| request.prompt)
        .collect();
    assert_eq!(prompts, vec!["{broken".to_string(), "{broken again".to_string()]);
}

#[tokio::test]
async fn concurrent_invocations_share_one_pipeline() {
    let echo = ScriptedEndpoint::echo("echo", |request| {
        json!({ "text": request.prompt }).to_string()
    });
    let pipeline = pipeline(&echo, &echo, 3);
    let schema = CompiledSchema::compile(ResponseSchema::free_text()).expect("valid schema");

    let alpha_request = PromptRequest::new("alpha");
    let beta_request = PromptRequest::new("beta");
    let (alpha, beta) = tokio::join!(
        pipeline.run(&alpha_request, &schema),
        pipeline.run(&beta_request, &schema),
    );

    assert_eq!(alpha.expect("alpha run").text(), Some("alpha"));
    assert_eq!(beta.expect("beta run").text(), Some("beta"));
    assert_eq!(echo.calls(), 2);
}

#[tokio::test]
async fn request_overrides_reach_the_endpoint() {
    let echo = ScriptedEndpoint::echo("echo", |request| {
        json!({ "text": request.prompt }).to_string()
    });
    let pipeline = pipeline(&echo, &echo, 3);
    let schema = CompiledSchema::compile(ResponseSchema::free_text()).expect("valid schema");

    let request = PromptRequest::new("hello")
        .with_system("be terse")
        .with_model("special:1b");
    pipeline.run(&request, &schema).await.expect("echo validates");
    pipeline
        .run(&PromptRequest::new("hello"), &schema)
        .await
        .expect("echo validates");

    let sent = echo.requests();
    assert_eq!(sent[0].model, "special:1b");
    assert_eq!(sent[0].system.as_deref(), Some("be terse"));
    assert_eq!(sent[1].model, "primary-model");
    assert_eq!(sent[1].system, None);
}

struct WeatherAgent {
    last_city: Option<String>,
    errors: usize,
}

impl Agent for WeatherAgent {
    fn prompt(&self) -> String {
        "What's the weather in Portland?".to_string()
    }

    fn response_schema(&self) -> ResponseSchema {
        ResponseSchema::new("weather_report")
            .field("city", FieldType::String)
            .field("temp_f", FieldType::Number)
    }

    fn handle_response(&mut self, response: ValidatedResponse) {
        self.last_city = response
            .get("city")
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    fn handle_error(&mut self, _error: &Error) {
        self.errors += 1;
    }
}

#[tokio::test]
async fn agent_tick_dispatches_validated_replies() {
    let primary = ScriptedEndpoint::queued(
        "primary",
        vec![Ok(r#"{"city": "Portland", "temp_f": 54.2}"#.to_string())],
    );
    let repair = ScriptedEndpoint::queued("repair", vec![]);
    let pipeline = Arc::new(pipeline(&primary, &repair, 3));

    let agent = WeatherAgent {
        last_city: None,
        errors: 0,
    };
    let mut runner = AgentRunner::new(agent, pipeline).expect("schema compiles");
    runner.tick().await.expect("exchange succeeds");

    assert_eq!(runner.agent().last_city.as_deref(), Some("Portland"));
    assert_eq!(runner.agent().errors, 0);
}

#[tokio::test]
async fn agent_tick_reports_failed_exchanges() {
    let primary = ScriptedEndpoint::queued(
        "primary",
        vec![Err(EndpointError::Connect {
            endpoint: "primary".to_string(),
            source: anyhow::anyhow!("connection refused"),
        })],
    );
    let repair = ScriptedEndpoint::queued("repair", vec![]);
    let pipeline = Arc::new(pipeline(&primary, &repair, 3));

    let agent = WeatherAgent {
        last_city: None,
        errors: 0,
    };
    let mut runner = AgentRunner::new(agent, pipeline).expect("schema compiles");
    let err = runner.tick().await.expect_err("endpoint is down");

    assert!(matches!(err, Error::Connectivity { .. }));
    assert_eq!(runner.agent().errors, 1);
    assert_eq!(runner.agent().last_city, None);
}

struct ToolAgent {
    registry: Arc<ToolRegistry>,
    last_reply: Option<ValidatedResponse>,
}

impl Agent for ToolAgent {
    fn prompt(&self) -> String {
        "Add 1 and 2".to_string()
    }

    fn system_prompt(&self) -> String {
        self.registry.system_prompt()
    }

    fn response_schema(&self) -> ResponseSchema {
        self.registry.call_schema()
    }

    fn handle_response(&mut self, response: ValidatedResponse) {
        self.last_reply = Some(response);
    }
}

#[tokio::test]
async fn tool_calling_agents_round_trip() {
    let mut registry = ToolRegistry::new();
    registry.register(
        ToolDefinition::new("add", "Add two integers")
            .with_parameter(ToolParameter::new("a", FieldType::Integer))
            .with_parameter(ToolParameter::new("b", FieldType::Integer)),
        Box::new(|args| {
            let a = args["a"].as_i64().unwrap_or_default();
            let b = args["b"].as_i64().unwrap_or_default();
            Ok(json!(a + b))
        }),
    );
    let registry = Arc::new(registry);

    let primary = ScriptedEndpoint::queued(
        "primary",
        vec![Ok(
            r#"{"tool_calls": [{"function_name": "add", "function_args": {"a": 1, "b": 2}}]}"#
                .to_string(),
        )],
    );
    let repair = ScriptedEndpoint::queued("repair", vec![]);
    let pipeline = Arc::new(pipeline(&primary, &repair, 3));

    let agent = ToolAgent {
        registry: Arc::clone(&registry),
        last_reply: None,
    };
    let mut runner = AgentRunner::new(agent, pipeline).expect("schema compiles");
    runner.tick().await.expect("exchange succeeds");

    let sent = primary.requests().remove(0);
    let system = sent.system.expect("tool agents send instructions");
    assert!(system.contains("[TOOLS]"));
    assert!(system.contains("\"add\""));

    let reply = runner
        .agent()
        .last_reply
        .clone()
        .expect("reply was handled");
    let reports = registry.dispatch_all(&reply);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, json!(3));
}
