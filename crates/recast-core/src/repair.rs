//! Repair of malformed model replies
//!
//! When a reply fails validation, the pipeline hands it to a secondary
//! model together with the expected schema and the concrete failure, then
//! revalidates whatever comes back. Each round corrects the previous
//! round's output, so partial fixes carry forward. The budget is exact:
//! at most `max_attempts` repair requests, after which the exchange is
//! declared unparsable with the final payload and failure attached.

use crate::endpoint::{GenerateRequest, ModelEndpoint};
use crate::error::{Error, Result};
use recast_schemas::{CompiledSchema, ValidatedResponse, ValidationFailure};
use std::time::Duration;
use tracing::debug;

/// Settings for one repair run
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOptions {
    /// Model asked to fix the payload
    pub model: String,
    /// Keep-alive forwarded with each repair request
    pub keep_alive: Option<Duration>,
    /// Repair requests allowed; 0 disables repair entirely
    pub max_attempts: u32,
}

/// Build the system prompt for one repair request
///
/// The instructions embed the expected schema and the failure from the
/// previous round, so the model corrects the structure instead of
/// guessing at what went wrong.
pub(crate) fn repair_system_prompt(
    schema: &CompiledSchema,
    failure: &ValidationFailure,
) -> String {
    let document = serde_json::to_string_pretty(schema.json_schema())
        .unwrap_or_else(|_| schema.json_schema().to_string());
    format!(
        "You are a friendly AI assistant.  Your task is to fix poorly formatted json.\n\
         Please ensure the user input matches the expected json format and output the corrected structure\n\
         \n\
         The structured output format should match this json schema:\n\
         \n\
         ```\n\
         {document}\n\
         ```\n\
         \n\
         The previous output failed validation:\n\
         {failure}"
    )
}

/// Repeatedly ask the repair model to fix `payload` until it validates
///
/// Round `n` is prompted with the output of round `n - 1`, starting from
/// the primary model's payload. A transport error surfaces immediately;
/// validation failures consume budget until it runs out.
pub async fn repair(
    endpoint: &dyn ModelEndpoint,
    options: &RepairOptions,
    schema: &CompiledSchema,
    mut payload: String,
    mut failure: ValidationFailure,
) -> Result<ValidatedResponse> {
    for attempt in 1..=options.max_attempts {
        debug!(
            attempt,
            max_attempts = options.max_attempts,
            schema = schema.name(),
            endpoint = endpoint.name(),
            payload_bytes = payload.len(),
            "Sending malformed reply for repair"
        );
        let request = GenerateRequest {
            model: options.model.clone(),
            prompt: payload.clone(),
            system: Some(repair_system_prompt(schema, &failure)),
            keep_alive: options.keep_alive,
        };
        payload = endpoint.generate(&request).await?;
        match schema.validate(&payload) {
            Ok(validated) => {
                debug!(attempt, schema = schema.name(), "Repair produced a valid reply");
                return Ok(validated);
            }
            Err(next) => {
                debug!(attempt, error = %next, "Repaired reply still fails validation");
                failure = next;
            }
        }
    }

    Err(Error::Unparsable {
        attempts: options.max_attempts,
        payload,
        failure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointError;
    use async_trait::async_trait;
    use recast_schemas::{FieldSpec, FieldType, ResponseSchema};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Reply = std::result::Result<String, EndpointError>;

    struct Scripted {
        replies: Mutex<VecDeque<Reply>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn recorded_prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelEndpoint for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerateRequest) -> Reply {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted")
        }
    }

    fn text_schema() -> CompiledSchema {
        CompiledSchema::compile(ResponseSchema::free_text()).expect("valid schema")
    }

    fn options(max_attempts: u32) -> RepairOptions {
        RepairOptions {
            model: "fixer".to_string(),
            keep_alive: None,
            max_attempts,
        }
    }

    fn failure_for(schema: &CompiledSchema, payload: &str) -> ValidationFailure {
        schema.validate(payload).expect_err("payload is malformed")
    }

    #[tokio::test]
    async fn budget_zero_goes_straight_to_unparsable() {
        let endpoint = Scripted::new(vec![]);
        let schema = text_schema();
        let failure = failure_for(&schema, "{oops");

        let err = repair(&endpoint, &options(0), &schema, "{oops".to_string(), failure)
            .await
            .expect_err("no budget to spend");

        match err {
            Error::Unparsable {
                attempts, payload, ..
            } => {
                assert_eq!(attempts, 0);
                assert_eq!(payload, "{oops");
            }
            other => panic!("expected Unparsable, got {other:?}"),
        }
        assert!(endpoint.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn each_round_feeds_the_previous_output_back() {
        let endpoint = Scripted::new(vec![
            Ok("{\"text\": 1}".to_string()),
            Ok("{\"text\": \"fixed\"}".to_string()),
        ]);
        let schema = text_schema();
        let failure = failure_for(&schema, "{broken");

        let validated = repair(
            &endpoint,
            &options(3),
            &schema,
            "{broken".to_string(),
            failure,
        )
        .await
        .expect("second round validates");

        assert_eq!(validated.text(), Some("fixed"));
        assert_eq!(
            endpoint.recorded_prompts(),
            vec!["{broken".to_string(), "{\"text\": 1}".to_string()]
        );
    }

    #[tokio::test]
    async fn exhausted_budget_reports_the_final_round() {
        let endpoint = Scripted::new(vec![
            Ok("attempt one".to_string()),
            Ok("attempt two".to_string()),
        ]);
        let schema = text_schema();
        let failure = failure_for(&schema, "first");

        let err = repair(&endpoint, &options(2), &schema, "first".to_string(), failure)
            .await
            .expect_err("every round is malformed");

        match err {
            Error::Unparsable {
                attempts,
                payload,
                failure,
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(payload, "attempt two");
                assert!(failure.is_syntax());
            }
            other => panic!("expected Unparsable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_errors_surface_immediately() {
        let endpoint = Scripted::new(vec![
            Err(EndpointError::Timeout {
                endpoint: "scripted".to_string(),
            }),
            Ok("{\"text\": \"never reached\"}".to_string()),
        ]);
        let schema = text_schema();
        let failure = failure_for(&schema, "nope");

        let err = repair(&endpoint, &options(3), &schema, "nope".to_string(), failure)
            .await
            .expect_err("transport failure");

        assert!(matches!(err, Error::Connectivity { .. }));
        assert_eq!(endpoint.recorded_prompts().len(), 1);
    }

    #[test]
    fn system_prompt_embeds_schema_and_failure() {
        let schema = CompiledSchema::compile(
            ResponseSchema::new("weather")
                .with_field(FieldSpec::new("temp_f", FieldType::Number)),
        )
        .expect("valid schema");
        let failure = failure_for(&schema, "{\"temp_f\": \"warm\"}");

        let prompt = repair_system_prompt(&schema, &failure);
        assert!(prompt.contains("fix poorly formatted json"));
        assert!(prompt.contains("\"temp_f\""));
        assert!(prompt.contains("$.temp_f"));
    }
}
