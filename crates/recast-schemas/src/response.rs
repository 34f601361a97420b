//! The proof-carrying wrapper for schema-conformant replies
//!
//! Copyright (c) 2025 Recast Team
//! Licensed under the Apache-2.0 license

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A reply that conformed to its schema when it was validated
///
/// Only successful validation constructs this type: there is no public
/// constructor and no `Deserialize` impl, so holding a `ValidatedResponse`
/// is evidence the payload matched the named schema. It serializes as its
/// inner value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResponse {
    schema: String,
    value: Value,
}

impl ValidatedResponse {
    pub(crate) fn from_validated<N: Into<String>>(schema: N, value: Value) -> Self {
        Self {
            schema: schema.into(),
            value,
        }
    }

    /// Name of the schema the reply conformed to
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// The conformant value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the wrapper and keep the value
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Look up a top-level field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.value.get(field)
    }

    /// The `text` field of a free-text reply
    pub fn text(&self) -> Option<&str> {
        self.get("text").and_then(Value::as_str)
    }

    /// Map the value into a caller-defined type
    pub fn parse_as<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.value)
    }
}

impl Serialize for ValidatedResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn serializes_as_the_inner_value() {
        let response = ValidatedResponse::from_validated("weather", json!({"temp_f": 54.5}));
        let rendered = serde_json::to_string(&response).expect("serializes");
        assert_eq!(rendered, r#"{"temp_f":54.5}"#);
    }

    #[test]
    fn parse_as_maps_into_caller_types() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Weather {
            city: String,
            temp_f: f64,
        }

        let response = ValidatedResponse::from_validated(
            "weather",
            json!({"city": "Portland", "temp_f": 54.5}),
        );
        let weather: Weather = response.parse_as().expect("maps cleanly");
        assert_eq!(
            weather,
            Weather {
                city: "Portland".to_string(),
                temp_f: 54.5
            }
        );
    }

    #[test]
    fn text_reads_free_text_replies() {
        let response = ValidatedResponse::from_validated("free_text", json!({"text": "hello"}));
        assert_eq!(response.text(), Some("hello"));

        let response = ValidatedResponse::from_validated("weather", json!({"temp_f": 54.5}));
        assert_eq!(response.text(), None);
    }
}
