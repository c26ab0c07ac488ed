//! Parsed GraphQL responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A GraphQL response body: `{ "data": ..., "errors": [...] }`.
///
/// Both members are kept as raw JSON. Probing deliberately sends queries that
/// fail validation, and servers are inconsistent about the shape of what they
/// send back, so nothing beyond "is it JSON" is enforced here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl GraphQLResponse {
    /// Builds a response from a JSON value.
    ///
    /// Non-object values yield an empty response.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => Self {
                data: map.remove("data"),
                errors: map.remove("errors"),
            },
            _ => Self::default(),
        }
    }

    /// The `data` member when it is a non-null object.
    #[must_use]
    pub fn data_object(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref().and_then(Value::as_object)
    }

    /// Returns true if the response carries at least one error entry.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors
            .as_ref()
            .and_then(Value::as_array)
            .is_some_and(|errors| !errors.is_empty())
    }

    /// Messages of every entry in the top-level `errors` array.
    ///
    /// Entries may be objects with a `message` string or bare strings; anything
    /// else is skipped.
    #[must_use]
    pub fn error_messages(&self) -> Vec<String> {
        let Some(errors) = self.errors.as_ref().and_then(Value::as_array) else {
            return Vec::new();
        };

        errors
            .iter()
            .filter_map(|error| match error {
                Value::String(message) => Some(message.clone()),
                Value::Object(object) => object
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn first_error_message(&self) -> Option<String> {
        self.error_messages().into_iter().next()
    }
}
