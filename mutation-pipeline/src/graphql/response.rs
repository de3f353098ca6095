use displaydoc::Display;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
use thiserror::Error;

use crate::graphql::Error;
use crate::json_ext::Object;
use crate::json_ext::Value;

/// A graphql primary response.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Response {
    /// The response data.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,

    /// The optional graphql errors encountered.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<Error>,

    /// The optional graphql extensions.
    #[serde(skip_serializing_if = "Object::is_empty", default)]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Response {
    /// Constructor
    #[builder(visibility = "pub")]
    fn new(data: Option<Value>, errors: Vec<Error>, extensions: Map<ByteString, Value>) -> Self {
        Self {
            data,
            errors,
            extensions,
        }
    }
}

#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
/// malformed execution result: {reason}
pub struct MalformedResponseError {
    /// The reason the deserialization failed.
    pub reason: String,
}

/// A partial execution result, carrying both data and protocol errors.
///
/// A plugin returns this when it wants to answer a mutation with its own
/// data mapping and error list. Both are merged into the final response as
/// they are, each error keeping its path.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExecutionResult {
    /// The data mapping, `None` when the execution produced no data at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Object>,

    /// The protocol errors, in the order they were produced.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Error>,
}

#[buildstructor::buildstructor]
impl ExecutionResult {
    #[builder(visibility = "pub")]
    fn new(data: Option<Map<ByteString, Value>>, errors: Vec<Error>) -> Self {
        Self { data, errors }
    }

    /// Parses an execution result as found on the wire: `{"data": ..., "errors": [...]}`.
    pub fn from_value(value: Value) -> Result<Self, MalformedResponseError> {
        let mut object = ensure_object!(value).map_err(|error| MalformedResponseError {
            reason: error.to_string(),
        })?;

        let data = extract_key_value_from_object!(object, "data", Value::Object(o) => o)
            .map_err(|err| MalformedResponseError {
                reason: err.to_string(),
            })?;
        let errors = extract_key_value_from_object!(object, "errors", Value::Array(v) => v)
            .map_err(|err| MalformedResponseError {
                reason: err.to_string(),
            })?
            .into_iter()
            .flatten()
            .map(Error::from_value)
            .collect::<Result<Vec<Error>, MalformedResponseError>>()?;

        Ok(Self { data, errors })
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;
    use crate::graphql::Location;
    use crate::json_ext::Path;

    #[test]
    fn execution_result_from_value() {
        let result = ExecutionResult::from_value(json!({
            "data": {"name": "Table"},
            "errors": [{
                "message": "My Custom Error",
                "locations": [{"line": 5, "column": 13}],
                "path": ["errors", 0]
            }]
        }))
        .unwrap();
        assert_eq!(
            result.data.as_ref().and_then(|d| d.get("name")),
            Some(&Value::from("Table"))
        );
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].locations, vec![Location::new(5, 13)]);
        assert_eq!(result.errors[0].path, Some(Path::from("errors/0")));
    }

    #[test]
    fn execution_result_null_data() {
        let result = ExecutionResult::from_value(json!({"data": null})).unwrap();
        assert_eq!(result, ExecutionResult::default());
    }

    #[test]
    fn execution_result_rejects_bad_shapes() {
        assert!(ExecutionResult::from_value(json!([])).is_err());
        assert!(ExecutionResult::from_value(json!({"errors": {}})).is_err());
        assert!(ExecutionResult::from_value(json!({"data": 3})).is_err());
    }
}
