//! Types related to GraphQL responses and errors.

mod response;

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;

pub use self::response::ExecutionResult;
pub use self::response::MalformedResponseError;
pub use self::response::Response;
use crate::json_ext::Object;
use crate::json_ext::Path;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
/// The error location
pub struct Location {
    /// The line number
    pub line: u32,
    /// The column number
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors)
/// as may be found in the `errors` field of a GraphQL [`Response`].
///
/// This is the protocol-level error: it aborts the mutation field it is
/// attached to, as opposed to a [`crate::FieldError`] which is returned as
/// data.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
#[non_exhaustive]
pub struct Error {
    /// The error message.
    pub message: String,

    /// The locations of the error in the GraphQL document of the originating request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,

    /// If this is a field error, the JSON path to that field in [`Response::data`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,

    /// The optional GraphQL extensions for this error.
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Error {
    /// Returns a builder that builds a GraphQL [`Error`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.message(impl Into<`[`String`]`>)`
    ///   Required.
    ///   Sets [`Error::message`].
    ///
    /// * `.location(impl Into<`[`Location`]`>)`
    ///   Optional, may be called multiple times.
    ///   Adds one item at the end of [`Error::locations`].
    ///
    /// * `.path(impl Into<`[`Path`]`>)`
    ///   Optional.
    ///   Sets [`Error::path`].
    ///
    /// * `.extension(impl Into<`[`ByteString`]`>, impl Into<`[`Value`]`>)`
    ///   Optional, may be called multiple times.
    ///   Adds one item to the [`Error::extensions`] map.
    ///
    /// * `.extension_code(impl Into<`[`String`]`>)`
    ///   Optional.
    ///   Sets the "code" in the extension map. Will be ignored if extension already has this key
    ///   set.
    ///
    /// * `.build()`
    ///   Finishes the builder and returns a GraphQL [`Error`].
    #[builder(visibility = "pub")]
    fn new(
        message: String,
        locations: Vec<Location>,
        path: Option<Path>,
        extension_code: Option<String>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        mut extensions: JsonMap<ByteString, Value>,
    ) -> Self {
        if let Some(code) = extension_code {
            extensions
                .entry("code")
                .or_insert(Value::String(ByteString::from(code)));
        }
        Self {
            message,
            locations,
            path,
            extensions,
        }
    }

    pub(crate) fn from_value(value: Value) -> Result<Error, MalformedResponseError> {
        let mut object = ensure_object!(value).map_err(|error| MalformedResponseError {
            reason: format!("invalid error within `errors`: {error}"),
        })?;

        let extensions =
            extract_key_value_from_object!(object, "extensions", Value::Object(o) => o)
                .map_err(|err| MalformedResponseError {
                    reason: format!("invalid `extensions` within error: {err}"),
                })?
                .unwrap_or_default();
        let message = match extract_key_value_from_object!(object, "message", Value::String(s) => s)
        {
            Ok(Some(s)) => Ok(s.as_str().to_string()),
            Ok(None) => Err(MalformedResponseError {
                reason: "missing required `message` property within error".to_owned(),
            }),
            Err(err) => Err(MalformedResponseError {
                reason: format!("invalid `message` within error: {err}"),
            }),
        }?;
        let locations = extract_key_value_from_object!(object, "locations")
            .map(serde_json_bytes::from_value)
            .transpose()
            .map_err(|err| MalformedResponseError {
                reason: format!("invalid `locations` within error: {err}"),
            })?
            .unwrap_or_default();
        let path = extract_key_value_from_object!(object, "path")
            .map(serde_json_bytes::from_value)
            .transpose()
            .map_err(|err| MalformedResponseError {
                reason: format!("invalid `path` within error: {err}"),
            })?;

        Ok(Self::new(message, locations, path, None, extensions))
    }

    /// Extract the error code from [`Error::extensions`] as a String if it is set.
    pub fn extension_code(&self) -> Option<String> {
        self.extensions.get("code").and_then(|c| match c {
            Value::String(s) => Some(s.as_str().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Bool(_) => None,
        })
    }
}

/// Displays (only) the error message.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for Error {}

/// Trait used to get extension type from an error
pub(crate) trait ErrorExtension
where
    Self: Sized,
{
    fn extension_code(&self) -> String;

    fn to_graphql_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        Error::builder()
            .message(self.to_string())
            .extension_code(self.extension_code())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builder_sets_extension_code_once() {
        let error = Error::builder()
            .message("denied")
            .extension("code", "ALREADY_SET")
            .extension_code("PERMISSION_DENIED")
            .build();
        assert_eq!(error.extension_code().as_deref(), Some("ALREADY_SET"));
    }

    #[test]
    fn serializes_without_empty_members() {
        let error = Error::builder()
            .message("My Custom Error")
            .location(Location::new(3, 9))
            .path(Path::from("test"))
            .build();
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "message": "My Custom Error",
                "locations": [{"line": 3, "column": 9}],
                "path": ["test"],
            })
        );
        let bare = Error::builder().message("bare").build();
        assert_eq!(serde_json::to_value(&bare).unwrap(), json!({"message": "bare"}));
    }

    #[test]
    fn from_value_reads_every_member() {
        let value = serde_json_bytes::json!({
            "message": "Name could not be fetched.",
            "locations": [{ "line": 6, "column": 7 }],
            "path": ["hero", "heroFriends", 1, "name"],
            "extensions": { "code": "NOT_FOUND" }
        });
        let error = Error::from_value(value).unwrap();
        assert_eq!(error.message, "Name could not be fetched.");
        assert_eq!(error.locations, vec![Location::new(6, 7)]);
        assert_eq!(error.path, Some(Path::from("hero/heroFriends/1/name")));
        assert_eq!(error.extension_code().as_deref(), Some("NOT_FOUND"));
    }

    #[test]
    fn from_value_requires_a_message() {
        let err = Error::from_value(serde_json_bytes::json!({ "path": ["a"] })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed execution result: missing required `message` property within error"
        );
        assert!(Error::from_value(serde_json_bytes::json!("nope")).is_err());
    }
}
