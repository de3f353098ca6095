//! Normalization of mutation results into the response envelope.

use crate::descriptor::DEFAULT_ERROR_FIELD;
use crate::descriptor::MutationDescriptor;
use crate::error::FieldError;
use crate::graphql;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::plugin::HookValue;
use crate::request::MutationField;

/// How a mutation call ended.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationOutcome {
    /// The payload fields of the mutation.
    Success(Object),
    /// Expected failures, returned as data under the error fields.
    UserErrors(Vec<FieldError>),
    /// The mutation field failed as a whole.
    ProtocolError(graphql::Error),
    /// Data and errors produced by a plugin, merged at the mutation field.
    PartialExecutionResult(graphql::ExecutionResult),
}

impl MutationOutcome {
    /// Maps what a hook returned to an outcome. `None` means no hook took over.
    pub fn normalize(value: HookValue) -> Option<Self> {
        match value {
            HookValue::Sentinel => None,
            HookValue::Payload(payload) => Some(MutationOutcome::Success(payload)),
            HookValue::Error(error) => Some(MutationOutcome::ProtocolError(error)),
            HookValue::ExecutionResult(result) => {
                Some(MutationOutcome::PartialExecutionResult(result))
            }
        }
    }

    /// Renders the outcome as the response of the mutation `field`.
    pub fn into_response(
        self,
        descriptor: &MutationDescriptor,
        field: &MutationField,
    ) -> graphql::Response {
        let key = field.response_key();
        match self {
            MutationOutcome::Success(mut payload) => {
                for name in descriptor.payload_fields() {
                    if !payload.contains_key(name.as_str()) {
                        payload.insert(name.as_str(), Value::Null);
                    }
                }
                for name in descriptor.error_fields() {
                    payload.insert(name, Value::Array(Vec::new()));
                }
                graphql::Response::builder()
                    .data(data_at(key, Value::Object(payload)))
                    .build()
            }
            MutationOutcome::UserErrors(errors) => {
                let mut payload = Object::new();
                for name in descriptor.payload_fields() {
                    payload.insert(name.as_str(), Value::Null);
                }
                let errors = Value::Array(errors.iter().map(field_error_to_value).collect());
                for name in descriptor.error_fields() {
                    payload.insert(name, errors.clone());
                }
                graphql::Response::builder()
                    .data(data_at(key, Value::Object(payload)))
                    .build()
            }
            MutationOutcome::ProtocolError(mut error) => {
                if error.locations.is_empty() {
                    error.locations.extend(field.location());
                }
                if error.path.is_none() {
                    error.path = Some(field.path());
                }
                graphql::Response::builder()
                    .data(data_at(key, Value::Null))
                    .error(error)
                    .build()
            }
            MutationOutcome::PartialExecutionResult(result) => {
                let data = match result.data {
                    Some(data) if !data.is_empty() => Value::Object(data),
                    _ => Value::Null,
                };
                let errors = result
                    .errors
                    .into_iter()
                    .enumerate()
                    .map(|(index, mut error)| {
                        // paths are relative to the mutation field
                        error.path = Some(match error.path.take() {
                            Some(path) => field.path().join(path),
                            None => {
                                if error.locations.is_empty() {
                                    error.locations.extend(
                                        field.selection(DEFAULT_ERROR_FIELD).or(field.location()),
                                    );
                                }
                                let mut path = field.path();
                                path.push(DEFAULT_ERROR_FIELD);
                                path.push(index);
                                path
                            }
                        });
                        error
                    })
                    .collect::<Vec<_>>();
                graphql::Response::builder()
                    .data(data_at(key, data))
                    .errors(errors)
                    .build()
            }
        }
    }
}

fn data_at(key: &str, value: Value) -> Value {
    let mut data = Object::new();
    data.insert(key, value);
    Value::Object(data)
}

fn field_error_to_value(error: &FieldError) -> Value {
    let optional = |value: &Option<String>| value.as_deref().map(Value::from).unwrap_or(Value::Null);
    let mut object = Object::new();
    object.insert("field", optional(&error.field));
    object.insert("message", error.message.as_str().into());
    object.insert("code", optional(&error.code));
    Value::Object(object)
}
