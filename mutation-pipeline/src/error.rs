//! Pipeline errors.
use displaydoc::Display;
use heck::ToLowerCamelCase;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tower::BoxError;

use crate::graphql;
use crate::graphql::ErrorExtension;

/// Configuration error.
///
/// Raised while declaring mutations or building the plugin chain, before any
/// request is served. Never reaches a caller.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// mutation '{mutation}' must provide a non-empty description
    MissingDescription { mutation: String },
    /// mutation '{mutation}' must declare an error type
    MissingErrorType { mutation: String },
    /// mutation '{mutation}' declares argument '{argument}' more than once
    DuplicateArgument { mutation: String, argument: String },
    /// mutation '{mutation}' uses '{field}' both as a payload field and as an error field
    ErrorFieldCollision { mutation: String, field: String },
    /// mutation '{0}' is registered more than once
    DuplicateMutation(String),
    /// unknown plugin {0}
    PluginUnknown(String),
    /// plugin {plugin} could not be configured: {error}
    PluginConfiguration { plugin: String, error: String },
    /// could not deserialize configuration: {0}
    DeserializeConfigError(String),
}

/// Failure to decode a global ID.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
pub enum GlobalIdError {
    /// global id is not valid base64: {0}
    Base64(#[from] base64::DecodeError),
    /// global id does not decode to valid utf-8
    Utf8,
    /// global id '{0}' is not of the form 'Type:key'
    Malformed(String),
}

/// A business-level error attributed to one input field.
///
/// Field errors are returned as data in the mutation payload, under its
/// error fields, and several of them can be reported by a single call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending input field, if any.
    pub field: Option<String>,
    /// Human readable message.
    pub message: String,
    /// Machine readable code, one of the values of the mutation's error type.
    pub code: Option<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
            code: None,
        }
    }

    /// An error that is not attributable to a single field.
    pub fn non_field(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Field names are exposed the way the schema exposes arguments.
    pub(crate) fn camel_cased(mut self) -> Self {
        self.field = self.field.map(|field| field.to_lower_camel_case());
        self
    }
}

/// Error returned by the business logic of a mutation.
#[derive(Debug, Error)]
pub enum MutationError {
    /// Expected validation failures, reported back to the caller as data.
    #[error("mutation input is invalid")]
    Validation(Vec<FieldError>),

    /// Unexpected failure; aborts the mutation with a protocol error.
    #[error("{0}")]
    Fault(BoxError),
}

impl MutationError {
    pub fn fault(error: impl Into<BoxError>) -> Self {
        MutationError::Fault(error.into())
    }
}

impl From<FieldError> for MutationError {
    fn from(error: FieldError) -> Self {
        MutationError::Validation(vec![error])
    }
}

impl From<Vec<FieldError>> for MutationError {
    fn from(errors: Vec<FieldError>) -> Self {
        MutationError::Validation(errors)
    }
}

/// Protocol-level failures produced by the executor itself.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
pub(crate) enum ExecutionError {
    /// {0}
    PermissionDenied(String),
    /// Argument '{argument}' of required type '{ty}!' was not provided.
    MissingArgument { argument: String, ty: String },
    /// Cannot query field "{0}" on type "Mutation".
    UnknownMutation(String),
    /// {0}
    Internal(String),
}

impl ErrorExtension for ExecutionError {
    fn extension_code(&self) -> String {
        match self {
            ExecutionError::PermissionDenied(_) => "PERMISSION_DENIED",
            ExecutionError::MissingArgument { .. } | ExecutionError::UnknownMutation(_) => {
                "GRAPHQL_VALIDATION_FAILED"
            }
            ExecutionError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
        .to_string()
    }
}

impl From<ExecutionError> for graphql::Error {
    fn from(error: ExecutionError) -> Self {
        error.to_graphql_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_messages() {
        assert_eq!(
            ConfigurationError::MissingDescription {
                mutation: "test".to_string()
            }
            .to_string(),
            "mutation 'test' must provide a non-empty description"
        );
        assert_eq!(
            ConfigurationError::PluginUnknown("acme.audit".to_string()).to_string(),
            "unknown plugin acme.audit"
        );
    }

    #[test]
    fn execution_errors_carry_codes() {
        let error: graphql::Error =
            ExecutionError::PermissionDenied("nope".to_string()).into();
        assert_eq!(error.message, "nope");
        assert_eq!(error.extension_code().as_deref(), Some("PERMISSION_DENIED"));

        let error: graphql::Error = ExecutionError::MissingArgument {
            argument: "productId".to_string(),
            ty: "ID".to_string(),
        }
        .into();
        assert_eq!(
            error.message,
            "Argument 'productId' of required type 'ID!' was not provided."
        );
        assert_eq!(
            error.extension_code().as_deref(),
            Some("GRAPHQL_VALIDATION_FAILED")
        );
    }

    #[test]
    fn field_errors_are_camel_cased() {
        let error = FieldError::new("product_id", "boom").camel_cased();
        assert_eq!(error.field.as_deref(), Some("productId"));
        let error = FieldError::new("productId", "boom").camel_cased();
        assert_eq!(error.field.as_deref(), Some("productId"));
        let error = FieldError::non_field("boom").camel_cased();
        assert_eq!(error.field, None);
    }
}
