//! Mutation declarations.
//!
//! A [`MutationDescriptor`] states everything the executor needs to know about a mutation
//! without running it: its arguments, the payload it returns, how its errors are exposed and
//! who may call it. Descriptors are validated when they are built, so a declaration mistake
//! fails at startup rather than on the first call.

use heck::ToLowerCamelCase;

use crate::error::ConfigurationError;
use crate::permission::Permission;

/// Name of the field every mutation payload exposes its errors under.
pub const DEFAULT_ERROR_FIELD: &str = "errors";

/// The type of a mutation argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgumentType {
    /// A global ID, resolved into a node before the mutation runs.
    Id { node_type: Option<String> },
    /// A list of global IDs, resolved into nodes before the mutation runs.
    IdList { node_type: Option<String> },
    /// Any other input, handed to the mutation as is.
    Scalar(String),
}

impl ArgumentType {
    /// The GraphQL type, without the non-null marker.
    pub fn graphql_type(&self) -> String {
        match self {
            ArgumentType::Id { .. } => "ID".to_string(),
            ArgumentType::IdList { .. } => "[ID!]".to_string(),
            ArgumentType::Scalar(name) => name.clone(),
        }
    }
}

/// A declared mutation argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument {
    name: String,
    ty: ArgumentType,
    required: bool,
    description: Option<String>,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: ArgumentType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            description: None,
        }
    }

    /// A global ID designating a node of type `node_type`.
    pub fn id(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::new(
            name,
            ArgumentType::Id {
                node_type: Some(node_type.into()),
            },
        )
    }

    /// A global ID designating a node of any type.
    pub fn any_id(name: impl Into<String>) -> Self {
        Self::new(name, ArgumentType::Id { node_type: None })
    }

    /// A list of global IDs designating nodes of type `node_type`.
    pub fn id_list(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::new(
            name,
            ArgumentType::IdList {
                node_type: Some(node_type.into()),
            },
        )
    }

    pub fn scalar(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(name, ArgumentType::Scalar(ty.into()))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The name the argument is declared with, used to attribute field errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name the argument is exposed under.
    pub fn graphql_name(&self) -> String {
        self.name.to_lower_camel_case()
    }

    pub fn ty(&self) -> &ArgumentType {
        &self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// The shape of the errors a mutation reports as data: a type name and the codes it accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorType {
    name: String,
    codes: Vec<String>,
}

#[buildstructor::buildstructor]
impl ErrorType {
    #[builder(visibility = "pub")]
    fn new(name: String, codes: Vec<String>) -> Self {
        Self { name, codes }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Whether `code` is one of the declared codes. An error type declaring no codes accepts
    /// any code.
    pub fn accepts(&self, code: &str) -> bool {
        self.codes.is_empty() || self.codes.iter().any(|c| c == code)
    }
}

/// The declaration of a mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationDescriptor {
    name: String,
    description: String,
    arguments: Vec<Argument>,
    payload_fields: Vec<String>,
    error_type: ErrorType,
    error_type_field: Option<String>,
    permissions: Vec<Permission>,
}

#[buildstructor::buildstructor]
impl MutationDescriptor {
    /// Returns a builder that validates the declaration when built.
    ///
    /// A description and an error type are mandatory. Argument names must be unique once
    /// exposed, and the error fields must not collide with payload fields.
    #[builder(visibility = "pub")]
    fn new(
        name: String,
        description: Option<String>,
        arguments: Vec<Argument>,
        payload_fields: Vec<String>,
        error_type: Option<ErrorType>,
        error_type_field: Option<String>,
        permissions: Vec<Permission>,
    ) -> Result<Self, ConfigurationError> {
        let description = match description {
            Some(description) if !description.trim().is_empty() => description,
            _ => return Err(ConfigurationError::MissingDescription { mutation: name }),
        };
        let Some(error_type) = error_type else {
            return Err(ConfigurationError::MissingErrorType { mutation: name });
        };

        for (index, argument) in arguments.iter().enumerate() {
            let exposed = argument.graphql_name();
            if arguments[..index]
                .iter()
                .any(|previous| previous.graphql_name() == exposed)
            {
                return Err(ConfigurationError::DuplicateArgument {
                    mutation: name,
                    argument: exposed,
                });
            }
        }

        let payload_fields: Vec<String> = payload_fields
            .iter()
            .map(|field| field.to_lower_camel_case())
            .collect();
        let error_type_field = error_type_field.map(|field| field.to_lower_camel_case());
        let mut error_fields = vec![DEFAULT_ERROR_FIELD];
        if let Some(field) = &error_type_field {
            if field == DEFAULT_ERROR_FIELD {
                return Err(ConfigurationError::ErrorFieldCollision {
                    mutation: name,
                    field: field.clone(),
                });
            }
            error_fields.push(field);
        }
        if let Some(field) = payload_fields
            .iter()
            .find(|field| error_fields.contains(&field.as_str()))
        {
            return Err(ConfigurationError::ErrorFieldCollision {
                mutation: name,
                field: field.clone(),
            });
        }

        Ok(Self {
            name,
            description,
            arguments,
            payload_fields,
            error_type,
            error_type_field,
            permissions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Payload field names, as exposed.
    pub fn payload_fields(&self) -> &[String] {
        &self.payload_fields
    }

    pub fn error_type(&self) -> &ErrorType {
        &self.error_type
    }

    pub fn error_type_field(&self) -> Option<&str> {
        self.error_type_field.as_deref()
    }

    /// Every field the errors are exposed under: the default one, then the custom one.
    pub fn error_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(DEFAULT_ERROR_FIELD).chain(self.error_type_field.as_deref())
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}
