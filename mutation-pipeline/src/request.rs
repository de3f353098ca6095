use std::collections::HashMap;

use serde_json_bytes::ByteString;
use serde_json_bytes::Map;

use crate::context::CallerContext;
use crate::graphql::Location;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::Value;

/// Where a mutation field sits in the operation document.
///
/// Used to address protocol errors: an error raised for the field is located at the field,
/// and an error attributed to one of its sub-selections (`errors` for instance) at that
/// sub-selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationField {
    response_key: String,
    location: Option<Location>,
    selections: HashMap<String, Location>,
}

#[buildstructor::buildstructor]
impl MutationField {
    #[builder(visibility = "pub")]
    fn new(
        response_key: String,
        location: Option<Location>,
        selections: HashMap<String, Location>,
    ) -> Self {
        Self {
            response_key,
            location,
            selections,
        }
    }

    /// The key under which the field appears in `data`, its alias if it has one.
    pub fn response_key(&self) -> &str {
        &self.response_key
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Location of the sub-selection `name`, if it was selected.
    pub fn selection(&self, name: &str) -> Option<Location> {
        self.selections.get(name).copied()
    }

    /// The path of the field in the response.
    pub fn path(&self) -> Path {
        Path::from_iter([self.response_key.clone().into()])
    }
}

/// A call of one mutation field.
#[derive(Clone, Debug)]
pub struct MutationRequest {
    /// Name of the mutation as registered in the schema.
    pub name: String,
    pub field: MutationField,
    /// Argument values, keyed by their exposed (camelCase) names.
    pub arguments: Object,
    pub context: CallerContext,
}

#[buildstructor::buildstructor]
impl MutationRequest {
    #[builder(visibility = "pub")]
    fn new(
        name: String,
        field: Option<MutationField>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        arguments: Map<ByteString, Value>,
        context: Option<CallerContext>,
    ) -> Self {
        let field = field.unwrap_or_else(|| MutationField::builder().response_key(&name).build());
        Self {
            name,
            field,
            arguments,
            context: context.unwrap_or_default(),
        }
    }
}
