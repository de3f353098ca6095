//! Execution of mutation calls.
//!
//! A call goes through these steps, each of which may end it:
//!
//! 1. the caller must hold the mutation's permissions,
//! 2. required arguments must be present,
//! 3. the plugin chain may take over,
//! 4. ID arguments are resolved into nodes,
//! 5. the mutation's core logic runs.

use std::sync::Arc;

use tracing::Instrument;

use crate::context::CallerContext;
use crate::descriptor::ArgumentType;
use crate::descriptor::MutationDescriptor;
use crate::error::ExecutionError;
use crate::error::FieldError;
use crate::error::MutationError;
use crate::graphql;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::mutation::Mutation;
use crate::mutation::MutationContext;
use crate::mutation::ResolvedArguments;
use crate::node::GRAPHQL_ERROR_CODE;
use crate::node::NodeResolver;
use crate::node::NodeStore;
use crate::outcome::MutationOutcome;
use crate::permission::Authorization;
use crate::permission::PermissionGate;
use crate::plugin::HookRequest;
use crate::plugin::HookValue;
use crate::request::MutationField;
use crate::request::MutationRequest;

/// Runs mutation calls against a [`Schema`](crate::Schema).
#[derive(Clone)]
pub struct MutationExecutor {
    schema: Arc<crate::Schema>,
    nodes: NodeResolver,
}

impl MutationExecutor {
    pub fn new(schema: Arc<crate::Schema>, store: Arc<dyn NodeStore>) -> Self {
        Self {
            schema,
            nodes: NodeResolver::new(store),
        }
    }

    pub fn schema(&self) -> &crate::Schema {
        &self.schema
    }

    /// Looks the requested mutation up, runs it and renders the response.
    pub async fn execute_request(&self, request: MutationRequest) -> graphql::Response {
        let MutationRequest {
            name,
            field,
            arguments,
            context,
        } = request;
        let Some(mutation) = self.schema.get(&name) else {
            tracing::debug!(mutation = %name, "unknown mutation");
            let mut error: graphql::Error = ExecutionError::UnknownMutation(name).into();
            error.locations.extend(field.location());
            return graphql::Response::builder().error(error).build();
        };
        let outcome = self
            .execute(mutation.as_ref(), &context, &field, arguments)
            .await;
        outcome.into_response(mutation.descriptor(), &field)
    }

    /// Runs one mutation call.
    ///
    /// `arguments` are the raw argument values keyed by their exposed names.
    pub async fn execute(
        &self,
        mutation: &dyn Mutation,
        context: &CallerContext,
        field: &MutationField,
        arguments: Object,
    ) -> MutationOutcome {
        let descriptor = mutation.descriptor();
        let span = tracing::info_span!(
            "mutation",
            "mutation.name" = %descriptor.name(),
            "mutation.field" = %field.response_key(),
        );
        self.run(mutation, descriptor, context, field, arguments)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        mutation: &dyn Mutation,
        descriptor: &MutationDescriptor,
        context: &CallerContext,
        field: &MutationField,
        arguments: Object,
    ) -> MutationOutcome {
        if let Authorization::Denied(message) =
            PermissionGate::check(context, descriptor.permissions())
        {
            return MutationOutcome::ProtocolError(
                ExecutionError::PermissionDenied(message).into(),
            );
        }

        if let Some(error) = missing_argument(descriptor, &arguments) {
            return MutationOutcome::ProtocolError(error.into());
        }

        if let Some(plugins) = context.plugins().filter(|plugins| !plugins.is_empty()) {
            let request = HookRequest {
                mutation: descriptor.name().to_string(),
                field: field.clone(),
                arguments: arguments.clone(),
                context: context.clone(),
            };
            match plugins.perform_mutation(HookValue::Sentinel, &request).await {
                Ok(value) => {
                    if let Some(outcome) = MutationOutcome::normalize(value) {
                        return outcome;
                    }
                }
                Err(error) => {
                    tracing::error!(%error, "plugin failed to perform mutation");
                    return MutationOutcome::ProtocolError(
                        ExecutionError::Internal(error.to_string()).into(),
                    );
                }
            }
        }

        let resolved = match self.resolve_arguments(descriptor, arguments).await {
            Ok(resolved) => resolved,
            Err(error) => return self.failed(descriptor, error),
        };
        let mutation_context = MutationContext::new(context.clone(), self.nodes.clone());
        match mutation.perform_mutation(&mutation_context, &resolved).await {
            Ok(payload) => MutationOutcome::Success(payload),
            Err(error) => self.failed(descriptor, error),
        }
    }

    /// Resolves every ID argument. Field errors of all the arguments are reported together.
    async fn resolve_arguments(
        &self,
        descriptor: &MutationDescriptor,
        arguments: Object,
    ) -> Result<ResolvedArguments, MutationError> {
        let mut resolved = ResolvedArguments::new(arguments);
        let mut errors = Vec::new();
        for argument in descriptor.arguments() {
            let name = argument.graphql_name();
            let value = resolved.value(&name).cloned();
            let result = match argument.ty() {
                ArgumentType::Id { node_type } => {
                    match id_value(argument.name(), value.as_ref()) {
                        Ok(id) => self
                            .nodes
                            .resolve(id, argument.name(), node_type.as_deref())
                            .await
                            .map(|node| {
                                if let Some(node) = node {
                                    resolved.insert_node(name, node);
                                }
                            }),
                        Err(error) => Err(error.into()),
                    }
                }
                ArgumentType::IdList { node_type } => {
                    match id_list_value(argument.name(), value.as_ref()) {
                        Ok(ids) => self
                            .nodes
                            .resolve_many(&ids, argument.name(), node_type.as_deref())
                            .await
                            .map(|nodes| resolved.insert_nodes(name, nodes)),
                        Err(error) => Err(error.into()),
                    }
                }
                ArgumentType::Scalar(_) => Ok(()),
            };
            match result {
                Ok(()) => {}
                Err(MutationError::Validation(mut field_errors)) => {
                    errors.append(&mut field_errors)
                }
                Err(fault @ MutationError::Fault(_)) => return Err(fault),
            }
        }
        if errors.is_empty() {
            Ok(resolved)
        } else {
            Err(MutationError::Validation(errors))
        }
    }

    fn failed(&self, descriptor: &MutationDescriptor, error: MutationError) -> MutationOutcome {
        match error {
            MutationError::Validation(errors) => {
                let error_type = descriptor.error_type();
                for code in errors.iter().filter_map(|error| error.code.as_deref()) {
                    if !error_type.accepts(code) {
                        tracing::warn!(
                            code,
                            error_type = error_type.name(),
                            "error code is not declared by the error type"
                        );
                    }
                }
                MutationOutcome::UserErrors(errors.into_iter().map(FieldError::camel_cased).collect())
            }
            MutationError::Fault(error) => {
                tracing::error!(%error, "mutation failed");
                MutationOutcome::ProtocolError(ExecutionError::Internal(error.to_string()).into())
            }
        }
    }
}

fn missing_argument(descriptor: &MutationDescriptor, arguments: &Object) -> Option<ExecutionError> {
    descriptor
        .arguments()
        .iter()
        .filter(|argument| argument.is_required())
        .find(|argument| {
            arguments
                .get(argument.graphql_name().as_str())
                .is_none_or(Value::is_null)
        })
        .map(|argument| ExecutionError::MissingArgument {
            argument: argument.graphql_name(),
            ty: argument.ty().graphql_type(),
        })
}

fn id_value<'a>(field: &str, value: Option<&'a Value>) -> Result<Option<&'a str>, FieldError> {
    match value {
        None => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.as_str())),
        Some(other) => Err(invalid_id(field, other)),
    }
}

fn id_list_value(field: &str, value: Option<&Value>) -> Result<Vec<String>, FieldError> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::Array(values)) => values
            .iter()
            .map(|value| match value {
                Value::String(id) => Ok(id.as_str().to_string()),
                other => Err(invalid_id(field, other)),
            })
            .collect(),
        Some(other) => Err(invalid_id(field, other)),
    }
}

fn invalid_id(field: &str, value: &Value) -> FieldError {
    let value = serde_json::to_string(value).unwrap_or_default();
    FieldError::new(field, format!("Couldn't resolve id: {value}.")).with_code(GRAPHQL_ERROR_CODE)
}
