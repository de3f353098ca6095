//! The business logic side of a mutation.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::context::CallerContext;
use crate::descriptor::MutationDescriptor;
use crate::error::MutationError;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::node::Node;
use crate::node::NodeResolver;

/// A mutation: its declaration and its core logic.
#[async_trait]
pub trait Mutation: Send + Sync + 'static {
    fn descriptor(&self) -> &MutationDescriptor;

    /// Runs once the caller is authorized, no plugin took over and every ID argument has been
    /// resolved.
    ///
    /// Returns the payload fields. Expected failures are reported as
    /// [`MutationError::Validation`], anything else as [`MutationError::Fault`].
    async fn perform_mutation(
        &self,
        context: &MutationContext,
        arguments: &ResolvedArguments,
    ) -> Result<Object, MutationError>;
}

/// What the core logic of a mutation gets to work with.
pub struct MutationContext {
    caller: CallerContext,
    nodes: NodeResolver,
}

impl MutationContext {
    pub(crate) fn new(caller: CallerContext, nodes: NodeResolver) -> Self {
        Self { caller, nodes }
    }

    pub fn caller(&self) -> &CallerContext {
        &self.caller
    }

    /// See [`NodeResolver::resolve`].
    pub async fn get_node_or_error(
        &self,
        id: Option<&str>,
        field: &str,
        only_type: Option<&str>,
    ) -> Result<Option<Node>, MutationError> {
        self.nodes.resolve(id, field, only_type).await
    }

    /// See [`NodeResolver::resolve_many`].
    pub async fn get_nodes_or_error(
        &self,
        ids: &[String],
        field: &str,
        only_type: Option<&str>,
    ) -> Result<Vec<Node>, MutationError> {
        self.nodes.resolve_many(ids, field, only_type).await
    }
}

/// Argument values keyed by their exposed names, with ID arguments resolved into nodes.
#[derive(Clone, Debug, Default)]
pub struct ResolvedArguments {
    values: Object,
    nodes: HashMap<String, Node>,
    node_lists: HashMap<String, Vec<Node>>,
}

impl ResolvedArguments {
    pub(crate) fn new(values: Object) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }

    pub(crate) fn insert_node(&mut self, name: String, node: Node) {
        self.nodes.insert(name, node);
    }

    pub(crate) fn insert_nodes(&mut self, name: String, nodes: Vec<Node>) {
        self.node_lists.insert(name, nodes);
    }

    /// The node an ID argument designates. `None` when the ID was absent or empty.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// The nodes an ID list argument designates, in the order they were given.
    pub fn nodes(&self, name: &str) -> &[Node] {
        self.node_lists.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// The raw value of an argument, as sent by the caller.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    pub fn values(&self) -> &Object {
        &self.values
    }
}
