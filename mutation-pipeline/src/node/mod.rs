//! Resolution of global IDs into nodes.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use tower::BoxError;

pub use self::memory::InMemoryNodeStore;
use crate::error::FieldError;
use crate::error::MutationError;
use crate::global_id::GlobalId;
use crate::json_ext::Object;
use crate::json_ext::Value;

pub(crate) const GRAPHQL_ERROR_CODE: &str = "GRAPHQL_ERROR";
pub(crate) const NOT_FOUND_CODE: &str = "NOT_FOUND";

/// An entity fetched from storage, tagged with its concrete type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    type_name: String,
    key: String,
    fields: Object,
}

impl Node {
    pub fn new(type_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            key: key.into(),
            fields: Object::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name, value.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Object {
        &self.fields
    }

    pub fn global_id(&self) -> GlobalId {
        GlobalId::new(self.type_name.as_str(), self.key.as_str())
    }
}

/// The storage the resolver fetches nodes from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeStore: Send + Sync + 'static {
    /// Fetches the node stored under `key` for the type `type_name`.
    ///
    /// Returns `Ok(None)` when nothing is stored there. `Err` is reserved for storage failures.
    async fn fetch(&self, type_name: &str, key: &str) -> Result<Option<Node>, BoxError>;
}

/// Turns caller supplied global IDs into nodes, or into field errors.
#[derive(Clone)]
pub struct NodeResolver {
    store: Arc<dyn NodeStore>,
}

impl NodeResolver {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// Resolves one global ID given for the input field `field`.
    ///
    /// An absent or empty ID resolves to `None`. Undecodable IDs, unknown nodes and nodes that
    /// are not of type `only_type` are reported as a [`FieldError`] on `field`. Only storage
    /// failures are faults.
    pub async fn resolve(
        &self,
        opaque: Option<&str>,
        field: &str,
        only_type: Option<&str>,
    ) -> Result<Option<Node>, MutationError> {
        let opaque = match opaque {
            Some(opaque) if !opaque.is_empty() => opaque,
            _ => return Ok(None),
        };
        let global_id = GlobalId::decode(opaque).map_err(|error| {
            tracing::debug!(%error, "could not decode global id {opaque}");
            couldnt_resolve(field, opaque, GRAPHQL_ERROR_CODE)
        })?;

        let node = self
            .store
            .fetch(global_id.type_name(), global_id.raw_key())
            .await
            .map_err(MutationError::Fault)?
            .ok_or_else(|| couldnt_resolve(field, opaque, NOT_FOUND_CODE))?;

        if let Some(only_type) = only_type {
            if node.type_name() != only_type {
                return Err(must_receive(field, only_type).into());
            }
        }
        Ok(Some(node))
    }

    /// Resolves a list of global IDs given for the input field `field`, keeping their order.
    ///
    /// Every ID must decode and, when `only_type` is set, designate a node of that type.
    /// IDs without a node are reported together in a single error.
    pub async fn resolve_many(
        &self,
        opaques: &[String],
        field: &str,
        only_type: Option<&str>,
    ) -> Result<Vec<Node>, MutationError> {
        let mut global_ids = Vec::with_capacity(opaques.len());
        for opaque in opaques {
            let global_id = GlobalId::decode(opaque)
                .map_err(|_| couldnt_resolve(field, opaque, GRAPHQL_ERROR_CODE))?;
            if let Some(only_type) = only_type {
                if global_id.type_name() != only_type {
                    return Err(must_receive(field, only_type).into());
                }
            }
            global_ids.push((opaque, global_id));
        }

        let mut nodes = Vec::with_capacity(global_ids.len());
        let mut missing = Vec::new();
        for (opaque, global_id) in global_ids {
            match self
                .store
                .fetch(global_id.type_name(), global_id.raw_key())
                .await
                .map_err(MutationError::Fault)?
            {
                Some(node) => nodes.push(node),
                None => missing.push(opaque.as_str()),
            }
        }

        if !missing.is_empty() {
            return Err(FieldError::new(
                field,
                format!(
                    "Could not resolve to a node with the global id list of '{}'.",
                    missing.join(", ")
                ),
            )
            .with_code(NOT_FOUND_CODE)
            .into());
        }
        if let Some(only_type) = only_type {
            if nodes.iter().any(|node| node.type_name() != only_type) {
                return Err(must_receive(field, only_type).into());
            }
        }
        Ok(nodes)
    }
}

fn couldnt_resolve(field: &str, opaque: &str, code: &str) -> FieldError {
    FieldError::new(field, format!("Couldn't resolve id: {opaque}.")).with_code(code)
}

fn must_receive(field: &str, only_type: &str) -> FieldError {
    FieldError::new(field, format!("Must receive a {only_type} id.")).with_code(GRAPHQL_ERROR_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<dyn NodeStore> {
        Arc::new(
            InMemoryNodeStore::builder()
                .node(Node::new("Product", "1").with_field("name", "Table"))
                .node(Node::new("ProductVariant", "7").with_field("sku", "TBL-1"))
                .build(),
        )
    }

    fn single_error(result: Result<impl std::fmt::Debug, MutationError>) -> FieldError {
        match result {
            Err(MutationError::Validation(mut errors)) => {
                assert_eq!(errors.len(), 1, "{errors:?}");
                errors.remove(0)
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolves_node_of_expected_type() {
        let resolver = NodeResolver::new(store());
        let id = GlobalId::new("Product", "1").encode();
        let node = resolver
            .resolve(Some(&id), "product_id", Some("Product"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(node.get("name"), Some(&Value::from("Table")));
        assert_eq!(node.global_id().encode(), id);
    }

    #[tokio::test]
    async fn empty_id_is_absence() {
        let resolver = NodeResolver::new(store());
        assert_eq!(resolver.resolve(None, "", None).await.unwrap(), None);
        assert_eq!(
            resolver.resolve(Some(""), "product_id", Some("Product")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn undecodable_id() {
        let resolver = NodeResolver::new(store());
        let error = single_error(
            resolver
                .resolve(Some("not-really"), "product_id", Some("Product"))
                .await,
        );
        assert_eq!(
            error,
            FieldError::new("product_id", "Couldn't resolve id: not-really.")
                .with_code(GRAPHQL_ERROR_CODE)
        );
    }

    #[tokio::test]
    async fn unknown_node() {
        let resolver = NodeResolver::new(store());
        let id = GlobalId::new("Product", "999").encode();
        let error = single_error(resolver.resolve(Some(&id), "product_id", None).await);
        assert_eq!(error.message, format!("Couldn't resolve id: {id}."));
        assert_eq!(error.code.as_deref(), Some(NOT_FOUND_CODE));
    }

    #[tokio::test]
    async fn node_of_other_type() {
        let resolver = NodeResolver::new(store());
        let id = GlobalId::new("ProductVariant", "7").encode();
        let error = single_error(
            resolver
                .resolve(Some(&id), "product_id", Some("Product"))
                .await,
        );
        assert_eq!(error.field.as_deref(), Some("product_id"));
        assert_eq!(error.message, "Must receive a Product id.");
    }

    #[tokio::test]
    async fn concrete_type_is_checked_not_the_decoded_one() {
        let mut store = MockNodeStore::new();
        store
            .expect_fetch()
            .withf(|type_name, key| type_name == "Product" && key == "1")
            .times(1)
            .returning(|_, _| Ok(Some(Node::new("DigitalProduct", "1"))));
        let resolver = NodeResolver::new(Arc::new(store));
        let id = GlobalId::new("Product", "1").encode();
        let error = single_error(
            resolver
                .resolve(Some(&id), "product_id", Some("Product"))
                .await,
        );
        assert_eq!(error.message, "Must receive a Product id.");
    }

    #[tokio::test]
    async fn storage_failure_is_a_fault() {
        let mut store = MockNodeStore::new();
        store
            .expect_fetch()
            .returning(|_, _| Err("connection refused".into()));
        let resolver = NodeResolver::new(Arc::new(store));
        let id = GlobalId::new("Product", "1").encode();
        match resolver.resolve(Some(&id), "product_id", None).await {
            Err(MutationError::Fault(error)) => assert_eq!(error.to_string(), "connection refused"),
            other => panic!("expected a fault, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolve_many_keeps_order() {
        let store = Arc::new(
            InMemoryNodeStore::builder()
                .node(Node::new("Product", "1"))
                .node(Node::new("Product", "2"))
                .build(),
        );
        let resolver = NodeResolver::new(store);
        let ids = vec![
            GlobalId::new("Product", "2").encode(),
            GlobalId::new("Product", "1").encode(),
        ];
        let nodes = resolver
            .resolve_many(&ids, "products", Some("Product"))
            .await
            .unwrap();
        let keys: Vec<_> = nodes.iter().map(Node::key).collect();
        assert_eq!(keys, ["2", "1"]);
    }

    #[tokio::test]
    async fn resolve_many_reports_missing_ids_together() {
        let resolver = NodeResolver::new(store());
        let first = GlobalId::new("Product", "5").encode();
        let second = GlobalId::new("Product", "6").encode();
        let ids = vec![GlobalId::new("Product", "1").encode(), first.clone(), second.clone()];
        let error = single_error(resolver.resolve_many(&ids, "products", None).await);
        assert_eq!(
            error.message,
            format!("Could not resolve to a node with the global id list of '{first}, {second}'.")
        );
    }

    #[tokio::test]
    async fn resolve_many_rejects_other_types_and_garbage() {
        let resolver = NodeResolver::new(store());
        let ids = vec![GlobalId::new("ProductVariant", "7").encode()];
        let error = single_error(resolver.resolve_many(&ids, "products", Some("Product")).await);
        assert_eq!(error.message, "Must receive a Product id.");

        let ids = vec!["garbage".to_string()];
        let error = single_error(resolver.resolve_many(&ids, "products", None).await);
        assert_eq!(error.message, "Couldn't resolve id: garbage.");
    }
}
