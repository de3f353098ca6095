use std::collections::HashMap;

use async_trait::async_trait;
use tower::BoxError;

use super::Node;
use super::NodeStore;

/// A read-only [`NodeStore`] backed by a map, filled once when built.
#[derive(Clone, Debug, Default)]
pub struct InMemoryNodeStore {
    nodes: HashMap<(String, String), Node>,
}

#[buildstructor::buildstructor]
impl InMemoryNodeStore {
    #[builder(visibility = "pub")]
    fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes
                .into_iter()
                .map(|node| ((node.type_name.clone(), node.key.clone()), node))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[async_trait]
impl NodeStore for InMemoryNodeStore {
    async fn fetch(&self, type_name: &str, key: &str) -> Result<Option<Node>, BoxError> {
        Ok(self
            .nodes
            .get(&(type_name.to_string(), key.to_string()))
            .cloned())
    }
}
