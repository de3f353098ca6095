//! The registry of mutations served.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ConfigurationError;
use crate::mutation::Mutation;

/// Mutations keyed by name, in registration order. Built once, then shared read-only.
#[derive(Clone, Default)]
pub struct Schema {
    mutations: IndexMap<String, Arc<dyn Mutation>>,
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("mutations", &self.mutations.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[buildstructor::buildstructor]
impl Schema {
    #[builder(visibility = "pub")]
    fn new(mutations: Vec<Arc<dyn Mutation>>) -> Result<Self, ConfigurationError> {
        let mut registry = IndexMap::with_capacity(mutations.len());
        for mutation in mutations {
            let name = mutation.descriptor().name().to_string();
            if registry.contains_key(&name) {
                return Err(ConfigurationError::DuplicateMutation(name));
            }
            registry.insert(name, mutation);
        }
        Ok(Self {
            mutations: registry,
        })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Mutation>> {
        self.mutations.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.mutations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
