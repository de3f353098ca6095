use std::fmt;
use std::sync::Arc;

use tower::BoxError;

use super::HookRequest;
use super::HookValue;
use super::MutationHook;
use super::PluginFactory;
use crate::configuration::Configuration;
use crate::error::ConfigurationError;

/// The ordered chain of hooks active for a request.
#[derive(Clone, Default)]
pub struct PluginManager {
    hooks: Vec<(String, Arc<dyn MutationHook>)>,
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("hooks", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `hook` to the chain; it runs after the hooks already there.
    pub fn with_hook(mut self, name: impl Into<String>, hook: Arc<dyn MutationHook>) -> Self {
        self.hooks.push((name.into(), hook));
        self
    }

    /// Instantiates the enabled plugins of `configuration`, in the order they are listed.
    pub fn from_configuration(
        configuration: &Configuration,
        factories: &[PluginFactory],
    ) -> Result<Self, ConfigurationError> {
        let mut manager = Self::new();
        for plugin in &configuration.plugins {
            if !plugin.enabled {
                tracing::debug!(plugin = %plugin.name, "plugin is disabled");
                continue;
            }
            let factory = factories
                .iter()
                .find(|factory| factory.name == plugin.name)
                .ok_or_else(|| ConfigurationError::PluginUnknown(plugin.name.clone()))?;
            let hook = factory.create_instance(&plugin.config).map_err(|error| {
                ConfigurationError::PluginConfiguration {
                    plugin: plugin.name.clone(),
                    error: error.to_string(),
                }
            })?;
            manager = manager.with_hook(plugin.name.as_str(), hook);
        }
        Ok(manager)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs the `perform_mutation` hooks in order.
    ///
    /// Each hook receives the value returned by the previous one. Dispatch stops at the first
    /// hook that returns something else than [`HookValue::Sentinel`], and that value is
    /// returned. A failing hook stops dispatch too.
    pub async fn perform_mutation(
        &self,
        previous_value: HookValue,
        request: &HookRequest,
    ) -> Result<HookValue, BoxError> {
        let mut value = previous_value;
        for (name, hook) in &self.hooks {
            value = hook
                .perform_mutation(value, request)
                .await
                .inspect_err(|error| {
                    tracing::error!(plugin = %name, mutation = %request.mutation, %error, "plugin failed");
                })?;
            if !value.is_sentinel() {
                tracing::info!(plugin = %name, mutation = %request.mutation, "plugin handled mutation");
                return Ok(value);
            }
            tracing::debug!(plugin = %name, mutation = %request.mutation, "plugin declined");
        }
        Ok(value)
    }
}
