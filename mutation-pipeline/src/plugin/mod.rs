//! Plugins intercepting mutation execution.
//!
//! A plugin is anything implementing [`MutationHook`]. Plugins are chained by a
//! [`PluginManager`] which asks each of them, in order, whether it wants to take over the
//! mutation. Plugins that are built from configuration also implement [`Plugin`] and are
//! instantiated through a [`PluginFactory`].

mod manager;

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::Schema;
use serde::de::DeserializeOwned;
use tower::BoxError;

pub use self::manager::PluginManager;
use crate::context::CallerContext;
use crate::graphql;
use crate::json_ext::Object;
use crate::request::MutationField;

/// What a hook hands back to the dispatcher.
///
/// Anything but [`HookValue::Sentinel`] replaces the mutation's own logic.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum HookValue {
    /// The hook declines to handle the mutation.
    #[default]
    Sentinel,
    /// The payload fields of a successful mutation.
    Payload(Object),
    /// A GraphQL error aborting the mutation field.
    Error(graphql::Error),
    /// Data and errors to merge at the mutation field.
    ExecutionResult(graphql::ExecutionResult),
}

impl HookValue {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, HookValue::Sentinel)
    }
}

impl From<graphql::Error> for HookValue {
    fn from(error: graphql::Error) -> Self {
        HookValue::Error(error)
    }
}

impl From<graphql::ExecutionResult> for HookValue {
    fn from(result: graphql::ExecutionResult) -> Self {
        HookValue::ExecutionResult(result)
    }
}

/// The mutation call as seen by hooks.
///
/// Arguments are the raw values sent by the caller; global IDs are not resolved yet.
#[derive(Clone, Debug)]
pub struct HookRequest {
    pub mutation: String,
    pub field: MutationField,
    pub arguments: Object,
    pub context: CallerContext,
}

/// Intercepts mutations before their business logic runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MutationHook: Send + Sync + 'static {
    /// Called with the value returned by the previous hook of the chain.
    ///
    /// Hooks which have nothing to do with `request` return `previous_value` unchanged, which
    /// is what the default implementation does.
    async fn perform_mutation(
        &self,
        previous_value: HookValue,
        request: &HookRequest,
    ) -> Result<HookValue, BoxError> {
        let _ = request;
        Ok(previous_value)
    }
}

/// A hook that can be built from configuration.
pub trait Plugin: MutationHook + Sized {
    type Config: JsonSchema + DeserializeOwned;

    /// This is invoked once when the plugin chain is built.
    fn new(config: Self::Config) -> Result<Self, BoxError>;
}

type InstanceFactory = fn(&serde_json::Value) -> Result<Arc<dyn MutationHook>, BoxError>;

type SchemaFactory = fn(&mut SchemaGenerator) -> Schema;

/// Creates instances of one [`Plugin`] under the name it is configured with.
#[derive(Clone)]
pub struct PluginFactory {
    pub(crate) name: String,
    instance_factory: InstanceFactory,
    schema_factory: SchemaFactory,
}

impl std::fmt::Debug for PluginFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginFactory")
            .field("name", &self.name)
            .finish()
    }
}

impl PluginFactory {
    pub fn new<P: Plugin>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_factory: instantiate::<P>,
            schema_factory: config_schema::<P>,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create_instance(
        &self,
        configuration: &serde_json::Value,
    ) -> Result<Arc<dyn MutationHook>, BoxError> {
        (self.instance_factory)(configuration)
    }

    pub fn create_schema(&self, generator: &mut SchemaGenerator) -> Schema {
        (self.schema_factory)(generator)
    }
}

fn instantiate<P: Plugin>(
    configuration: &serde_json::Value,
) -> Result<Arc<dyn MutationHook>, BoxError> {
    let plugin = P::new(serde_json::from_value(configuration.clone())?)?;
    Ok(Arc::new(plugin))
}

fn config_schema<P: Plugin>(generator: &mut SchemaGenerator) -> Schema {
    generator.subschema_for::<P::Config>()
}

#[cfg(test)]
pub(crate) mod test {
    use serde::Deserialize;

    use super::*;

    /// Answers every mutation with a fixed payload.
    pub(crate) struct FixedPayload {
        pub(crate) payload: Object,
    }

    #[derive(Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    pub(crate) struct FixedPayloadConfig {
        pub(crate) field: String,
        pub(crate) value: String,
    }

    #[async_trait]
    impl MutationHook for FixedPayload {
        async fn perform_mutation(
            &self,
            _previous_value: HookValue,
            _request: &HookRequest,
        ) -> Result<HookValue, BoxError> {
            Ok(HookValue::Payload(self.payload.clone()))
        }
    }

    impl Plugin for FixedPayload {
        type Config = FixedPayloadConfig;

        fn new(config: Self::Config) -> Result<Self, BoxError> {
            let mut payload = Object::new();
            payload.insert(config.field, config.value.into());
            Ok(Self { payload })
        }
    }

    /// Leaves every mutation alone.
    pub(crate) struct Noop;

    #[async_trait]
    impl MutationHook for Noop {}

    impl Plugin for Noop {
        type Config = ();

        fn new(_config: Self::Config) -> Result<Self, BoxError> {
            Ok(Noop)
        }
    }

    pub(crate) fn request() -> HookRequest {
        HookRequest {
            mutation: "test".to_string(),
            field: MutationField::builder().response_key("test").build(),
            arguments: Object::new(),
            context: CallerContext::default(),
        }
    }

    #[tokio::test]
    async fn default_hook_returns_previous_value() {
        let value = Noop
            .perform_mutation(HookValue::Sentinel, &request())
            .await
            .unwrap();
        assert!(value.is_sentinel());
    }

    #[tokio::test]
    async fn factory_builds_configured_instances() {
        let factory = PluginFactory::new::<FixedPayload>("test.fixed_payload");
        assert_eq!(factory.name(), "test.fixed_payload");
        let hook = factory
            .create_instance(&serde_json::json!({"field": "name", "value": "Table"}))
            .unwrap();
        let value = hook
            .perform_mutation(HookValue::Sentinel, &request())
            .await
            .unwrap();
        let mut expected = Object::new();
        expected.insert("name", "Table".into());
        assert_eq!(value, HookValue::Payload(expected));

        assert!(
            factory
                .create_instance(&serde_json::json!({"field": "name"}))
                .is_err()
        );
    }

    #[test]
    fn factory_exposes_config_schema() {
        let factory = PluginFactory::new::<FixedPayload>("test.fixed_payload");
        let mut generator = SchemaGenerator::default();
        let schema = factory.create_schema(&mut generator);
        let schema = serde_json::to_value(schema).unwrap();
        // named subschemas are referenced, their definition lives in the generator
        assert_eq!(
            schema,
            serde_json::json!({"$ref": "#/definitions/FixedPayloadConfig"})
        );
        assert!(generator.definitions().contains_key("FixedPayloadConfig"));
    }
}
